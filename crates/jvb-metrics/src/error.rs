//! Per-stat translation errors.
//!
//! None of these abort a scrape: the collector logs them and skips the
//! offending metric.

use std::num::ParseFloatError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("unable to convert value {value:?} of {metric} to numeric: {source}")]
    InvalidValue {
        metric: String,
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("metric {metric} has {expected} variable labels but {got} values were given")]
    LabelCardinality {
        metric: String,
        expected: usize,
        got: usize,
    },
}
