//! Snapshot → metric translation.
//!
//! Each raw stat is looked up in the catalog by name. Unknown names are
//! dropped without comment so newer bridges can report stats this exporter
//! does not know yet. A stat with a bad value is logged and skipped; it
//! never affects the other stats of the snapshot.

use std::ops::Deref;

use tracing::warn;

use jvb_core::{Catalog, RawStat};

use crate::buckets;
use crate::cache::Snapshot;
use crate::error::TranslateError;
use crate::metric::{MetricValue, OutputMetric};

/// Lazily translate every stat of `snapshot`, labelled with `label_value`.
///
/// `snapshot` may be borrowed or shared (`&Snapshot`, `Arc<Snapshot>`), so
/// the stream can outlive the cache lock it was read under.
pub fn translate<'a, S, L>(
    snapshot: S,
    catalog: &'a Catalog,
    label_value: L,
) -> impl Iterator<Item = OutputMetric> + 'a
where
    S: Deref<Target = Snapshot> + 'a,
    L: AsRef<str> + 'a,
{
    (0..snapshot.stats.len()).filter_map(move |idx| {
        translate_logged(&snapshot.stats[idx], catalog, label_value.as_ref())
    })
}

/// Translate one stat. `None` means the catalog has no entry for it.
pub fn translate_stat(
    stat: &RawStat,
    catalog: &Catalog,
    label_value: &str,
) -> Option<Result<OutputMetric, TranslateError>> {
    let desc = catalog.lookup(&stat.name)?;

    let value = if desc.kind.is_histogram() {
        let histogram = buckets::transform(&stat.value);
        // Bridges send no observation sum; the total count stands in for it.
        MetricValue::Histogram {
            sum: histogram.count as f64,
            count: histogram.count,
            buckets: histogram.buckets,
        }
    } else {
        // Padded values like " 5" are accepted rather than skipped.
        match stat.value.trim().parse::<f64>() {
            Ok(v) => MetricValue::Scalar(v),
            Err(source) => {
                return Some(Err(TranslateError::InvalidValue {
                    metric: desc.name.clone(),
                    value: stat.value.clone(),
                    source,
                }));
            }
        }
    };

    Some(OutputMetric::new(
        desc,
        &[label_value],
        catalog.const_labels(),
        value,
    ))
}

/// [`translate_stat`] with errors reported through `tracing` and dropped.
fn translate_logged(
    stat: &RawStat,
    catalog: &Catalog,
    label_value: &str,
) -> Option<OutputMetric> {
    match translate_stat(stat, catalog, label_value)? {
        Ok(metric) => Some(metric),
        Err(e) => {
            warn!(instance = %label_value, stat = %stat.name, error = %e, "skipping metric");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use jvb_core::{MetricDescriptor, MetricKind};

    fn catalog() -> Catalog {
        Catalog::new(
            "jitsi_",
            vec![
                MetricDescriptor::new("participants", MetricKind::Gauge, "Participants."),
                MetricDescriptor::new("total_bytes_sent", MetricKind::Counter, "Bytes sent."),
                MetricDescriptor::new("stress_level", MetricKind::Untyped, "Stress."),
                MetricDescriptor::new("conference_sizes", MetricKind::Histogram, "Sizes."),
            ],
        )
        .unwrap()
    }

    fn snapshot(stats: &[(&str, &str)]) -> Snapshot {
        Snapshot {
            instance_id: "jvb-1".to_string(),
            last_updated: Instant::now(),
            stats: stats.iter().map(|(n, v)| RawStat::new(*n, *v)).collect(),
        }
    }

    #[test]
    fn scalar_metrics_keep_descriptor_kind() {
        let catalog = catalog();
        let snap = snapshot(&[
            ("participants", "5"),
            ("total_bytes_sent", "1024"),
            ("stress_level", "0.25"),
        ]);

        let out: Vec<_> = translate(&snap, &catalog, "jvb-1").collect();
        assert_eq!(out.len(), 3);

        assert_eq!(out[0].name, "jitsi_participants");
        assert_eq!(out[0].kind, MetricKind::Gauge);
        assert_eq!(out[0].scalar(), Some(5.0));
        assert_eq!(out[0].label("instance"), Some("jvb-1"));

        assert_eq!(out[1].kind, MetricKind::Counter);
        assert_eq!(out[1].scalar(), Some(1024.0));
        assert_eq!(out[2].kind, MetricKind::Untyped);
        assert_eq!(out[2].scalar(), Some(0.25));
    }

    #[test]
    fn histogram_stats_become_cumulative() {
        let catalog = catalog();
        let snap = snapshot(&[("conference_sizes", "[2,3,5,1]")]);

        let out: Vec<_> = translate(&snap, &catalog, "jvb-1").collect();
        assert_eq!(out.len(), 1);
        match &out[0].value {
            MetricValue::Histogram {
                buckets,
                count,
                sum,
            } => {
                let counts: Vec<u64> = buckets.iter().map(|b| b.cumulative_count).collect();
                assert_eq!(counts, vec![2, 5, 10]);
                assert_eq!(*count, 11);
                assert_eq!(*sum, 11.0);
            }
            other => panic!("expected histogram, got {other:?}"),
        }
    }

    #[test]
    fn unknown_stats_are_ignored() {
        let catalog = catalog();
        let snap = snapshot(&[("brand_new_stat", "1"), ("participants", "2")]);

        assert!(translate_stat(&snap.stats[0], &catalog, "jvb-1").is_none());
        let out: Vec<_> = translate(&snap, &catalog, "jvb-1").collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "jitsi_participants");
    }

    #[test]
    fn prefixed_stat_name_does_not_match() {
        let catalog = catalog();
        let snap = snapshot(&[("jitsi_participants", "2")]);
        assert_eq!(translate(&snap, &catalog, "jvb-1").count(), 0);
    }

    #[test]
    fn bad_scalar_is_skipped_without_affecting_others() {
        let catalog = catalog();
        let snap = snapshot(&[
            ("participants", "not-a-number"),
            ("total_bytes_sent", "10"),
            ("conference_sizes", "[1,1]"),
        ]);

        let err = translate_stat(&snap.stats[0], &catalog, "jvb-1").unwrap().unwrap_err();
        assert!(matches!(err, TranslateError::InvalidValue { .. }));

        let names: Vec<_> = translate(&snap, &catalog, "jvb-1").map(|m| m.name).collect();
        assert_eq!(names, vec!["jitsi_total_bytes_sent", "jitsi_conference_sizes"]);
    }

    #[test]
    fn label_mismatch_is_skipped() {
        let mut desc = MetricDescriptor::new("threads", MetricKind::Gauge, "Threads.");
        desc.label_names = vec!["a".to_string(), "b".to_string()];
        let catalog = Catalog::new(
            "",
            vec![desc, MetricDescriptor::new("videochannels", MetricKind::Gauge, "")],
        )
        .unwrap();
        let snap = snapshot(&[("threads", "40"), ("videochannels", "3")]);

        let out: Vec<_> = translate(&snap, &catalog, "jvb-1").collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "videochannels");
    }

    #[test]
    fn histogram_label_mismatch_is_skipped() {
        let mut sizes = MetricDescriptor::new("conference_sizes", MetricKind::Histogram, "Sizes.");
        sizes.label_names = Vec::new();
        let catalog = Catalog::new(
            "jitsi_",
            vec![
                sizes,
                MetricDescriptor::new("participants", MetricKind::Gauge, "Participants."),
            ],
        )
        .unwrap();
        let snap = snapshot(&[("conference_sizes", "[2,3,5,1]"), ("participants", "4")]);

        let err = translate_stat(&snap.stats[0], &catalog, "jvb-1").unwrap().unwrap_err();
        assert!(matches!(
            err,
            TranslateError::LabelCardinality { expected: 0, got: 1, .. }
        ));

        let out: Vec<_> = translate(&snap, &catalog, "jvb-1").collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "jitsi_participants");
        assert_eq!(out[0].scalar(), Some(4.0));
    }

    #[test]
    fn translates_shared_snapshot_with_owned_label() {
        let catalog = catalog();
        let snap = std::sync::Arc::new(snapshot(&[("participants", "3")]));

        let out: Vec<_> = translate(snap.clone(), &catalog, snap.instance_id.clone()).collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label("instance"), Some("jvb-1"));
    }

    #[test]
    fn padded_scalar_is_accepted() {
        let catalog = catalog();
        let snap = snapshot(&[("participants", " 5 ")]);
        let out: Vec<_> = translate(&snap, &catalog, "jvb-1").collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].scalar(), Some(5.0));
    }

    #[test]
    fn translation_is_lazy() {
        let catalog = catalog();
        let snap = snapshot(&[("participants", "1"), ("participants", "2")]);
        let mut iter = translate(&snap, &catalog, "jvb-1");
        assert_eq!(iter.next().and_then(|m| m.scalar()), Some(1.0));
        assert_eq!(iter.next().and_then(|m| m.scalar()), Some(2.0));
        assert!(iter.next().is_none());
    }
}
