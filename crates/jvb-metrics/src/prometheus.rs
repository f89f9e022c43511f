//! Prometheus text exposition format.
//!
//! Renders a describe + collect pass into the format served on `/metrics`.
//! Every catalog entry gets its HELP and TYPE lines even when no instance
//! reported it, so scrapers see the metric shapes up front.

use std::collections::HashMap;
use std::fmt::Write;

use jvb_core::MetricDescriptor;

use crate::metric::{MetricValue, OutputMetric};

/// Render `metrics` grouped under their `descriptors`, in catalog order.
///
/// Metrics whose name is not among `descriptors` are not rendered.
pub fn render_prometheus(
    descriptors: &[MetricDescriptor],
    metrics: impl IntoIterator<Item = OutputMetric>,
) -> String {
    let mut by_name: HashMap<String, Vec<OutputMetric>> = HashMap::new();
    for m in metrics {
        by_name.entry(m.name.clone()).or_default().push(m);
    }

    let mut out = String::new();
    for desc in descriptors {
        let _ = writeln!(out, "# HELP {} {}", desc.name, escape_help(&desc.help));
        let _ = writeln!(out, "# TYPE {} {}", desc.name, desc.kind);

        for m in by_name.get(&desc.name).into_iter().flatten() {
            render_metric(&mut out, m);
        }
    }
    out
}

fn render_metric(out: &mut String, m: &OutputMetric) {
    match &m.value {
        MetricValue::Scalar(v) => {
            let _ = writeln!(out, "{}{} {}", m.name, render_labels(&m.labels, None), format_value(*v));
        }
        MetricValue::Histogram {
            buckets,
            count,
            sum,
        } => {
            for b in buckets {
                let le = format_value(b.upper_bound);
                let _ = writeln!(
                    out,
                    "{}_bucket{} {}",
                    m.name,
                    render_labels(&m.labels, Some(&le)),
                    b.cumulative_count
                );
            }
            let _ = writeln!(
                out,
                "{}_bucket{} {}",
                m.name,
                render_labels(&m.labels, Some("+Inf")),
                count
            );
            let _ = writeln!(out, "{}_sum{} {}", m.name, render_labels(&m.labels, None), format_value(*sum));
            let _ = writeln!(out, "{}_count{} {}", m.name, render_labels(&m.labels, None), count);
        }
    }
}

fn render_labels(labels: &[(String, String)], le: Option<&str>) -> String {
    let mut parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", escape_label_value(v)))
        .collect();
    if let Some(le) = le {
        parts.push(format!("le=\"{le}\""));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", parts.join(","))
    }
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        v.to_string()
    }
}

fn escape_help(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
