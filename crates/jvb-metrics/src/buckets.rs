//! Bucket transform for histogram stats.
//!
//! Bridges report histograms as non-cumulative per-bucket counts, e.g.
//! `"[2,3,5,1]"`, where the last element counts everything beyond the
//! highest bucket. The exposition format wants cumulative buckets and
//! synthesizes `+Inf` itself from the total, so the overflow element is
//! folded into the total and dropped from the bucket list.
//!
//! Bridges only send ordinal slots, never real thresholds, so bucket `i`
//! gets the upper bound `i`.

/// One cumulative bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub upper_bound: f64,
    pub cumulative_count: u64,
}

/// Result of [`transform`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CumulativeHistogram {
    /// Buckets in ascending bound order, `+Inf` excluded.
    pub buckets: Vec<Bucket>,
    /// Sum of every reported count, overflow bucket included.
    pub count: u64,
}

/// Convert `"[c0,...,cN]"` into cumulative buckets `0..N` plus the total.
///
/// Fields that do not parse as unsigned integers count as `0`; the
/// transform itself never fails.
///
/// Whitespace around the list and around each field is ignored: in
/// `"[1, 2]"` the field `" 2"` counts as `2`, not as a malformed `0`.
pub fn transform(raw: &str) -> CumulativeHistogram {
    let inner = raw.trim().trim_matches(|c| c == '[' || c == ']');
    let mut counts: Vec<u64> = inner
        .split(',')
        .map(|field| field.trim().parse::<u64>().unwrap_or(0))
        .collect();

    let count = counts.iter().fold(0u64, |acc, &c| acc.saturating_add(c));

    // `+Inf` is implied by `count`.
    counts.pop();

    let mut running = 0u64;
    let buckets = counts
        .into_iter()
        .enumerate()
        .map(|(idx, c)| {
            running = running.saturating_add(c);
            Bucket {
                upper_bound: idx as f64,
                cumulative_count: running,
            }
        })
        .collect();

    CumulativeHistogram { buckets, count }
}
