//! Consolidation of candidate periods into disjoint break periods

use tracing::debug;

use super::interval::{CandidatePeriod, Interval};

/// Merges candidates into disjoint, start-ordered periods.
///
/// Candidates shorter than `min_period_duration` are dropped first. Two
/// periods merge when the next one starts no later than `merge_gap` seconds
/// after the running period ends; a `merge_gap` of 0.0 joins only periods
/// that touch or overlap.
pub fn merge_periods(
    candidates: &[CandidatePeriod],
    merge_gap: f64,
    min_period_duration: f64,
) -> Vec<Interval> {
    let mut sorted: Vec<Interval> = candidates
        .iter()
        .map(|c| c.interval)
        .filter(|i| i.duration() >= min_period_duration)
        .collect();
    sorted.sort_by(|a, b| {
        a.start()
            .total_cmp(&b.start())
            .then(a.end().total_cmp(&b.end()))
    });

    let mut merged = Vec::with_capacity(sorted.len());
    let mut iter = sorted.into_iter();
    let Some(mut current) = iter.next() else {
        return merged;
    };

    for next in iter {
        if current.end() + merge_gap >= next.start() {
            current = current.union(&next);
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);

    debug!(
        "Merged {} candidate(s) into {} period(s) (gap {:.3}s)",
        candidates.len(),
        merged.len(),
        merge_gap
    );

    merged
}
