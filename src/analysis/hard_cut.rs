//! Silent scene changes as insertion points for content without fades

use tracing::debug;

use super::boundary::BoundaryFilter;
use super::frames::FrameIndex;
use super::interval::SilenceInterval;

/// Scene score used to select hard-cut frames when a profile sets none.
pub const DEFAULT_SCENE_THRESHOLD: f64 = 0.2;

/// Reports scene changes that happen during a silence.
///
/// A scene change at `t` counts when `start <= t < end` for some silence at
/// least `min_silence` long. Results are sorted, deduplicated and limited to
/// timestamps strictly inside the boundary filter's margins.
pub fn find_hard_cuts(
    silences: &[SilenceInterval],
    frames: &FrameIndex,
    scene_threshold: Option<f64>,
    min_silence: f64,
    boundary: &BoundaryFilter,
) -> Vec<f64> {
    let scene_changes = frames.scene_changes(scene_threshold);

    let mut cuts: Vec<f64> = scene_changes
        .into_iter()
        .filter(|&t| {
            silences.iter().any(|s| {
                let s = &s.interval;
                s.duration() >= min_silence && s.start() <= t && t < s.end()
            })
        })
        .filter(|&t| boundary.accepts_timestamp(t))
        .collect();

    cuts.sort_by(f64::total_cmp);
    cuts.dedup();

    debug!("Found {} silent scene change(s)", cuts.len());
    cuts
}
