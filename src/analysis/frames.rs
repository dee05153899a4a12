//! Per-frame samples and black-period synthesis

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::interval::{BlackInterval, Interval, SourcedInterval};

/// Scene score above which a frame counts as a scene change.
pub const SCENE_CHANGE_SCORE: f64 = 0.3;

/// What the backend reported about a single decoded frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameSample {
    pub timestamp: f64,
    /// Share of the picture judged black, 0-100
    pub black_percentage: i32,
    pub is_scene_change: bool,
    pub scene_score: f64,
    pub loudness_db: f64,
}

impl FrameSample {
    pub fn new(timestamp: f64, black_percentage: i32) -> Self {
        Self {
            timestamp,
            black_percentage,
            ..Self::default()
        }
    }

    pub fn with_scene_score(mut self, score: f64) -> Self {
        self.scene_score = score;
        self.is_scene_change = score > SCENE_CHANGE_SCORE;
        self
    }

    pub fn with_loudness(mut self, loudness_db: f64) -> Self {
        self.loudness_db = loudness_db;
        self
    }
}

/// Parameters for building black periods out of frame samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackSynthesis {
    pub min_black_percentage: i32,
    pub min_duration: f64,
    /// Added to the last black timestamp, since a sample stands for a whole frame
    pub frame_duration: f64,
}

impl Default for BlackSynthesis {
    fn default() -> Self {
        Self {
            min_black_percentage: 95,
            min_duration: 0.01,
            frame_duration: 1.0 / 29.97,
        }
    }
}

/// Frame samples ordered by timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameIndex {
    samples: Vec<FrameSample>,
}

impl FrameIndex {
    /// Builds the index, sorting samples by timestamp. The sort is stable so
    /// frames sharing a timestamp keep their report order.
    pub fn new(mut samples: Vec<FrameSample>) -> Self {
        samples.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[FrameSample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<FrameSample> {
        self.samples
    }

    /// Samples whose timestamp lies inside `window`, both ends inclusive.
    pub fn window(&self, window: &Interval) -> &[FrameSample] {
        let lower = self
            .samples
            .partition_point(|s| s.timestamp < window.start());
        let upper = self
            .samples
            .partition_point(|s| s.timestamp <= window.end());
        if lower >= upper {
            &[]
        } else {
            &self.samples[lower..upper]
        }
    }

    /// True if any frame inside `window` is at least `min_black_percentage` black.
    pub fn any_black_within(&self, window: &Interval, min_black_percentage: i32) -> bool {
        self.window(window)
            .iter()
            .any(|s| s.black_percentage >= min_black_percentage)
    }

    /// Timestamps of scene changes. With `threshold`, a frame qualifies when
    /// its score exceeds it; otherwise the parsed scene-change flag is used.
    pub fn scene_changes(&self, threshold: Option<f64>) -> Vec<f64> {
        self.samples
            .iter()
            .filter(|s| match threshold {
                Some(threshold) => s.scene_score > threshold,
                None => s.is_scene_change,
            })
            .map(|s| s.timestamp)
            .collect()
    }

    /// Builds black periods from runs of consecutive black frames.
    pub fn synthesize_black_periods(&self, params: &BlackSynthesis) -> Vec<BlackInterval> {
        let mut periods = Vec::new();
        // (first black timestamp, last black timestamp) of the open run
        let mut open: Option<(f64, f64)> = None;

        for sample in &self.samples {
            if sample.black_percentage >= params.min_black_percentage {
                open = Some(match open {
                    Some((start, _)) => (start, sample.timestamp),
                    None => (sample.timestamp, sample.timestamp),
                });
            } else if let Some((start, last)) = open.take() {
                push_synthesized(&mut periods, start, last, params);
            }
        }

        if let Some((start, last)) = open {
            push_synthesized(&mut periods, start, last, params);
        }

        debug!(
            "Synthesized {} black period(s) from {} frame(s)",
            periods.len(),
            self.samples.len()
        );

        periods
    }
}

fn push_synthesized(periods: &mut Vec<BlackInterval>, start: f64, last: f64, params: &BlackSynthesis) {
    let end = last + params.frame_duration;
    if end - start >= params.min_duration {
        periods.push(SourcedInterval::synthesized_black(Interval::new(start, end)));
    }
}
