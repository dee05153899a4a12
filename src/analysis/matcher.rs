//! Correlation of silence intervals with black intervals

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::frames::FrameIndex;
use super::interval::{BlackInterval, CandidatePeriod, Interval, MatchKind, SilenceInterval};

/// Span used when a silence and a black interval are close but disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseOverlapPolicy {
    /// Cover both intervals and the gap between them
    #[default]
    Union,
    /// Use the black interval as reported
    BlackBounds,
}

impl CloseOverlapPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::BlackBounds => "black_bounds",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "union" => Some(Self::Union),
            "black_bounds" | "black" => Some(Self::BlackBounds),
            _ => None,
        }
    }

    fn combine(&self, silence: &Interval, black: &Interval) -> Interval {
        match self {
            Self::Union => silence.union(black),
            Self::BlackBounds => *black,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchParams {
    /// Shortest overlap or combined span accepted as a candidate
    pub min_duration: f64,
    /// Enables close overlaps, which need frame samples to confirm them
    pub frame_confirmation: bool,
    /// Largest gap between disjoint intervals still treated as close
    pub close_tolerance: f64,
    pub close_policy: CloseOverlapPolicy,
    /// Black percentage a frame needs to confirm a close overlap
    pub confirm_black_percentage: i32,
    /// Known reference timestamps for the fallback check
    pub chapter_marks: Vec<f64>,
    /// How far outside a silence a chapter mark may lie
    pub chapter_tolerance: f64,
    /// Padding around a silence when looking for confirming frames
    pub chapter_frame_padding: f64,
    pub chapter_confirm_black_percentage: i32,
    /// Silences shorter than this never use the fallback
    pub chapter_min_silence: f64,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            min_duration: 0.01,
            frame_confirmation: true,
            close_tolerance: 0.1,
            close_policy: CloseOverlapPolicy::Union,
            confirm_black_percentage: 95,
            chapter_marks: Vec::new(),
            chapter_tolerance: 0.5,
            chapter_frame_padding: 0.1,
            chapter_confirm_black_percentage: 90,
            chapter_min_silence: 0.01,
        }
    }
}

/// Finds candidate periods where silence and blackness coincide.
///
/// Every silence is compared with every black interval, so one silence can
/// yield several (possibly overlapping) candidates; merging happens later.
pub struct IntervalMatcher<'a> {
    params: &'a MatchParams,
    frames: &'a FrameIndex,
}

impl<'a> IntervalMatcher<'a> {
    pub fn new(params: &'a MatchParams, frames: &'a FrameIndex) -> Self {
        Self { params, frames }
    }

    pub fn find_candidates(
        &self,
        silences: &[SilenceInterval],
        blacks: &[BlackInterval],
    ) -> Vec<CandidatePeriod> {
        let mut candidates = Vec::new();

        for silence in silences {
            let silence = &silence.interval;
            let mut matched = false;

            for black in blacks {
                let black = &black.interval;

                if let Some(overlap) = self.exact_overlap(silence, black) {
                    trace!("Exact overlap {} for silence {}", overlap, silence);
                    candidates.push(CandidatePeriod::new(overlap, MatchKind::Exact));
                    matched = true;
                } else if let Some(span) = self.close_overlap(silence, black) {
                    trace!("Close overlap {} for silence {}", span, silence);
                    candidates.push(CandidatePeriod::new(span, MatchKind::Close));
                    matched = true;
                }
            }

            if !matched {
                if let Some(period) = self.chapter_fallback(silence) {
                    debug!("Silence {} confirmed by chapter mark", silence);
                    candidates.push(CandidatePeriod::new(period, MatchKind::Chapter));
                }
            }
        }

        debug!(
            "Matched {} candidate(s) from {} silence and {} black interval(s)",
            candidates.len(),
            silences.len(),
            blacks.len()
        );

        candidates
    }

    fn exact_overlap(&self, silence: &Interval, black: &Interval) -> Option<Interval> {
        silence
            .overlap(black)
            .filter(|overlap| overlap.duration() >= self.params.min_duration)
    }

    /// Disjoint intervals separated by at most the tolerance, confirmed by at
    /// least one black frame inside the combined span.
    fn close_overlap(&self, silence: &Interval, black: &Interval) -> Option<Interval> {
        if !self.params.frame_confirmation {
            return None;
        }

        let gap = silence.gap_to(black);
        if gap <= 0.0 || gap > self.params.close_tolerance {
            return None;
        }

        let span = self.params.close_policy.combine(silence, black);
        if span.duration() < self.params.min_duration {
            return None;
        }

        if self
            .frames
            .any_black_within(&span, self.params.confirm_black_percentage)
        {
            Some(span)
        } else {
            None
        }
    }

    /// Accepts an unmatched silence verbatim when a chapter mark sits inside
    /// or near it and a black frame confirms it.
    fn chapter_fallback(&self, silence: &Interval) -> Option<Interval> {
        if silence.duration() < self.params.chapter_min_silence {
            return None;
        }

        let frame_window = silence.expanded(self.params.chapter_frame_padding);

        self.params
            .chapter_marks
            .iter()
            .filter(|&&mark| silence.is_near(mark, self.params.chapter_tolerance))
            .find(|_| {
                self.frames
                    .any_black_within(&frame_window, self.params.chapter_confirm_black_percentage)
            })
            .map(|_| *silence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::frames::FrameSample;
    use crate::analysis::interval::SourcedInterval;
    use pretty_assertions::assert_eq;

    fn silences(data: &[(f64, f64)]) -> Vec<SilenceInterval> {
        data.iter()
            .map(|&(s, e)| SourcedInterval::silence(Interval::new(s, e)))
            .collect()
    }

    fn blacks(data: &[(f64, f64)]) -> Vec<BlackInterval> {
        data.iter()
            .map(|&(s, e)| SourcedInterval::black(Interval::new(s, e)))
            .collect()
    }

    fn frames(data: &[(f64, i32)]) -> FrameIndex {
        FrameIndex::new(data.iter().map(|&(t, b)| FrameSample::new(t, b)).collect())
    }

    #[test]
    fn test_exact_overlap_emits_intersection() {
        let params = MatchParams {
            min_duration: 0.05,
            ..MatchParams::default()
        };
        let index = FrameIndex::default();
        let matcher = IntervalMatcher::new(&params, &index);

        let candidates = matcher.find_candidates(&silences(&[(10.0, 10.2)]), &blacks(&[(10.1, 10.3)]));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, MatchKind::Exact);
        assert_eq!(candidates[0].interval, Interval::new(10.1, 10.2));
    }

    #[test]
    fn test_exact_overlap_below_min_duration() {
        let params = MatchParams {
            min_duration: 0.5,
            ..MatchParams::default()
        };
        let index = FrameIndex::default();
        let matcher = IntervalMatcher::new(&params, &index);

        let candidates = matcher.find_candidates(&silences(&[(10.0, 10.2)]), &blacks(&[(10.1, 10.3)]));
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_every_black_interval_contributes() {
        let params = MatchParams::default();
        let index = FrameIndex::default();
        let matcher = IntervalMatcher::new(&params, &index);

        let candidates = matcher.find_candidates(
            &silences(&[(30.0, 32.0)]),
            &blacks(&[(29.5, 30.5), (31.0, 31.5), (40.0, 41.0)]),
        );
        let spans: Vec<Interval> = candidates.iter().map(|c| c.interval).collect();
        assert_eq!(spans, vec![Interval::new(30.0, 30.5), Interval::new(31.0, 31.5)]);
    }

    #[test]
    fn test_gap_beyond_tolerance_yields_nothing() {
        let params = MatchParams::default();
        // frame evidence inside the gap does not help once the gap is too wide
        let index = frames(&[(20.1, 100)]);
        let matcher = IntervalMatcher::new(&params, &index);

        let candidates = matcher.find_candidates(&silences(&[(20.0, 20.05)]), &blacks(&[(20.2, 20.4)]));
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_close_overlap_needs_black_frame() {
        let params = MatchParams::default();
        let silence = silences(&[(20.0, 20.1)]);
        let black = blacks(&[(20.15, 20.4)]);

        let unconfirmed = frames(&[(20.12, 40), (20.3, 60)]);
        let matcher = IntervalMatcher::new(&params, &unconfirmed);
        assert!(matcher.find_candidates(&silence, &black).is_empty());

        let confirmed = frames(&[(20.12, 40), (20.3, 96)]);
        let matcher = IntervalMatcher::new(&params, &confirmed);
        let candidates = matcher.find_candidates(&silence, &black);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, MatchKind::Close);
        assert_eq!(candidates[0].interval, Interval::new(20.0, 20.4));

        let disabled = MatchParams {
            frame_confirmation: false,
            ..MatchParams::default()
        };
        let matcher = IntervalMatcher::new(&disabled, &confirmed);
        assert!(matcher.find_candidates(&silence, &black).is_empty());
    }

    #[test]
    fn test_close_overlap_gap_at_tolerance() {
        let params = MatchParams {
            close_tolerance: 0.25,
            ..MatchParams::default()
        };
        let index = frames(&[(20.9, 100)]);
        let matcher = IntervalMatcher::new(&params, &index);
        let silence = silences(&[(20.0, 20.5)]);

        // gap of exactly 0.25s
        let candidates = matcher.find_candidates(&silence, &blacks(&[(20.75, 21.0)]));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, MatchKind::Close);
        assert_eq!(candidates[0].interval, Interval::new(20.0, 21.0));

        // gap of 0.2578125s
        let candidates = matcher.find_candidates(&silence, &blacks(&[(20.7578125, 21.0)]));
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_close_overlap_black_bounds_policy() {
        let params = MatchParams {
            close_policy: CloseOverlapPolicy::BlackBounds,
            ..MatchParams::default()
        };
        let index = frames(&[(20.3, 100)]);
        let matcher = IntervalMatcher::new(&params, &index);

        let candidates = matcher.find_candidates(&silences(&[(20.0, 20.1)]), &blacks(&[(20.15, 20.4)]));
        assert_eq!(candidates[0].interval, Interval::new(20.15, 20.4));
    }

    #[test]
    fn test_chapter_fallback() {
        let params = MatchParams {
            chapter_marks: vec![0.0, 94.360933, 631.297333],
            ..MatchParams::default()
        };
        let index = frames(&[(94.05, 92)]);
        let matcher = IntervalMatcher::new(&params, &index);

        // mark lies 0.26s past the silence end, within tolerance
        let candidates = matcher.find_candidates(&silences(&[(94.0, 94.1)]), &[]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, MatchKind::Chapter);
        assert_eq!(candidates[0].interval, Interval::new(94.0, 94.1));
    }

    #[test]
    fn test_chapter_fallback_requires_black_frame_and_nearby_mark() {
        let params = MatchParams {
            chapter_marks: vec![94.360933],
            ..MatchParams::default()
        };

        let dim = frames(&[(94.05, 80)]);
        let matcher = IntervalMatcher::new(&params, &dim);
        assert!(matcher.find_candidates(&silences(&[(94.0, 94.1)]), &[]).is_empty());

        let dark = frames(&[(200.05, 100)]);
        let matcher = IntervalMatcher::new(&params, &dark);
        assert!(matcher.find_candidates(&silences(&[(200.0, 200.1)]), &[]).is_empty());
    }

    #[test]
    fn test_chapter_mark_inside_silence() {
        let params = MatchParams {
            chapter_marks: vec![120.5],
            chapter_tolerance: 0.1,
            ..MatchParams::default()
        };
        let index = frames(&[(120.5, 95)]);
        let matcher = IntervalMatcher::new(&params, &index);

        let candidates = matcher.find_candidates(&silences(&[(120.0, 121.0)]), &[]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, MatchKind::Chapter);
        assert_eq!(candidates[0].interval, Interval::new(120.0, 121.0));
    }

    #[test]
    fn test_chapter_fallback_emits_once_for_several_marks() {
        let params = MatchParams {
            chapter_marks: vec![119.8, 120.2, 120.8],
            ..MatchParams::default()
        };
        let index = frames(&[(120.4, 100)]);
        let matcher = IntervalMatcher::new(&params, &index);

        let candidates = matcher.find_candidates(&silences(&[(120.0, 121.0)]), &[]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, MatchKind::Chapter);
    }

    #[test]
    fn test_chapter_fallback_skipped_when_matched() {
        let params = MatchParams {
            chapter_marks: vec![50.0],
            ..MatchParams::default()
        };
        let index = frames(&[(50.0, 100)]);
        let matcher = IntervalMatcher::new(&params, &index);

        let candidates = matcher.find_candidates(&silences(&[(49.5, 50.5)]), &blacks(&[(50.0, 50.2)]));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, MatchKind::Exact);
    }

    #[test]
    fn test_policy_from_string() {
        assert_eq!(CloseOverlapPolicy::from_string("Union"), Some(CloseOverlapPolicy::Union));
        assert_eq!(
            CloseOverlapPolicy::from_string("black_bounds"),
            Some(CloseOverlapPolicy::BlackBounds)
        );
        assert_eq!(CloseOverlapPolicy::from_string("widest"), None);
    }
}
