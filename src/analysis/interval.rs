//! Time intervals shared by every stage of break detection

use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed time range in seconds with `end >= start`.
///
/// Fields are private so the ordering invariant holds for every value that
/// exists; build one with [`Interval::new`] or [`Interval::try_new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IntervalBounds")]
pub struct Interval {
    start: f64,
    end: f64,
}

/// Unchecked bounds as they appear in serialized data.
#[derive(Deserialize)]
struct IntervalBounds {
    start: f64,
    end: f64,
}

impl TryFrom<IntervalBounds> for Interval {
    type Error = String;

    fn try_from(bounds: IntervalBounds) -> Result<Self, Self::Error> {
        Interval::try_new(bounds.start, bounds.end).ok_or_else(|| {
            format!(
                "invalid interval: start {} end {}",
                bounds.start, bounds.end
            )
        })
    }
}

impl Interval {
    /// Creates an interval, swapping the bounds if they arrive inverted.
    pub fn new(start: f64, end: f64) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    /// Creates an interval only when both bounds are finite and ordered.
    pub fn try_new(start: f64, end: f64) -> Option<Self> {
        if start.is_finite() && end.is_finite() && end >= start {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn midpoint(&self) -> f64 {
        self.start + self.duration() / 2.0
    }

    /// Inclusive on both ends.
    pub fn contains(&self, timestamp: f64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    /// Geometric intersection, `None` unless `max(starts) < min(ends)`.
    pub fn overlap(&self, other: &Interval) -> Option<Interval> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start < end {
            Some(Interval { start, end })
        } else {
            None
        }
    }

    /// Distance between the two intervals, 0.0 when they touch or intersect.
    pub fn gap_to(&self, other: &Interval) -> f64 {
        let max_start = self.start.max(other.start);
        let min_end = self.end.min(other.end);
        (max_start - min_end).max(0.0)
    }

    /// Smallest interval covering both.
    pub fn union(&self, other: &Interval) -> Interval {
        Interval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Widens the interval by `amount` seconds on each side.
    pub fn expanded(&self, amount: f64) -> Interval {
        Interval::new(self.start - amount, self.end + amount)
    }

    /// True when `timestamp` is inside or within `tolerance` of either edge.
    pub fn is_near(&self, timestamp: f64, tolerance: f64) -> bool {
        self.contains(timestamp)
            || (self.start - timestamp).abs() <= tolerance
            || (self.end - timestamp).abs() <= tolerance
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3}s - {:.3}s (duration: {:.3}s)",
            self.start,
            self.end,
            self.duration()
        )
    }
}

/// Where an interval came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalSource {
    /// Audio stayed below the loudness threshold
    Silence,
    /// Reported by the visual black detector
    Black,
    /// Built from consecutive black frames
    SynthesizedBlack,
}

impl IntervalSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Silence => "silence",
            Self::Black => "black",
            Self::SynthesizedBlack => "synthesized_black",
        }
    }
}

/// An interval tagged with the detector that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourcedInterval {
    pub interval: Interval,
    pub source: IntervalSource,
}

impl SourcedInterval {
    pub fn silence(interval: Interval) -> Self {
        Self {
            interval,
            source: IntervalSource::Silence,
        }
    }

    pub fn black(interval: Interval) -> Self {
        Self {
            interval,
            source: IntervalSource::Black,
        }
    }

    pub fn synthesized_black(interval: Interval) -> Self {
        Self {
            interval,
            source: IntervalSource::SynthesizedBlack,
        }
    }

    pub fn is_black(&self) -> bool {
        matches!(
            self.source,
            IntervalSource::Black | IntervalSource::SynthesizedBlack
        )
    }
}

pub type SilenceInterval = SourcedInterval;
pub type BlackInterval = SourcedInterval;

/// How a candidate period was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Close,
    Chapter,
}

/// A window where silence and blackness were found to coincide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidatePeriod {
    pub interval: Interval,
    pub kind: MatchKind,
}

impl CandidatePeriod {
    pub fn new(interval: Interval, kind: MatchKind) -> Self {
        Self { interval, kind }
    }
}

/// A final reported insertion period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdBreak {
    pub start: f64,
    pub midpoint: f64,
    pub end: f64,
}

impl From<Interval> for AdBreak {
    fn from(interval: Interval) -> Self {
        Self {
            start: interval.start(),
            midpoint: interval.midpoint(),
            end: interval.end(),
        }
    }
}
