//! Rejection of periods too close to the start or end of the media

use tracing::debug;

use super::interval::Interval;

pub const DEFAULT_EDGE_MARGIN: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryFilter {
    duration: f64,
    edge_margin: f64,
}

impl BoundaryFilter {
    pub fn new(duration: f64, edge_margin: f64) -> Self {
        Self {
            duration,
            edge_margin: edge_margin.max(0.0),
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn edge_margin(&self) -> f64 {
        self.edge_margin
    }

    /// Clamps `period` to the media and keeps it only when it starts after
    /// the opening margin and ends before the closing margin.
    pub fn clamp(&self, period: &Interval) -> Option<Interval> {
        let start = period.start().max(0.0);
        let end = period.end().min(self.duration);

        if start <= self.edge_margin || end >= self.duration - self.edge_margin {
            return None;
        }

        Interval::try_new(start, end)
    }

    pub fn apply(&self, periods: &[Interval]) -> Vec<Interval> {
        let kept: Vec<Interval> = periods.iter().filter_map(|p| self.clamp(p)).collect();

        if kept.len() < periods.len() {
            debug!(
                "Dropped {} period(s) within {:.3}s of the media edges",
                periods.len() - kept.len(),
                self.edge_margin
            );
        }

        kept
    }

    /// Strict point test used for single timestamps.
    pub fn accepts_timestamp(&self, timestamp: f64) -> bool {
        timestamp > self.edge_margin && timestamp < self.duration - self.edge_margin
    }
}
