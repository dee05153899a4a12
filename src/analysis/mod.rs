pub mod boundary;
pub mod detector;
pub mod frames;
pub mod hard_cut;
pub mod interval;
pub mod matcher;
pub mod merge;
pub mod reports;

pub use boundary::BoundaryFilter;
pub use detector::{BreakDetector, DetectionMode, DetectionParams, DetectionReport, ReportSet};
pub use frames::{BlackSynthesis, FrameIndex, FrameSample};
pub use interval::{AdBreak, CandidatePeriod, Interval, IntervalSource, MatchKind};
pub use matcher::{CloseOverlapPolicy, IntervalMatcher, MatchParams};
pub use merge::merge_periods;
pub use reports::{LineError, ParseOutcome, ReportParser};
