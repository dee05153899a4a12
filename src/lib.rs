pub mod analysis;
pub mod cli;
pub mod config;
pub mod processing;
pub mod utils;

pub use analysis::{
    AdBreak, BreakDetector, DetectionMode, DetectionParams, DetectionReport, Interval, ReportSet,
};
pub use config::{Config, DetectionProfile, ProfileManager};
pub use processing::{BatchRunner, FileProcessor, FileResult, ProcessingOptions, ReportFiles};
pub use utils::{Error, FfmpegWrapper, Result};
