pub mod error;
pub mod ffmpeg;
pub mod filesystem;
pub mod logging;

pub use error::{Error, Result};
pub use ffmpeg::{AnalysisWindow, FfmpegWrapper, MediaInfo};
pub use filesystem::{collect_inputs, find_video_files, read_report};
pub use logging::setup_logging;
