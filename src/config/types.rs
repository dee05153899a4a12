use serde::{Deserialize, Serialize};

use crate::analysis::CloseOverlapPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub show_timestamps: bool,
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_timestamps: false,
            colored_output: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub default_profile: String,
    /// Seconds at either end of the media where breaks are ignored
    pub edge_margin: f64,
    /// Files analysed at once; 0 uses the available parallelism
    pub max_parallel_jobs: usize,
    /// Read chapter marks from the container and use them for the fallback
    pub use_container_chapters: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            default_profile: "sensitive".to_string(),
            edge_margin: 1.0,
            max_parallel_jobs: 0,
            use_container_chapters: false,
        }
    }
}

fn default_close_overlap_tolerance() -> f64 {
    0.1
}

fn default_confirm_black_percentage() -> i32 {
    95
}

fn default_chapter_confirm_black_percentage() -> i32 {
    90
}

fn default_chapter_min_silence() -> f64 {
    0.01
}

fn default_synth_black_percentage() -> i32 {
    95
}

fn default_synth_min_duration() -> f64 {
    0.01
}

fn default_frame_rate() -> f64 {
    29.97
}

/// A detection profile as written in the YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProfile {
    pub title: String,

    // backend filter settings
    pub silence_noise_db: f64,
    pub silence_detect_duration: f64,
    pub black_detect_duration: f64,
    pub black_picture_threshold: f64,
    pub black_pixel_threshold: f64,

    pub min_silence_duration: f64,
    pub min_black_duration: f64,

    pub min_overlap: f64,
    #[serde(default = "default_close_overlap_tolerance")]
    pub close_overlap_tolerance: f64,
    #[serde(default)]
    pub close_overlap_policy: CloseOverlapPolicy,
    #[serde(default = "default_confirm_black_percentage")]
    pub confirm_black_percentage: i32,
    #[serde(default = "default_chapter_confirm_black_percentage")]
    pub chapter_confirm_black_percentage: i32,
    #[serde(default = "default_chapter_min_silence")]
    pub chapter_min_silence: f64,
    #[serde(default)]
    pub use_frame_analysis: bool,

    #[serde(default = "default_synth_black_percentage")]
    pub synth_black_percentage: i32,
    #[serde(default = "default_synth_min_duration")]
    pub synth_min_duration: f64,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,

    #[serde(default)]
    pub merge_gap: f64,
    #[serde(default)]
    pub min_period_duration: f64,
    #[serde(default)]
    pub scene_threshold: Option<f64>,
    #[serde(default)]
    pub chapter_marks: Vec<f64>,
}
