use super::types::*;
use crate::analysis::CloseOverlapPolicy;
use crate::utils::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const DEFAULT_CONFIG_FILE: &str = "config.default.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    pub profiles: HashMap<String, RawProfile>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)?;
        let config: Config = serde_yaml::from_str(&config_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the first configuration found: the explicit path, then
    /// `config.default.yaml` in the working directory or its `config/`
    /// subdirectory, then the user config directory. Falls back to the
    /// built-in profiles when none exists.
    ///
    /// An explicit path that cannot be loaded is an error; the implicit
    /// locations are only tried when present.
    pub fn load_with_fallback(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            debug!("Loading configuration from {}", path.display());
            return Self::load(path);
        }

        for candidate in Self::search_paths() {
            if candidate.is_file() {
                debug!("Loading configuration from {}", candidate.display());
                return Self::load(&candidate);
            }
        }

        warn!("No configuration file found, using built-in profiles");
        Ok(Self::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(DEFAULT_CONFIG_FILE),
            Path::new("config").join(DEFAULT_CONFIG_FILE),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("ad-break-detector").join("config.yaml"));
        }
        paths
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.profiles.is_empty() {
            return Err(Error::validation("At least one profile must be defined"));
        }

        if !self.profiles.contains_key(&self.detection.default_profile) {
            return Err(Error::validation(format!(
                "Default profile '{}' is not defined",
                self.detection.default_profile
            )));
        }

        if !(self.detection.edge_margin.is_finite() && self.detection.edge_margin >= 0.0) {
            return Err(Error::validation(format!(
                "edge_margin must not be negative: {}",
                self.detection.edge_margin
            )));
        }

        for (name, profile) in &self.profiles {
            validate_profile(name, profile)?;
        }

        Ok(())
    }
}

fn validate_profile(name: &str, profile: &RawProfile) -> Result<()> {
    let durations = [
        ("silence_detect_duration", profile.silence_detect_duration),
        ("black_detect_duration", profile.black_detect_duration),
        ("min_silence_duration", profile.min_silence_duration),
        ("min_black_duration", profile.min_black_duration),
        ("min_overlap", profile.min_overlap),
        ("close_overlap_tolerance", profile.close_overlap_tolerance),
        ("chapter_min_silence", profile.chapter_min_silence),
        ("synth_min_duration", profile.synth_min_duration),
        ("merge_gap", profile.merge_gap),
        ("min_period_duration", profile.min_period_duration),
    ];
    for (field, value) in durations {
        if !(value.is_finite() && value >= 0.0) {
            return Err(Error::validation(format!(
                "Invalid {} for profile '{}': {} (must not be negative)",
                field, name, value
            )));
        }
    }

    let percentages = [
        ("confirm_black_percentage", profile.confirm_black_percentage),
        (
            "chapter_confirm_black_percentage",
            profile.chapter_confirm_black_percentage,
        ),
        ("synth_black_percentage", profile.synth_black_percentage),
    ];
    for (field, value) in percentages {
        if !(0..=100).contains(&value) {
            return Err(Error::validation(format!(
                "Invalid {} for profile '{}': {} (must be between 0 and 100)",
                field, name, value
            )));
        }
    }

    let ratios = [
        ("black_picture_threshold", profile.black_picture_threshold),
        ("black_pixel_threshold", profile.black_pixel_threshold),
    ];
    for (field, value) in ratios {
        if !(0.0..=1.0).contains(&value) {
            return Err(Error::validation(format!(
                "Invalid {} for profile '{}': {} (must be between 0 and 1)",
                field, name, value
            )));
        }
    }

    if !(profile.frame_rate.is_finite() && profile.frame_rate > 0.0) {
        return Err(Error::validation(format!(
            "Invalid frame_rate for profile '{}': {}",
            name, profile.frame_rate
        )));
    }

    if let Some(threshold) = profile.scene_threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::validation(format!(
                "Invalid scene_threshold for profile '{}': {}",
                name, threshold
            )));
        }
    }

    Ok(())
}

fn sensitive_profile() -> RawProfile {
    RawProfile {
        title: "Fade detection with frame confirmation".to_string(),
        silence_noise_db: -30.0,
        silence_detect_duration: 0.05,
        black_detect_duration: 0.03,
        black_picture_threshold: 0.9,
        black_pixel_threshold: 0.1,
        min_silence_duration: 0.005,
        min_black_duration: 0.005,
        min_overlap: 0.01,
        close_overlap_tolerance: 0.1,
        close_overlap_policy: CloseOverlapPolicy::Union,
        confirm_black_percentage: 95,
        chapter_confirm_black_percentage: 90,
        chapter_min_silence: 0.01,
        use_frame_analysis: true,
        synth_black_percentage: 95,
        synth_min_duration: 0.01,
        frame_rate: 29.97,
        merge_gap: 0.0,
        min_period_duration: 0.0,
        scene_threshold: None,
        chapter_marks: Vec::new(),
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut profiles = HashMap::new();

        profiles.insert(
            "strict".to_string(),
            RawProfile {
                title: "Long silence over long black".to_string(),
                silence_detect_duration: 1.0,
                black_detect_duration: 0.5,
                black_picture_threshold: 0.98,
                min_silence_duration: 1.0,
                min_black_duration: 0.5,
                min_overlap: 1.0,
                use_frame_analysis: false,
                ..sensitive_profile()
            },
        );
        profiles.insert(
            "classic".to_string(),
            RawProfile {
                title: "Silence and black overlap without frame analysis".to_string(),
                silence_noise_db: -35.0,
                silence_detect_duration: 0.03,
                black_detect_duration: 0.1,
                black_picture_threshold: 0.95,
                min_silence_duration: 0.01,
                min_black_duration: 0.01,
                min_overlap: 0.03,
                use_frame_analysis: false,
                ..sensitive_profile()
            },
        );
        profiles.insert("sensitive".to_string(), sensitive_profile());
        profiles.insert(
            "bridged".to_string(),
            RawProfile {
                title: "Sensitive detection joining breaks up to 1s apart".to_string(),
                merge_gap: 1.0,
                ..sensitive_profile()
            },
        );

        Self {
            tools: ToolsConfig::default(),
            logging: LoggingConfig::default(),
            detection: DetectionConfig::default(),
            profiles,
        }
    }
}
