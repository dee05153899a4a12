use super::types::RawProfile;
use crate::analysis::hard_cut::DEFAULT_SCENE_THRESHOLD;
use crate::analysis::{BlackSynthesis, CloseOverlapPolicy, DetectionParams, MatchParams};
use crate::utils::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Seconds a chapter mark may lie outside a silence and still confirm it.
const CHAPTER_TOLERANCE: f64 = 0.5;

/// Padding around a silence when searching frames for chapter confirmation.
const CHAPTER_FRAME_PADDING: f64 = 0.1;

/// Settings handed to the backend filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    pub silence_noise_db: f64,
    pub silence_detect_duration: f64,
    pub black_detect_duration: f64,
    pub black_picture_threshold: f64,
    pub black_pixel_threshold: f64,
    /// Whether the per-frame report is produced at all
    pub frame_analysis: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionProfile {
    pub name: String,
    pub title: String,
    pub backend: BackendSettings,
    pub min_silence_duration: f64,
    pub min_black_duration: f64,
    pub min_overlap: f64,
    pub close_overlap_tolerance: f64,
    pub close_overlap_policy: CloseOverlapPolicy,
    pub confirm_black_percentage: i32,
    pub chapter_confirm_black_percentage: i32,
    pub chapter_min_silence: f64,
    pub synth_black_percentage: i32,
    pub synth_min_duration: f64,
    pub frame_rate: f64,
    pub merge_gap: f64,
    pub min_period_duration: f64,
    pub scene_threshold: Option<f64>,
    pub chapter_marks: Vec<f64>,
}

impl DetectionProfile {
    pub fn from_raw(name: String, raw: RawProfile) -> Result<Self> {
        if !(raw.frame_rate.is_finite() && raw.frame_rate > 0.0) {
            return Err(Error::profile(format!(
                "Invalid frame rate for profile '{}': {}",
                name, raw.frame_rate
            )));
        }

        let mut chapter_marks: Vec<f64> = raw
            .chapter_marks
            .into_iter()
            .filter(|mark| mark.is_finite())
            .collect();
        chapter_marks.sort_by(f64::total_cmp);

        Ok(DetectionProfile {
            name,
            title: raw.title,
            backend: BackendSettings {
                silence_noise_db: raw.silence_noise_db,
                silence_detect_duration: raw.silence_detect_duration,
                black_detect_duration: raw.black_detect_duration,
                black_picture_threshold: raw.black_picture_threshold,
                black_pixel_threshold: raw.black_pixel_threshold,
                frame_analysis: raw.use_frame_analysis,
            },
            min_silence_duration: raw.min_silence_duration,
            min_black_duration: raw.min_black_duration,
            min_overlap: raw.min_overlap,
            close_overlap_tolerance: raw.close_overlap_tolerance,
            close_overlap_policy: raw.close_overlap_policy,
            confirm_black_percentage: raw.confirm_black_percentage,
            chapter_confirm_black_percentage: raw.chapter_confirm_black_percentage,
            chapter_min_silence: raw.chapter_min_silence,
            synth_black_percentage: raw.synth_black_percentage,
            synth_min_duration: raw.synth_min_duration,
            frame_rate: raw.frame_rate,
            merge_gap: raw.merge_gap,
            min_period_duration: raw.min_period_duration,
            scene_threshold: raw.scene_threshold,
            chapter_marks,
        })
    }

    pub fn frame_duration(&self) -> f64 {
        1.0 / self.frame_rate
    }

    /// Scene score a frame must exceed to count as a hard cut.
    pub fn scene_threshold(&self) -> f64 {
        self.scene_threshold.unwrap_or(DEFAULT_SCENE_THRESHOLD)
    }

    /// Builds detector parameters, adding run-specific chapter marks to the
    /// profile's own list.
    pub fn to_params(&self, edge_margin: f64, extra_chapters: &[f64]) -> DetectionParams {
        let mut chapter_marks = self.chapter_marks.clone();
        chapter_marks.extend(extra_chapters.iter().copied().filter(|m| m.is_finite()));
        chapter_marks.sort_by(f64::total_cmp);
        chapter_marks.dedup();

        // frame evidence is used whenever a frame report is present, even when
        // the backend is not asked to produce one
        DetectionParams {
            min_silence_duration: self.min_silence_duration,
            min_black_duration: self.min_black_duration,
            matching: MatchParams {
                min_duration: self.min_overlap,
                frame_confirmation: true,
                close_tolerance: self.close_overlap_tolerance,
                close_policy: self.close_overlap_policy,
                confirm_black_percentage: self.confirm_black_percentage,
                chapter_marks,
                chapter_tolerance: CHAPTER_TOLERANCE,
                chapter_frame_padding: CHAPTER_FRAME_PADDING,
                chapter_confirm_black_percentage: self.chapter_confirm_black_percentage,
                chapter_min_silence: self.chapter_min_silence,
            },
            synthesize_black: true,
            synthesis: BlackSynthesis {
                min_black_percentage: self.synth_black_percentage,
                min_duration: self.synth_min_duration,
                frame_duration: self.frame_duration(),
            },
            merge_gap: self.merge_gap,
            min_period_duration: self.min_period_duration,
            edge_margin,
            scene_threshold: Some(self.scene_threshold()),
        }
    }
}

pub struct ProfileManager {
    profiles: HashMap<String, DetectionProfile>,
}

impl ProfileManager {
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    pub fn load_profiles(&mut self, raw_profiles: HashMap<String, RawProfile>) -> Result<()> {
        self.profiles.clear();

        for (name, raw_profile) in raw_profiles {
            let profile = DetectionProfile::from_raw(name.clone(), raw_profile)?;
            self.profiles.insert(name, profile);
        }

        Ok(())
    }

    pub fn get_profile(&self, name: &str) -> Option<&DetectionProfile> {
        self.profiles.get(name)
    }

    /// Like [`get_profile`](Self::get_profile), but unknown names are an error
    /// listing the available profiles.
    pub fn require_profile(&self, name: &str) -> Result<&DetectionProfile> {
        self.profiles.get(name).ok_or_else(|| {
            Error::profile(format!(
                "Unknown profile '{}'. Available: {}",
                name,
                self.list_profiles().join(", ")
            ))
        })
    }

    /// Profile names in alphabetical order.
    pub fn list_profiles(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ProfileManager {
    fn default() -> Self {
        Self::new()
    }
}
