//! Break detection pipeline from raw reports to reported periods

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::boundary::{BoundaryFilter, DEFAULT_EDGE_MARGIN};
use super::frames::{BlackSynthesis, FrameIndex};
use super::hard_cut::find_hard_cuts;
use super::interval::{AdBreak, BlackInterval, SilenceInterval};
use super::matcher::{IntervalMatcher, MatchParams};
use super::merge::merge_periods;
use super::reports::ReportParser;
use crate::utils::logging::{log_detection_complete, log_reports_parsed};
use crate::utils::{Error, Result};

/// Which kind of insertion point to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMode {
    /// Silence coinciding with a fade to black
    #[default]
    Fade,
    /// Scene changes during silence
    HardCut,
}

impl DetectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fade => "fade",
            Self::HardCut => "hard-cut",
        }
    }
}

/// Tunables for one detection run.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionParams {
    pub min_silence_duration: f64,
    pub min_black_duration: f64,
    pub matching: MatchParams,
    /// Build black periods from frame samples when no black report exists
    pub synthesize_black: bool,
    pub synthesis: BlackSynthesis,
    pub merge_gap: f64,
    pub min_period_duration: f64,
    pub edge_margin: f64,
    pub scene_threshold: Option<f64>,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            min_silence_duration: 0.01,
            min_black_duration: 0.01,
            matching: MatchParams::default(),
            synthesize_black: true,
            synthesis: BlackSynthesis::default(),
            merge_gap: 0.0,
            min_period_duration: 0.0,
            edge_margin: DEFAULT_EDGE_MARGIN,
            scene_threshold: None,
        }
    }
}

/// The three raw backend reports for one media file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSet {
    pub silence: String,
    pub black: String,
    pub frames: String,
    /// Start of the analysed window within the media
    pub time_offset: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionReport {
    pub mode: DetectionMode,
    pub duration: f64,
    pub breaks: Vec<AdBreak>,
    pub hard_cuts: Vec<f64>,
    pub silence_count: usize,
    pub black_count: usize,
    pub synthesized_black: bool,
    pub frame_count: usize,
    pub candidate_count: usize,
    pub skipped_lines: usize,
}

impl DetectionReport {
    pub fn is_empty(&self) -> bool {
        match self.mode {
            DetectionMode::Fade => self.breaks.is_empty(),
            DetectionMode::HardCut => self.hard_cuts.is_empty(),
        }
    }
}

struct ParsedReports {
    silences: Vec<SilenceInterval>,
    blacks: Vec<BlackInterval>,
    synthesized: bool,
    frames: FrameIndex,
    skipped: usize,
}

pub struct BreakDetector {
    params: DetectionParams,
}

impl BreakDetector {
    pub fn new(params: DetectionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    pub fn run(
        &self,
        mode: DetectionMode,
        reports: &ReportSet,
        duration: f64,
    ) -> Result<DetectionReport> {
        match mode {
            DetectionMode::Fade => self.detect(reports, duration),
            DetectionMode::HardCut => self.detect_hard_cuts(reports, duration),
        }
    }

    /// Finds fade-to-black periods: parse, match, merge and edge-filter.
    pub fn detect(&self, reports: &ReportSet, duration: f64) -> Result<DetectionReport> {
        validate_duration(duration)?;
        let parsed = self.parse(reports);

        let matcher = IntervalMatcher::new(&self.params.matching, &parsed.frames);
        let candidates = matcher.find_candidates(&parsed.silences, &parsed.blacks);

        let merged = merge_periods(
            &candidates,
            self.params.merge_gap,
            self.params.min_period_duration,
        );
        let boundary = BoundaryFilter::new(duration, self.params.edge_margin);
        let breaks: Vec<AdBreak> = boundary
            .apply(&merged)
            .into_iter()
            .map(AdBreak::from)
            .collect();

        for ad_break in &breaks {
            debug!(
                "Break {:.3}s - {:.3}s (midpoint {:.3}s)",
                ad_break.start, ad_break.midpoint, ad_break.end
            );
        }
        log_detection_complete(breaks.len(), candidates.len());

        Ok(DetectionReport {
            mode: DetectionMode::Fade,
            duration,
            breaks,
            hard_cuts: Vec::new(),
            silence_count: parsed.silences.len(),
            black_count: parsed.blacks.len(),
            synthesized_black: parsed.synthesized,
            frame_count: parsed.frames.len(),
            candidate_count: candidates.len(),
            skipped_lines: parsed.skipped,
        })
    }

    /// Finds scene changes that fall inside a silence.
    pub fn detect_hard_cuts(&self, reports: &ReportSet, duration: f64) -> Result<DetectionReport> {
        validate_duration(duration)?;
        let parsed = self.parse(reports);

        let boundary = BoundaryFilter::new(duration, self.params.edge_margin);
        let hard_cuts = find_hard_cuts(
            &parsed.silences,
            &parsed.frames,
            self.params.scene_threshold,
            self.params.min_silence_duration,
            &boundary,
        );
        info!("Found {} hard-cut insertion point(s)", hard_cuts.len());

        Ok(DetectionReport {
            mode: DetectionMode::HardCut,
            duration,
            breaks: Vec::new(),
            hard_cuts,
            silence_count: parsed.silences.len(),
            black_count: parsed.blacks.len(),
            synthesized_black: false,
            frame_count: parsed.frames.len(),
            candidate_count: 0,
            skipped_lines: parsed.skipped,
        })
    }

    fn parse(&self, reports: &ReportSet) -> ParsedReports {
        let parser = ReportParser::new(reports.time_offset);

        let silence = parser.parse_silence(&reports.silence, self.params.min_silence_duration);
        let black = parser.parse_black(&reports.black, self.params.min_black_duration);
        let frames = parser.parse_frames(&reports.frames);

        let skipped = silence.skipped.len() + black.skipped.len() + frames.skipped.len();
        if skipped > 0 {
            debug!("Skipped {} malformed report line(s)", skipped);
        }

        let frames = FrameIndex::new(frames.records);
        let mut blacks = black.records;
        let mut synthesized = false;

        if blacks.is_empty() && self.params.synthesize_black && !frames.is_empty() {
            blacks = frames.synthesize_black_periods(&self.params.synthesis);
            synthesized = true;
        }

        log_reports_parsed(silence.records.len(), blacks.len(), frames.len(), synthesized);

        ParsedReports {
            silences: silence.records,
            blacks,
            synthesized,
            frames,
            skipped,
        }
    }
}

fn validate_duration(duration: f64) -> Result<()> {
    if duration.is_finite() && duration > 0.0 {
        Ok(())
    } else {
        Err(Error::analysis(format!(
            "Media duration must be positive, got {}",
            duration
        )))
    }
}
