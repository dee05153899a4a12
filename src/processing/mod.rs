pub mod batch;

pub use batch::{BatchOutcome, BatchRunner};

use crate::{
    analysis::{BreakDetector, DetectionMode, DetectionReport, ReportSet},
    config::DetectionProfile,
    utils::{
        logging::log_detection_start, read_report, AnalysisWindow, Error, FfmpegWrapper, Result,
    },
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Per-run settings shared by every file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingOptions {
    pub mode: DetectionMode,
    pub window: AnalysisWindow,
    pub edge_margin: f64,
    /// Chapter marks given on the command line
    pub chapters: Vec<f64>,
    pub use_container_chapters: bool,
}

/// Previously captured reports used instead of running the backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportFiles {
    pub silence: Option<PathBuf>,
    pub black: Option<PathBuf>,
    pub frames: Option<PathBuf>,
    pub duration: f64,
}

impl ReportFiles {
    pub fn is_empty(&self) -> bool {
        self.silence.is_none() && self.black.is_none() && self.frames.is_none()
    }

    /// Name shown in output for a run that has no media file.
    pub fn label(&self) -> PathBuf {
        self.silence
            .as_ref()
            .or(self.black.as_ref())
            .or(self.frames.as_ref())
            .cloned()
            .unwrap_or_else(|| PathBuf::from("reports"))
    }

    fn read(path: &Option<PathBuf>) -> Result<String> {
        match path {
            Some(path) => read_report(path),
            None => Ok(String::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileResult {
    pub input: PathBuf,
    pub profile: String,
    #[serde(flatten)]
    pub report: DetectionReport,
}

pub struct FileProcessor<'a> {
    ffmpeg: &'a FfmpegWrapper,
    profile: &'a DetectionProfile,
    options: &'a ProcessingOptions,
}

impl<'a> FileProcessor<'a> {
    pub fn new(
        ffmpeg: &'a FfmpegWrapper,
        profile: &'a DetectionProfile,
        options: &'a ProcessingOptions,
    ) -> Self {
        Self {
            ffmpeg,
            profile,
            options,
        }
    }

    /// Runs the backend on `input` and detects breaks in its reports.
    pub async fn process(&self, input: &Path) -> Result<FileResult> {
        log_detection_start(
            &input.display().to_string(),
            &self.profile.name,
            self.options.mode.as_str(),
        );

        info!("Getting media info for: {}", input.display());
        let media = self.ffmpeg.get_media_info(input).await?;
        info!("Media duration: {:.3}s", media.duration);

        let mut chapters = self.options.chapters.clone();
        if self.options.use_container_chapters && !media.chapters.is_empty() {
            info!("Using {} container chapter mark(s)", media.chapters.len());
            chapters.extend(&media.chapters);
        }

        let reports = self.run_backend(input).await?;
        let report = self.detect(&reports, media.duration, &chapters)?;

        Ok(FileResult {
            input: input.to_path_buf(),
            profile: self.profile.name.clone(),
            report,
        })
    }

    /// Detects breaks in reports read from disk.
    pub fn process_reports(&self, files: &ReportFiles) -> Result<FileResult> {
        if files.is_empty() {
            return Err(Error::validation("No report files given"));
        }

        let label = files.label();
        log_detection_start(
            &label.display().to_string(),
            &self.profile.name,
            self.options.mode.as_str(),
        );
        info!("Reading reports from files");

        let reports = ReportSet {
            silence: ReportFiles::read(&files.silence)?,
            black: ReportFiles::read(&files.black)?,
            frames: ReportFiles::read(&files.frames)?,
            time_offset: self.options.window.offset(),
        };
        let report = self.detect(&reports, files.duration, &self.options.chapters)?;

        Ok(FileResult {
            input: label,
            profile: self.profile.name.clone(),
            report,
        })
    }

    fn detect(&self, reports: &ReportSet, duration: f64, chapters: &[f64]) -> Result<DetectionReport> {
        let params = self.profile.to_params(self.options.edge_margin, chapters);
        BreakDetector::new(params).run(self.options.mode, reports, duration)
    }

    /// Produces the reports the current mode needs, running the backend
    /// passes concurrently.
    async fn run_backend(&self, input: &Path) -> Result<ReportSet> {
        let window = &self.options.window;
        let backend = &self.profile.backend;

        match self.options.mode {
            DetectionMode::Fade => {
                info!("Running silence analysis");
                info!("Running black analysis");
                let frames = async {
                    if backend.frame_analysis {
                        info!("Running frame analysis");
                        self.ffmpeg.run_frame_report(input, window).await
                    } else {
                        Ok(String::new())
                    }
                };

                let (silence, black, frames) = tokio::try_join!(
                    self.ffmpeg.run_silence_report(input, backend, window),
                    self.ffmpeg.run_black_report(input, backend, window),
                    frames,
                )?;

                Ok(ReportSet {
                    silence,
                    black,
                    frames,
                    time_offset: window.offset(),
                })
            }
            DetectionMode::HardCut => {
                info!("Running silence analysis");
                info!("Running scene analysis");
                let (silence, frames) = tokio::try_join!(
                    self.ffmpeg.run_silence_report(input, backend, window),
                    self.ffmpeg
                        .run_scene_report(input, self.profile.scene_threshold(), window),
                )?;

                Ok(ReportSet {
                    silence,
                    black: String::new(),
                    frames,
                    time_offset: window.offset(),
                })
            }
        }
    }
}
