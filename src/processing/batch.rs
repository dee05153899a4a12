use super::{FileProcessor, FileResult, ProcessingOptions};
use crate::{
    config::DetectionProfile,
    utils::{Error, FfmpegWrapper},
};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Successful results in input order
    pub results: Vec<FileResult>,
    pub failures: Vec<(PathBuf, Error)>,
}

impl BatchOutcome {
    pub fn all_failed(&self) -> bool {
        self.results.is_empty() && !self.failures.is_empty()
    }
}

/// Runs detection on many files with a bounded number in flight.
pub struct BatchRunner<'a> {
    ffmpeg: &'a FfmpegWrapper,
    profile: &'a DetectionProfile,
    options: &'a ProcessingOptions,
    jobs: usize,
}

impl<'a> BatchRunner<'a> {
    /// `max_jobs == 0` uses the available parallelism.
    pub fn new(
        ffmpeg: &'a FfmpegWrapper,
        profile: &'a DetectionProfile,
        options: &'a ProcessingOptions,
        max_jobs: usize,
    ) -> Self {
        Self {
            ffmpeg,
            profile,
            options,
            jobs: resolve_jobs(max_jobs),
        }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub async fn run(&self, inputs: &[PathBuf]) -> BatchOutcome {
        info!(
            "Found {} video file(s) to process ({} parallel job(s))",
            inputs.len(),
            self.jobs
        );

        let progress = progress_bar(inputs.len());
        let processor = FileProcessor::new(self.ffmpeg, self.profile, self.options);

        let mut finished: Vec<(usize, PathBuf, crate::utils::Result<FileResult>)> =
            stream::iter(inputs.iter().enumerate())
                .map(|(index, input)| {
                    let processor = &processor;
                    let progress = &progress;
                    async move {
                        let result = processor.process(input).await;
                        if let Some(bar) = progress {
                            bar.inc(1);
                            bar.set_message(file_name(input));
                        }
                        (index, input.clone(), result)
                    }
                })
                .buffer_unordered(self.jobs)
                .collect()
                .await;

        if let Some(bar) = progress {
            bar.finish_and_clear();
        }

        finished.sort_by_key(|(index, _, _)| *index);

        let mut outcome = BatchOutcome::default();
        for (_, input, result) in finished {
            match result {
                Ok(file_result) => outcome.results.push(file_result),
                Err(e) => {
                    warn!("Failed to process {}: {}", input.display(), e);
                    outcome.failures.push((input, e));
                }
            }
        }

        if inputs.len() > 1 {
            info!(
                "Processing complete: {} successful, {} failed",
                outcome.results.len(),
                outcome.failures.len()
            );
        }

        outcome
    }
}

fn resolve_jobs(max_jobs: usize) -> usize {
    if max_jobs > 0 {
        return max_jobs;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Only shown when there is more than one file.
fn progress_bar(total: usize) -> Option<ProgressBar> {
    if total < 2 {
        return None;
    }

    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} | {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ "),
    );
    Some(bar)
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::DetectionMode,
        config::{Config, ProfileManager},
        utils::AnalysisWindow,
    };
    use pretty_assertions::assert_eq;
    use std::path::Path;

    #[test]
    fn test_resolve_jobs() {
        assert_eq!(resolve_jobs(3), 3);
        assert!(resolve_jobs(0) >= 1);
    }

    #[test]
    fn test_progress_bar_only_for_batches() {
        assert!(progress_bar(0).is_none());
        assert!(progress_bar(1).is_none());
        assert!(progress_bar(4).is_some());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(Path::new("/media/show/episode.mkv")), "episode.mkv");
    }

    #[tokio::test]
    async fn test_batch_collects_failures() {
        let mut manager = ProfileManager::new();
        manager.load_profiles(Config::default().profiles).unwrap();
        let profile = manager.get_profile("sensitive").unwrap();
        let ffmpeg = FfmpegWrapper::new(
            "/nonexistent/ffmpeg".to_string(),
            "/nonexistent/ffprobe".to_string(),
        );
        let options = ProcessingOptions {
            mode: DetectionMode::Fade,
            window: AnalysisWindow::full(),
            edge_margin: 1.0,
            chapters: Vec::new(),
            use_container_chapters: false,
        };

        let runner = BatchRunner::new(&ffmpeg, profile, &options, 2);
        assert_eq!(runner.jobs(), 2);

        let inputs = vec![PathBuf::from("a.mkv"), PathBuf::from("b.mkv")];
        let outcome = runner.run(&inputs).await;

        assert!(outcome.all_failed());
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.failures[0].0, PathBuf::from("a.mkv"));
        assert_eq!(outcome.failures[1].0, PathBuf::from("b.mkv"));
    }
}
