use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use ad_break_detector::{
    cli::{handle_commands, render, CliArgs},
    config::{Config, DetectionProfile, ProfileManager},
    processing::{BatchRunner, FileProcessor, FileResult, ProcessingOptions, ReportFiles},
    utils::{collect_inputs, logging::log_profile_selection, setup_logging, AnalysisWindow, FfmpegWrapper},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if !args.is_info_command() && !args.should_detect() {
        use clap::CommandFactory;
        let mut cmd = CliArgs::command();
        cmd.print_help().context("Failed to print help")?;
        println!();
        return Ok(());
    }

    args.validate()?;

    let config = Config::load_with_fallback(args.config.as_deref())
        .context("Failed to load configuration")?;

    setup_logging(
        args.get_log_level(&config.logging.level),
        config.logging.show_timestamps,
        config.logging.colored_output && args.should_use_color(),
    )?;

    if handle_commands(&args, &config).await? {
        return Ok(());
    }

    let mut profile_manager = ProfileManager::new();
    profile_manager.load_profiles(config.profiles.clone())?;
    let profile = select_profile(&args, &config, &profile_manager)?;

    let options = ProcessingOptions {
        mode: args.mode.into(),
        window: AnalysisWindow::between(args.start, args.end)?,
        edge_margin: args.edge_margin.unwrap_or(config.detection.edge_margin),
        chapters: args.chapter.clone(),
        use_container_chapters: args.container_chapters || config.detection.use_container_chapters,
    };

    let ffmpeg = FfmpegWrapper::new(config.tools.ffmpeg.clone(), config.tools.ffprobe.clone());

    let results = if args.uses_report_files() {
        vec![detect_from_reports(&args, &ffmpeg, profile, &options)?]
    } else {
        detect_from_media(&args, &config, &ffmpeg, profile, &options).await?
    };

    let output = render(&results, args.format, args.display_fields())?;
    println!("{}", output.trim_end_matches('\n'));

    Ok(())
}

fn select_profile<'a>(
    args: &CliArgs,
    config: &Config,
    profile_manager: &'a ProfileManager,
) -> anyhow::Result<&'a DetectionProfile> {
    let (name, reason) = match &args.profile {
        Some(name) => (name.as_str(), "from command line"),
        None => (config.detection.default_profile.as_str(), "configured default"),
    };
    let profile = profile_manager.require_profile(name)?;
    log_profile_selection(name, reason);
    Ok(profile)
}

fn detect_from_reports(
    args: &CliArgs,
    ffmpeg: &FfmpegWrapper,
    profile: &DetectionProfile,
    options: &ProcessingOptions,
) -> anyhow::Result<FileResult> {
    let files = ReportFiles {
        silence: args.silence_report.clone(),
        black: args.black_report.clone(),
        frames: args.frame_report.clone(),
        duration: args.duration.unwrap_or_default(),
    };

    let processor = FileProcessor::new(ffmpeg, profile, options);
    let result = processor
        .process_reports(&files)
        .with_context(|| format!("Failed to analyse reports for {}", files.label().display()))?;
    Ok(result)
}

async fn detect_from_media(
    args: &CliArgs,
    config: &Config,
    ffmpeg: &FfmpegWrapper,
    profile: &DetectionProfile,
    options: &ProcessingOptions,
) -> anyhow::Result<Vec<FileResult>> {
    ffmpeg
        .check_availability()
        .await
        .context("FFmpeg tools not available")?;

    let inputs = collect_inputs(&args.input)?;
    if inputs.is_empty() {
        bail!("No video files found in the given inputs");
    }

    let jobs = args.jobs.unwrap_or(config.detection.max_parallel_jobs);
    let runner = BatchRunner::new(ffmpeg, profile, options, jobs);
    let outcome = runner.run(&inputs).await;

    if !outcome.failures.is_empty() {
        info!("Failed files:");
        for (path, error) in &outcome.failures {
            info!("  - {}: {}", path.display(), error);
        }
    }

    if outcome.all_failed() {
        let (path, error) = outcome
            .failures
            .into_iter()
            .next()
            .context("No files were processed")?;
        if inputs.len() == 1 {
            return Err(error).with_context(|| format!("Failed to process {}", path.display()));
        }
        bail!("All {} files failed to process", inputs.len());
    }

    Ok(outcome.results)
}
