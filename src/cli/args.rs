use super::output::{DisplayFields, OutputFormat};
use crate::analysis::DetectionMode;
use crate::utils::{Error, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ModeArg {
    /// Silence that coincides with a fade to black
    #[default]
    Fade,
    /// Scene changes inside silence
    HardCut,
}

impl From<ModeArg> for DetectionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Fade => DetectionMode::Fade,
            ModeArg::HardCut => DetectionMode::HardCut,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(name = "ad-break-detector")]
#[command(about = "Finds ad insertion points where silence meets a fade to black")]
#[command(long_about = "
Finds candidate ad insertion points in video files by correlating FFmpeg's
silencedetect, blackdetect and per-frame analysis output. Periods where the
audio is silent and the picture fades to black are matched, merged and
filtered away from the start and end of the media.

EXAMPLES:
  # Detect breaks with the default profile
  ad-break-detector -i episode.mkv

  # Whole directory, four files at a time, JSON output
  ad-break-detector -i ~/Videos/Shows/ --jobs 4 --format json

  # Only midpoints, one line, for scripting
  ad-break-detector -i episode.mkv --format plain --hide-start --hide-end

  # Use chapter marks from the container to rescue weak fades
  ad-break-detector -i episode.mkv -p sensitive --container-chapters

  # Scene cuts inside silence instead of fades
  ad-break-detector -i episode.mkv --mode hard-cut

  # Reuse reports captured earlier
  ad-break-detector --silence-report s.log --black-report b.log --duration 1320.5
")]
pub struct CliArgs {
    /// Input video file or directory (can be specified multiple times)
    #[arg(short, long, value_name = "PATH", action = clap::ArgAction::Append)]
    pub input: Vec<PathBuf>,

    /// Detection profile to use (defaults to detection.default_profile from the config)
    #[arg(short, long, value_name = "PROFILE")]
    pub profile: Option<String>,

    /// Kind of insertion point to look for
    #[arg(short, long, value_enum, default_value_t = ModeArg::Fade)]
    pub mode: ModeArg,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Start of the analysed window in seconds
    #[arg(long, value_name = "SECONDS")]
    pub start: Option<f64>,

    /// End of the analysed window in seconds
    #[arg(long, value_name = "SECONDS")]
    pub end: Option<f64>,

    /// Seconds at either end of the media where breaks are ignored
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub edge_margin: Option<f64>,

    /// Chapter mark in seconds used to confirm weak fades (can be specified multiple times)
    #[arg(
        long,
        value_name = "SECONDS",
        action = clap::ArgAction::Append,
        allow_negative_numbers = true
    )]
    pub chapter: Vec<f64>,

    /// Read chapter marks from the container
    #[arg(long)]
    pub container_chapters: bool,

    /// Previously captured silencedetect output
    #[arg(long, value_name = "FILE")]
    pub silence_report: Option<PathBuf>,

    /// Previously captured blackdetect output
    #[arg(long, value_name = "FILE")]
    pub black_report: Option<PathBuf>,

    /// Previously captured per-frame analysis output
    #[arg(long, value_name = "FILE")]
    pub frame_report: Option<PathBuf>,

    /// Media duration in seconds, required with report files
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f64>,

    /// Files analysed at once (0 uses all cores)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Do not print period starts
    #[arg(long)]
    pub hide_start: bool,

    /// Do not print period midpoints
    #[arg(long)]
    pub hide_midpoint: bool,

    /// Do not print period ends
    #[arg(long)]
    pub hide_end: bool,

    /// Do not print the decimal seconds block
    #[arg(long)]
    pub hide_decimal: bool,

    /// Do not print the MM:SS.mmm block
    #[arg(long)]
    pub hide_mmss: bool,

    /// List available detection profiles
    #[arg(long)]
    pub list_profiles: bool,

    /// Show detailed information about a specific profile
    #[arg(long, value_name = "PROFILE")]
    pub show_profile: Option<String>,

    /// Validate configuration file
    #[arg(long)]
    pub validate_config: bool,
}

impl CliArgs {
    pub fn get_log_level<'a>(&self, config_level: &'a str) -> &'a str {
        if self.debug {
            "debug"
        } else {
            config_level
        }
    }

    pub fn should_use_color(&self) -> bool {
        !self.no_color
    }

    pub fn is_info_command(&self) -> bool {
        self.list_profiles || self.show_profile.is_some() || self.validate_config
    }

    pub fn uses_report_files(&self) -> bool {
        self.silence_report.is_some() || self.black_report.is_some() || self.frame_report.is_some()
    }

    pub fn should_detect(&self) -> bool {
        !self.is_info_command() && (!self.input.is_empty() || self.uses_report_files())
    }

    pub fn display_fields(&self) -> DisplayFields {
        DisplayFields {
            start: !self.hide_start,
            midpoint: !self.hide_midpoint,
            end: !self.hide_end,
            decimal: !self.hide_decimal,
            mmss: !self.hide_mmss,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.uses_report_files() {
            if !self.input.is_empty() {
                return Err(Error::validation(
                    "Report files and --input cannot be combined",
                ));
            }
            match self.duration {
                Some(duration) if duration.is_finite() && duration > 0.0 => {}
                Some(duration) => {
                    return Err(Error::validation(format!(
                        "Invalid --duration: {} (must be positive)",
                        duration
                    )))
                }
                None => {
                    return Err(Error::validation(
                        "--duration is required when reading report files",
                    ))
                }
            }
            if self.container_chapters {
                return Err(Error::validation(
                    "--container-chapters needs an input file, not report files",
                ));
            }
        } else if self.duration.is_some() {
            return Err(Error::validation(
                "--duration is only used with report files",
            ));
        }

        for input in &self.input {
            if !input.exists() {
                return Err(Error::validation(format!(
                    "Input path does not exist: {}",
                    input.display()
                )));
            }
        }

        if let Some(margin) = self.edge_margin {
            if !(margin.is_finite() && margin >= 0.0) {
                return Err(Error::validation(format!(
                    "Invalid --edge-margin: {} (must not be negative)",
                    margin
                )));
            }
        }

        if let Some(mark) = self.chapter.iter().find(|mark| !(mark.is_finite() && **mark >= 0.0)) {
            return Err(Error::validation(format!("Invalid --chapter: {}", mark)));
        }

        if self.mode == ModeArg::HardCut && self.hide_midpoint {
            return Err(Error::validation(
                "--hide-midpoint leaves nothing to print in hard-cut mode",
            ));
        }

        Ok(())
    }
}
