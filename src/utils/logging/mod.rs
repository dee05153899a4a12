//! Console logging for break detection
//!
//! Events go to stderr through [`CleanFormatter`], which keeps stdout free
//! for the detection results. The helpers keep the recurring pipeline
//! messages uniform so the formatter can recognise them.

mod formatter;
mod helpers;
mod text_utils;

pub use helpers::{
    log_detection_complete, log_detection_start, log_profile_selection, log_reports_parsed,
};

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::utils::{Error, Result};
use formatter::CleanFormatter;

/// Installs the global subscriber.
///
/// `level` is the default directive; `RUST_LOG` overrides it when set.
/// Unknown level names fall back to `info`. Fails if a subscriber was
/// already installed.
///
/// ```no_run
/// use ad_break_detector::utils::logging::setup_logging;
///
/// setup_logging("debug", true, false).expect("Failed to setup logging");
/// ```
pub fn setup_logging(level: &str, show_timestamps: bool, colored: bool) -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(false)
        .with_writer(std::io::stderr)
        .event_format(CleanFormatter::new(show_timestamps, colored));

    tracing_subscriber::registry()
        .with(env_filter(parse_level(level)))
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::validation(format!("Logging already initialised: {}", e)))
}

fn env_filter(default: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy()
}

fn parse_level(level: &str) -> Level {
    level.trim().parse::<Level>().unwrap_or(Level::INFO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level(" warn "), Level::WARN);
        assert_eq!(parse_level("verbose"), Level::INFO);
    }

    #[test]
    fn test_helpers_exported() {
        let _helpers = (
            log_detection_start,
            log_reports_parsed,
            log_detection_complete,
            log_profile_selection,
        );
    }
}
