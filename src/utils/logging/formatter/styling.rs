//! Styling and formatting for log messages

use console::style;
use tracing::Level;

use super::levels::ProcessingLevel;

/// Level label shown before a message; INFO is hidden for cleaner output.
pub fn format_level(level: &Level, use_color: bool) -> String {
    let label = match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARN ",
        Level::INFO => return String::new(),
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    };

    if !use_color {
        return label.to_string();
    }

    match *level {
        Level::ERROR => style(label).red().bold().to_string(),
        Level::WARN => style(label).yellow().to_string(),
        Level::DEBUG => style(label).blue().to_string(),
        _ => style(label).magenta().to_string(),
    }
}

pub fn get_tree_prefix(level: ProcessingLevel) -> &'static str {
    match level {
        ProcessingLevel::Root => "▶",
        ProcessingLevel::Stage => "●",
        ProcessingLevel::Step | ProcessingLevel::Detail => " ",
    }
}

/// Applies styling to message content based on processing level
pub fn style_message(message: &str, level: ProcessingLevel, use_color: bool) -> String {
    if !use_color {
        return match level {
            ProcessingLevel::Root => message.to_uppercase(),
            _ => message.to_string(),
        };
    }

    match level {
        ProcessingLevel::Root => style(message).bold().cyan().to_string(),
        ProcessingLevel::Stage => style(message).bold().green().to_string(),
        ProcessingLevel::Step => style(message).cyan().to_string(),
        ProcessingLevel::Detail => style(message).dim().to_string(),
    }
}
