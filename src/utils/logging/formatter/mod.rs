//! Event formatter producing the tree-shaped console output
//!
//! Every event becomes `[HH:MM:SS] <prefix> <LEVEL> <message>`, where the
//! timestamp is optional, the prefix reflects the processing level guessed
//! from the message and INFO carries no level label.

pub mod filters;
pub mod levels;
pub mod styling;

use chrono::Local;
use console::style;
use std::borrow::Cow;
use std::fmt::{self as std_fmt, Debug};
use tracing::Level;
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};

use crate::utils::logging::text_utils;
use filters::should_show_message;
use levels::{determine_processing_level, ProcessingLevel};
use styling::{format_level, get_tree_prefix, style_message};

/// Console width the formatted lines are wrapped to.
const LINE_WIDTH: usize = 120;

/// Width of `"[HH:MM:SS] "`.
const TIMESTAMP_WIDTH: usize = 11;

/// Width of the tree prefix and the space after it.
const PREFIX_WIDTH: usize = 2;

pub struct CleanFormatter {
    show_timestamps: bool,
    use_color: bool,
}

impl CleanFormatter {
    pub fn new(show_timestamps: bool, use_color: bool) -> Self {
        Self {
            show_timestamps,
            use_color,
        }
    }

    fn format_message(&self, message: &str, metadata_level: &Level) -> String {
        let level = determine_processing_level(message);
        let label = format_level(metadata_level, self.use_color);

        // the styled label contains escape codes, so measure the plain one
        let label_width = match format_level(metadata_level, false).len() {
            0 => 0,
            n => n + 1,
        };
        let timestamp_width = if self.show_timestamps { TIMESTAMP_WIDTH } else { 0 };
        let indent = timestamp_width + PREFIX_WIDTH + label_width;

        let body = style_message(&shorten(message, level), level, self.use_color);
        let wrapped = text_utils::wrap_text(&body, LINE_WIDTH.saturating_sub(indent));

        let mut lines = wrapped.lines();
        let first = lines.next().unwrap_or_default();
        let mut out = if label.is_empty() {
            format!("{} {}", get_tree_prefix(level), first)
        } else {
            format!("{} {} {}", get_tree_prefix(level), label, first)
        };

        let padding = " ".repeat(indent);
        for line in lines {
            out.push('\n');
            out.push_str(&padding);
            out.push_str(line);
        }
        out
    }
}

/// Drops boilerplate from the recurring pipeline messages.
fn shorten(message: &str, level: ProcessingLevel) -> Cow<'_, str> {
    match level {
        ProcessingLevel::Stage => match message.strip_prefix("Starting ") {
            Some(rest) if rest.contains("detection") => Cow::Borrowed(rest),
            _ => Cow::Borrowed(message),
        },
        ProcessingLevel::Step => {
            if let Some(counts) = message.strip_prefix("Reports parsed: ") {
                Cow::Owned(format!("Parsed {}", counts))
            } else if message.starts_with("Getting media info for:") {
                Cow::Borrowed("Reading media duration")
            } else {
                Cow::Borrowed(message)
            }
        }
        _ => Cow::Borrowed(message),
    }
}

impl<S, N> FormatEvent<S, N> for CleanFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std_fmt::Result {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        if !should_show_message(&visitor.message) {
            return Ok(());
        }

        if self.show_timestamps {
            let now = Local::now().format("%H:%M:%S").to_string();
            if self.use_color {
                write!(writer, "[{}] ", style(now).dim())?;
            } else {
                write!(writer, "[{}] ", now)?;
            }
        }

        writeln!(
            writer,
            "{}",
            self.format_message(&visitor.message, event.metadata().level())
        )
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}
