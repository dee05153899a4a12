//! Rendering of detection results for stdout

use crate::analysis::{AdBreak, DetectionMode};
use crate::processing::FileResult;
use crate::utils::Result;
use clap::ValueEnum;

const NO_BREAKS: &str = "No suitable ad insertion points detected.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Labelled blocks in decimal seconds and MM:SS.mmm
    #[default]
    Text,
    /// Space-separated decimal seconds on one line
    Plain,
    /// One JSON document for all files
    Json,
}

/// Which values the text and plain renderers print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayFields {
    pub start: bool,
    pub midpoint: bool,
    pub end: bool,
    pub decimal: bool,
    pub mmss: bool,
}

impl Default for DisplayFields {
    fn default() -> Self {
        Self {
            start: true,
            midpoint: true,
            end: true,
            decimal: true,
            mmss: true,
        }
    }
}

impl DisplayFields {
    fn any_point(&self) -> bool {
        self.start || self.midpoint || self.end
    }

    fn selected<'a>(&self, period: &AdBreak) -> Vec<(&'a str, f64)> {
        let mut values = Vec::with_capacity(3);
        if self.start {
            values.push(("Start", period.start));
        }
        if self.midpoint {
            values.push(("Midpoint", period.midpoint));
        }
        if self.end {
            values.push(("End", period.end));
        }
        values
    }
}

/// Formats seconds as `MM:SS.mmm`; minutes grow past two digits.
pub fn seconds_to_mmss(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let millis = (seconds * 1000.0).round() as u64;
    let minutes = millis / 60_000;
    let rest = millis % 60_000;
    format!("{:02}:{:02}.{:03}", minutes, rest / 1000, rest % 1000)
}

pub fn render(results: &[FileResult], format: OutputFormat, fields: DisplayFields) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(results),
        OutputFormat::Plain => Ok(results
            .iter()
            .map(|result| render_plain(result, fields))
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Text => {
            let with_header = results.len() > 1;
            Ok(results
                .iter()
                .map(|result| render_text(result, fields, with_header))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

fn render_json(results: &[FileResult]) -> Result<String> {
    let json = match results {
        [single] => serde_json::to_string_pretty(single)?,
        _ => serde_json::to_string_pretty(results)?,
    };
    Ok(json)
}

/// Values on one line; an empty result renders as an empty line.
pub fn render_plain(result: &FileResult, fields: DisplayFields) -> String {
    let values: Vec<String> = match result.report.mode {
        DetectionMode::Fade => result
            .report
            .breaks
            .iter()
            .flat_map(|period| fields.selected(period))
            .map(|(_, value)| format!("{:.3}", value))
            .collect(),
        DetectionMode::HardCut if fields.midpoint => result
            .report
            .hard_cuts
            .iter()
            .map(|point| format!("{:.3}", point))
            .collect(),
        DetectionMode::HardCut => Vec::new(),
    };
    values.join(" ")
}

pub fn render_text(result: &FileResult, fields: DisplayFields, with_header: bool) -> String {
    let mut out = String::new();

    if with_header {
        out.push_str(&format!("File: {}\n", result.input.display()));
    }
    out.push_str(&format!("Video duration: {:.3}\n", result.report.duration));

    if result.report.is_empty() {
        out.push_str(NO_BREAKS);
        out.push('\n');
        return out;
    }

    match result.report.mode {
        DetectionMode::Fade => {
            for period in &result.report.breaks {
                out.push_str("Potential ad insertion period:\n");
                write_blocks(&mut out, &fields.selected(period), fields);
            }
        }
        DetectionMode::HardCut => {
            // a cut is a single point, reported in the midpoint slot
            let point_fields = DisplayFields {
                start: false,
                end: false,
                ..fields
            };
            for point in &result.report.hard_cuts {
                out.push_str("Potential ad insertion point:\n");
                let values = if point_fields.midpoint {
                    vec![("Point", *point)]
                } else {
                    Vec::new()
                };
                write_blocks(&mut out, &values, point_fields);
            }
        }
    }

    out
}

fn write_blocks(out: &mut String, values: &[(&str, f64)], fields: DisplayFields) {
    if values.is_empty() || !fields.any_point() {
        return;
    }

    if fields.decimal {
        out.push_str("\tDecimal seconds:\n");
        for (label, value) in values {
            out.push_str(&format!("\t\t{}: {:.3}\n", label, value));
        }
        out.push('\n');
    }

    if fields.mmss {
        out.push_str("\tMM:SS.mmm\n");
        for (label, value) in values {
            out.push_str(&format!("\t\t{}: {}\n", label, seconds_to_mmss(*value)));
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DetectionReport;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn fade_result(breaks: Vec<AdBreak>) -> FileResult {
        FileResult {
            input: PathBuf::from("show.mkv"),
            profile: "sensitive".to_string(),
            report: DetectionReport {
                mode: DetectionMode::Fade,
                duration: 1320.5,
                breaks,
                ..DetectionReport::default()
            },
        }
    }

    fn period(start: f64, end: f64) -> AdBreak {
        AdBreak {
            start,
            midpoint: (start + end) / 2.0,
            end,
        }
    }

    #[test]
    fn test_seconds_to_mmss() {
        assert_eq!(seconds_to_mmss(0.0), "00:00.000");
        assert_eq!(seconds_to_mmss(65.25), "01:05.250");
        assert_eq!(seconds_to_mmss(59.9996), "01:00.000");
        assert_eq!(seconds_to_mmss(6000.0), "100:00.000");
    }

    #[test]
    fn test_render_text_period() {
        let result = fade_result(vec![period(600.0, 601.0)]);
        let text = render_text(&result, DisplayFields::default(), false);

        let expected = "Video duration: 1320.500\n\
                        Potential ad insertion period:\n\
                        \tDecimal seconds:\n\
                        \t\tStart: 600.000\n\
                        \t\tMidpoint: 600.500\n\
                        \t\tEnd: 601.000\n\
                        \n\
                        \tMM:SS.mmm\n\
                        \t\tStart: 10:00.000\n\
                        \t\tMidpoint: 10:00.500\n\
                        \t\tEnd: 10:01.000\n\
                        \n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_text_empty() {
        let text = render_text(&fade_result(Vec::new()), DisplayFields::default(), true);
        assert_eq!(
            text,
            "File: show.mkv\nVideo duration: 1320.500\nNo suitable ad insertion points detected.\n"
        );
    }

    #[test]
    fn test_render_text_multiple_files() {
        let mut second = fade_result(Vec::new());
        second.input = PathBuf::from("movie.mkv");
        let results = vec![fade_result(vec![period(10.0, 12.0)]), second];
        let fields = DisplayFields {
            mmss: false,
            ..DisplayFields::default()
        };

        let text = render(&results, OutputFormat::Text, fields).unwrap();
        assert_eq!(
            text,
            "File: show.mkv\n\
             Video duration: 1320.500\n\
             Potential ad insertion period:\n\
             \tDecimal seconds:\n\
             \t\tStart: 10.000\n\
             \t\tMidpoint: 11.000\n\
             \t\tEnd: 12.000\n\
             \n\
             \n\
             File: movie.mkv\n\
             Video duration: 1320.500\n\
             No suitable ad insertion points detected.\n"
        );
    }

    #[test]
    fn test_render_text_hidden_fields() {
        let fields = DisplayFields {
            start: false,
            end: false,
            mmss: false,
            ..DisplayFields::default()
        };
        let text = render_text(&fade_result(vec![period(10.0, 12.0)]), fields, false);
        assert_eq!(
            text,
            "Video duration: 1320.500\n\
             Potential ad insertion period:\n\
             \tDecimal seconds:\n\
             \t\tMidpoint: 11.000\n\
             \n"
        );
    }

    #[test]
    fn test_render_plain() {
        let result = fade_result(vec![period(10.0, 12.0), period(300.1, 300.3)]);
        assert_eq!(
            render_plain(&result, DisplayFields::default()),
            "10.000 11.000 12.000 300.100 300.200 300.300"
        );

        let midpoints = DisplayFields {
            start: false,
            end: false,
            ..DisplayFields::default()
        };
        assert_eq!(render_plain(&result, midpoints), "11.000 300.200");
        assert_eq!(render_plain(&fade_result(Vec::new()), midpoints), "");
    }

    #[test]
    fn test_render_hard_cuts() {
        let result = FileResult {
            input: PathBuf::from("show.mkv"),
            profile: "classic".to_string(),
            report: DetectionReport {
                mode: DetectionMode::HardCut,
                duration: 100.0,
                hard_cuts: vec![42.0],
                ..DetectionReport::default()
            },
        };

        assert_eq!(render_plain(&result, DisplayFields::default()), "42.000");

        let fields = DisplayFields {
            mmss: false,
            ..DisplayFields::default()
        };
        assert_eq!(
            render_text(&result, fields, false),
            "Video duration: 100.000\n\
             Potential ad insertion point:\n\
             \tDecimal seconds:\n\
             \t\tPoint: 42.000\n\
             \n"
        );
    }

    #[test]
    fn test_render_json() {
        let result = fade_result(vec![period(10.0, 12.0)]);
        let json = render(&[result], OutputFormat::Json, DisplayFields::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["input"], "show.mkv");
        assert_eq!(value["mode"], "fade");
        assert_eq!(value["breaks"][0]["midpoint"], 11.0);
    }
}
