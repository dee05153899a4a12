//! Parsing of the text reports emitted by the FFmpeg analysis filters
//!
//! Three report kinds are understood:
//! - `silencedetect` output (`silence_start:` / `silence_end:` lines)
//! - `blackdetect` output (`black_start:` and `black_end:` on one line)
//! - combined frame metadata from `metadata=print,blackframe,showinfo` plus
//!   `astats`, interleaved in a single stream
//!
//! A line whose numeric field cannot be read is skipped and recorded as a
//! [`LineError`]; it never aborts the rest of the parse.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, trace};

use super::frames::{FrameIndex, FrameSample};
use super::interval::{BlackInterval, Interval, SilenceInterval, SourcedInterval};

/// Loudness readings attach to a frame only when closer than this.
pub const LOUDNESS_MATCH_TOLERANCE: f64 = 0.02;

const SILENCE_TAG: &str = "[silencedetect @";
const BLACKFRAME_TAG: &str = "[Parsed_blackframe";
const SHOWINFO_TAG: &str = "[Parsed_showinfo";
const ASTATS_TAG: &str = "[Parsed_astats";

static SILENCE_START_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"silence_start:\s*([^\s|]*)").unwrap());

static SILENCE_END_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"silence_end:\s*([^\s|]*)").unwrap());

static BLACK_START_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"black_start:\s*(\S*)").unwrap());

static BLACK_END_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r" black_end:\s*(\S*)").unwrap());

static SCENE_SCORE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"lavfi\.scene_score=(\S*)").unwrap());

static PBLACK_METADATA_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"lavfi\.blackframe\.pblack=(\S*)").unwrap());

static PBLACK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r" pblack:\s*(\S*)").unwrap());

static PTS_TIME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"pts_time:\s*(\S*)").unwrap());

static RMS_LEVEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"RMS level dB:\s*(\S*)").unwrap());

/// A recognised report line, with times relative to the analysed window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportLine {
    SilenceStart(f64),
    SilenceEnd(f64),
    BlackRegion { start: f64, end: f64 },
    SceneScore(f64),
    BlackPercentage(i32),
    FrameBoundary(f64),
    Loudness { pts_time: f64, rms_db: f64 },
}

/// A marker was present but its value could not be read.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {field} value '{value}'")]
pub struct FieldError {
    pub field: &'static str,
    pub value: String,
}

/// A skipped report line.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {source}")]
pub struct LineError {
    pub line: usize,
    #[source]
    pub source: FieldError,
}

/// Records extracted from one report plus the lines that had to be skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome<T> {
    pub records: Vec<T>,
    pub skipped: Vec<LineError>,
}

impl<T> ParseOutcome<T> {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn skip(&mut self, line: usize, source: FieldError) {
        trace!("Skipping report line {}: {}", line, source);
        self.skipped.push(LineError { line, source });
    }
}

fn capture<'a>(regex: &Regex, line: &'a str) -> &'a str {
    regex
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or("")
}

fn parse_time(regex: &Regex, line: &str, field: &'static str) -> Result<f64, FieldError> {
    let raw = capture(regex, line);
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FieldError {
            field,
            value: raw.to_string(),
        })
}

fn parse_value(regex: &Regex, line: &str, field: &'static str) -> Result<f64, FieldError> {
    let raw = capture(regex, line);
    raw.parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
        .ok_or_else(|| FieldError {
            field,
            value: raw.to_string(),
        })
}

fn parse_percentage(value: f64, raw: &str) -> Result<i32, FieldError> {
    if value.is_finite() {
        Ok(value.round().clamp(0.0, 100.0) as i32)
    } else {
        Err(FieldError {
            field: "pblack",
            value: raw.to_string(),
        })
    }
}

/// Reads a `silencedetect` line.
pub fn classify_silence_line(line: &str) -> Result<Option<ReportLine>, FieldError> {
    if !line.contains(SILENCE_TAG) {
        return Ok(None);
    }

    if line.contains("silence_start:") {
        parse_time(&SILENCE_START_REGEX, line, "silence_start").map(|t| Some(ReportLine::SilenceStart(t)))
    } else if line.contains("silence_end:") {
        parse_time(&SILENCE_END_REGEX, line, "silence_end").map(|t| Some(ReportLine::SilenceEnd(t)))
    } else {
        Ok(None)
    }
}

/// Reads a `blackdetect` line; both markers must be on the same line.
pub fn classify_black_line(line: &str) -> Result<Option<ReportLine>, FieldError> {
    if !line.contains("black_start:") || !line.contains(" black_end:") {
        return Ok(None);
    }

    let start = parse_time(&BLACK_START_REGEX, line, "black_start")?;
    let end = parse_time(&BLACK_END_REGEX, line, "black_end")?;
    Ok(Some(ReportLine::BlackRegion { start, end }))
}

/// Reads a frame metadata line. One line may carry several markers; they are
/// returned in the order they must be applied.
pub fn classify_frame_line(line: &str) -> Vec<Result<ReportLine, FieldError>> {
    let mut found = Vec::new();

    if line.contains("lavfi.scene_score=") {
        found.push(parse_value(&SCENE_SCORE_REGEX, line, "scene_score").map(ReportLine::SceneScore));
    }

    if line.contains("lavfi.blackframe.pblack=") {
        let raw = capture(&PBLACK_METADATA_REGEX, line);
        found.push(
            parse_value(&PBLACK_METADATA_REGEX, line, "pblack")
                .and_then(|v| parse_percentage(v, raw))
                .map(ReportLine::BlackPercentage),
        );
    }

    if line.contains(BLACKFRAME_TAG) && line.contains(" pblack:") {
        let raw = capture(&PBLACK_REGEX, line);
        found.push(
            raw.parse::<i32>()
                .map_err(|_| FieldError {
                    field: "pblack",
                    value: raw.to_string(),
                })
                .and_then(|v| parse_percentage(v as f64, raw))
                .map(ReportLine::BlackPercentage),
        );
    }

    if line.contains(SHOWINFO_TAG) && line.contains("pts_time:") {
        found.push(parse_time(&PTS_TIME_REGEX, line, "pts_time").map(ReportLine::FrameBoundary));
    }

    if line.contains(ASTATS_TAG) && line.contains("RMS level dB:") && line.contains("pts_time:") {
        found.push(parse_time(&PTS_TIME_REGEX, line, "pts_time").and_then(|pts_time| {
            parse_value(&RMS_LEVEL_REGEX, line, "rms_level")
                .map(|rms_db| ReportLine::Loudness { pts_time, rms_db })
        }));
    }

    found
}

/// Converts report text into intervals and frame samples.
///
/// All reported times are relative to the analysed window; `time_offset`
/// (the window start) is added to produce absolute media times.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportParser {
    time_offset: f64,
}

impl ReportParser {
    pub fn new(time_offset: f64) -> Self {
        Self { time_offset }
    }

    pub fn time_offset(&self) -> f64 {
        self.time_offset
    }

    /// Pairs silence start/end lines into intervals at least `min_duration` long.
    pub fn parse_silence(&self, report: &str, min_duration: f64) -> ParseOutcome<SilenceInterval> {
        let mut outcome = ParseOutcome::new();
        let mut pending_start: Option<f64> = None;

        for (index, line) in report.lines().enumerate() {
            match classify_silence_line(line) {
                Ok(Some(ReportLine::SilenceStart(t))) => {
                    pending_start = Some(self.time_offset + t);
                }
                Ok(Some(ReportLine::SilenceEnd(t))) => {
                    if let Some(start) = pending_start.take() {
                        let end = self.time_offset + t;
                        if end - start >= min_duration {
                            if let Some(interval) = Interval::try_new(start, end) {
                                outcome.records.push(SourcedInterval::silence(interval));
                            }
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => outcome.skip(index + 1, e),
            }
        }

        if let Some(start) = pending_start {
            debug!("Discarding unterminated silence starting at {:.3}s", start);
        }

        outcome
    }

    /// Reads black regions at least `min_duration` long.
    pub fn parse_black(&self, report: &str, min_duration: f64) -> ParseOutcome<BlackInterval> {
        let mut outcome = ParseOutcome::new();

        for (index, line) in report.lines().enumerate() {
            match classify_black_line(line) {
                Ok(Some(ReportLine::BlackRegion { start, end })) => {
                    let start = self.time_offset + start;
                    let end = self.time_offset + end;
                    if end - start >= min_duration {
                        if let Some(interval) = Interval::try_new(start, end) {
                            outcome.records.push(SourcedInterval::black(interval));
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => outcome.skip(index + 1, e),
            }
        }

        outcome
    }

    /// Accumulates per-frame metadata into samples, finalising one sample at
    /// each frame boundary marker. Loudness lines are matched back onto an
    /// already emitted sample. The returned samples are sorted by timestamp.
    pub fn parse_frames(&self, report: &str) -> ParseOutcome<FrameSample> {
        let mut outcome = ParseOutcome::new();
        let mut current = FrameSample::default();
        let mut by_time = TimestampIndex::default();

        for (index, line) in report.lines().enumerate() {
            for classified in classify_frame_line(line) {
                match classified {
                    Ok(ReportLine::SceneScore(score)) => {
                        current = current.with_scene_score(score);
                    }
                    Ok(ReportLine::BlackPercentage(pct)) => {
                        current.black_percentage = pct;
                    }
                    Ok(ReportLine::FrameBoundary(t)) => {
                        let mut sample = std::mem::take(&mut current);
                        sample.timestamp = self.time_offset + t;
                        by_time.insert(sample.timestamp, outcome.records.len());
                        outcome.records.push(sample);
                    }
                    Ok(ReportLine::Loudness { pts_time, rms_db }) => {
                        let absolute = self.time_offset + pts_time;
                        if let Some(position) = by_time.first_within(
                            &outcome.records,
                            absolute,
                            LOUDNESS_MATCH_TOLERANCE,
                        ) {
                            outcome.records[position].loudness_db = rms_db;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => outcome.skip(index + 1, e),
                }
            }
        }

        outcome.records = FrameIndex::new(outcome.records).into_samples();
        outcome
    }
}

/// Emitted samples keyed by timestamp (microseconds) then emission order.
#[derive(Debug, Default)]
struct TimestampIndex {
    keys: BTreeSet<(i64, usize)>,
}

impl TimestampIndex {
    fn key(timestamp: f64) -> i64 {
        (timestamp * 1_000_000.0).round() as i64
    }

    fn insert(&mut self, timestamp: f64, position: usize) {
        self.keys.insert((Self::key(timestamp), position));
    }

    /// Earliest emitted sample strictly closer than `tolerance` to `timestamp`.
    fn first_within(&self, samples: &[FrameSample], timestamp: f64, tolerance: f64) -> Option<usize> {
        let low = Self::key(timestamp - tolerance) - 1;
        let high = Self::key(timestamp + tolerance) + 1;

        self.keys
            .range((low, 0)..=(high, usize::MAX))
            .map(|&(_, position)| position)
            .filter(|&position| (samples[position].timestamp - timestamp).abs() < tolerance)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SILENCE_REPORT: &str = "\
[silencedetect @ 0x55d5c8e0] silence_start: 10
[silencedetect @ 0x55d5c8e0] silence_end: 10.2 | silence_duration: 0.2
size=N/A time=00:00:12.00 bitrate=N/A speed= 120x
[silencedetect @ 0x55d5c8e0] silence_start: 42.5
[silencedetect @ 0x55d5c8e0] silence_end: 42.503 | silence_duration: 0.003
[silencedetect @ 0x55d5c8e0] silence_start: 99.1
";

    const BLACK_REPORT: &str = "\
[blackdetect @ 0x7f] black_start:10.1 black_end:10.3 black_duration:0.2
[blackdetect @ 0x7f] black_start:50 black_end:50.004 black_duration:0.004
[blackdetect @ 0x7f] black_start:oops black_end:61 black_duration:1
";

    fn bounds(intervals: &[SourcedInterval]) -> Vec<(f64, f64)> {
        intervals
            .iter()
            .map(|i| (i.interval.start(), i.interval.end()))
            .collect()
    }

    #[test]
    fn test_classify_silence_lines() {
        assert_eq!(
            classify_silence_line("[silencedetect @ 0x1] silence_start: 3.5"),
            Ok(Some(ReportLine::SilenceStart(3.5)))
        );
        assert_eq!(
            classify_silence_line("[silencedetect @ 0x1] silence_end: 4|silence_duration: 0.5"),
            Ok(Some(ReportLine::SilenceEnd(4.0)))
        );
        assert_eq!(classify_silence_line("silence_start: 3.5"), Ok(None));
        assert!(classify_silence_line("[silencedetect @ 0x1] silence_start: abc").is_err());
        assert!(classify_silence_line("[silencedetect @ 0x1] silence_end:").is_err());
    }

    #[test]
    fn test_parse_silence() {
        let outcome = ReportParser::default().parse_silence(SILENCE_REPORT, 0.005);
        assert_eq!(bounds(&outcome.records), vec![(10.0, 10.2)]);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_parse_silence_applies_offset() {
        let outcome = ReportParser::new(600.0).parse_silence(SILENCE_REPORT, 0.005);
        assert_eq!(bounds(&outcome.records), vec![(610.0, 610.2)]);
    }

    #[test]
    fn test_silence_end_without_start_is_ignored() {
        let report = "[silencedetect @ 0x1] silence_end: 5 | silence_duration: 1\n";
        let outcome = ReportParser::default().parse_silence(report, 0.0);
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn test_malformed_silence_line_is_skipped() {
        let report = "\
[silencedetect @ 0x1] silence_start: 1.0
[silencedetect @ 0x1] silence_end: 1.x5 | silence_duration: 0.5
[silencedetect @ 0x1] silence_end: 2.0 | silence_duration: 1.0
";
        let outcome = ReportParser::default().parse_silence(report, 0.5);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].line, 2);
        assert_eq!(outcome.skipped[0].source.field, "silence_end");
        // the pending start survives the broken line
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].interval, Interval::new(1.0, 2.0));
    }

    #[test]
    fn test_parse_black() {
        let outcome = ReportParser::default().parse_black(BLACK_REPORT, 0.005);
        assert_eq!(bounds(&outcome.records), vec![(10.1, 10.3)]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].line, 3);

        let strict = ReportParser::default().parse_black(BLACK_REPORT, 0.5);
        assert!(strict.records.is_empty());
    }

    #[test]
    fn test_classify_frame_line_markers() {
        assert_eq!(
            classify_frame_line("[Parsed_metadata_0 @ 0x1] lavfi.scene_score=0.412"),
            vec![Ok(ReportLine::SceneScore(0.412))]
        );
        assert_eq!(
            classify_frame_line("[Parsed_metadata_0 @ 0x1] lavfi.blackframe.pblack=96.6"),
            vec![Ok(ReportLine::BlackPercentage(97))]
        );
        assert_eq!(
            classify_frame_line("[Parsed_blackframe_1 @ 0x1] frame:12 pblack:99 pts:384 t:0.4 type:P"),
            vec![Ok(ReportLine::BlackPercentage(99))]
        );
        assert_eq!(
            classify_frame_line("[Parsed_showinfo_2 @ 0x1] n:  12 pts:  384 pts_time:0.4 duration:1"),
            vec![Ok(ReportLine::FrameBoundary(0.4))]
        );
        assert_eq!(
            classify_frame_line("[Parsed_astats_0 @ 0x1] pts_time:0.41 RMS level dB: -62.5"),
            vec![Ok(ReportLine::Loudness {
                pts_time: 0.41,
                rms_db: -62.5
            })]
        );
        assert!(classify_frame_line("frame=  100 fps=0.0 q=-0.0").is_empty());
    }

    #[test]
    fn test_parse_frames_accumulates_until_boundary() {
        let report = "\
[Parsed_metadata_0 @ 0x1] lavfi.scene_score=0.5
[Parsed_metadata_0 @ 0x1] lavfi.blackframe.pblack=98
[Parsed_showinfo_2 @ 0x1] n:0 pts:0 pts_time:1.0 duration:1
[Parsed_showinfo_2 @ 0x1] n:1 pts:1 pts_time:1.04 duration:1
";
        let outcome = ReportParser::new(100.0).parse_frames(report);
        assert_eq!(outcome.records.len(), 2);

        let first = &outcome.records[0];
        assert_eq!(first.timestamp, 101.0);
        assert_eq!(first.black_percentage, 98);
        assert!(first.is_scene_change);
        assert_eq!(first.scene_score, 0.5);

        // state resets after each boundary
        let second = &outcome.records[1];
        assert_eq!(second.black_percentage, 0);
        assert!(!second.is_scene_change);
    }

    #[test]
    fn test_loudness_backfill_within_tolerance() {
        let report = "\
[Parsed_showinfo_2 @ 0x1] n:0 pts:0 pts_time:2.0 duration:1
[Parsed_showinfo_2 @ 0x1] n:1 pts:1 pts_time:2.025 duration:1
[Parsed_astats_0 @ 0x1] pts_time:2.03 RMS level dB: -70.0
[Parsed_astats_0 @ 0x1] pts_time:2.5 RMS level dB: -20.0
[Parsed_astats_0 @ 0x1] pts_time:2.01 RMS level dB: -55.0
";
        let outcome = ReportParser::default().parse_frames(report);
        assert_eq!(outcome.records.len(), 2);
        // 2.01 is within tolerance of both frames; the earliest emitted wins
        assert_eq!(outcome.records[0].loudness_db, -55.0);
        assert_eq!(outcome.records[1].loudness_db, -70.0);
    }

    #[test]
    fn test_loudness_before_frame_is_not_applied() {
        let report = "\
[Parsed_astats_0 @ 0x1] pts_time:3.0 RMS level dB: -80.0
[Parsed_showinfo_2 @ 0x1] n:0 pts:0 pts_time:3.0 duration:1
";
        let outcome = ReportParser::default().parse_frames(report);
        assert_eq!(outcome.records[0].loudness_db, 0.0);
    }

    #[test]
    fn test_parse_frames_sorts_out_of_order_boundaries() {
        let report = "\
[Parsed_showinfo_2 @ 0x1] n:1 pts:2 pts_time:0.08 duration:1
[Parsed_metadata_0 @ 0x1] lavfi.blackframe.pblack=100
[Parsed_showinfo_2 @ 0x1] n:0 pts:1 pts_time:0.04 duration:1
[Parsed_showinfo_2 @ 0x1] n:2 pts:1 pts_time:NOPTS duration:1
";
        let outcome = ReportParser::default().parse_frames(report);
        let timestamps: Vec<f64> = outcome.records.iter().map(|f| f.timestamp).collect();
        assert_eq!(timestamps, vec![0.04, 0.08]);
        assert_eq!(outcome.records[0].black_percentage, 100);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].source.field, "pts_time");
    }

    #[test]
    fn test_empty_reports() {
        let parser = ReportParser::default();
        assert!(parser.parse_silence("", 0.01).records.is_empty());
        assert!(parser.parse_black("", 0.01).records.is_empty());
        assert!(parser.parse_frames("").records.is_empty());
    }
}
