use crate::config::BackendSettings;
use crate::utils::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command as TokioCommand;
use tracing::debug;

static DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Duration: (\d{2}):(\d{2}):(\d{2})\.(\d{2})").unwrap()
});

/// Video filters producing the per-frame report: scene metadata, per-frame
/// black percentage and a frame boundary line from showinfo.
const FRAME_VIDEO_FILTER: &str = "metadata=print,blackframe=amount=0:threshold=32,showinfo";

/// Audio filter attaching RMS loudness to every audio frame.
const FRAME_AUDIO_FILTER: &str = "astats=metadata=1:reset=1";

/// Number of trailing stderr lines kept in backend error messages.
const ERROR_TAIL_LINES: usize = 5;

/// Part of the media to analyse. Reported times are relative to `start`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalysisWindow {
    pub start: f64,
    pub length: Option<f64>,
}

impl AnalysisWindow {
    pub fn full() -> Self {
        Self::default()
    }

    /// Window from `start` to `end`, either bound optional.
    pub fn between(start: Option<f64>, end: Option<f64>) -> Result<Self> {
        let start = start.unwrap_or(0.0);
        if !(start.is_finite() && start >= 0.0) {
            return Err(Error::validation(format!("Invalid window start: {}", start)));
        }

        let length = match end {
            Some(end) if end.is_finite() && end > start => Some(end - start),
            Some(end) => {
                return Err(Error::validation(format!(
                    "Window end {} must be after start {}",
                    end, start
                )))
            }
            None => None,
        };

        Ok(Self { start, length })
    }

    /// Offset to add to reported times.
    pub fn offset(&self) -> f64 {
        self.start
    }

    fn seek_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.start > 0.0 {
            args.push("-ss".to_string());
            args.push(format!("{:.6}", self.start));
        }
        if let Some(length) = self.length {
            args.push("-t".to_string());
            args.push(format!("{:.6}", length));
        }
        args
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub duration: f64,
    /// Chapter start times in seconds
    pub chapters: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct FfmpegWrapper {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl FfmpegWrapper {
    pub fn new(ffmpeg_path: String, ffprobe_path: String) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
        }
    }

    pub async fn check_availability(&self) -> Result<()> {
        let ffmpeg_check = TokioCommand::new(&self.ffmpeg_path)
            .arg("-version")
            .output()
            .await?;

        if !ffmpeg_check.status.success() {
            return Err(Error::ffmpeg("FFmpeg is not available or not executable"));
        }

        let ffprobe_check = TokioCommand::new(&self.ffprobe_path)
            .arg("-version")
            .output()
            .await?;

        if !ffprobe_check.status.success() {
            return Err(Error::ffmpeg("FFprobe is not available or not executable"));
        }

        Ok(())
    }

    /// Reads duration and chapter marks with ffprobe.
    pub async fn get_media_info<P: AsRef<Path>>(&self, input_path: P) -> Result<MediaInfo> {
        let input_path = input_path.as_ref().to_string_lossy().to_string();

        let output = TokioCommand::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_chapters",
                input_path.as_str(),
            ])
            .output()
            .await?;

        if !output.status.success() {
            let error_msg = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ffmpeg(format!("ffprobe failed: {}", error_msg.trim())));
        }

        let json_output = String::from_utf8_lossy(&output.stdout);
        let probe_data: serde_json::Value = serde_json::from_str(&json_output)
            .map_err(|e| Error::parse(format!("Failed to parse ffprobe output: {}", e)))?;

        match parse_media_info(&probe_data) {
            Ok(info) => Ok(info),
            Err(e) => {
                debug!("Duration not found in JSON, attempting text fallback");
                let duration = self.extract_duration_from_text(&input_path).await.map_err(|_| e)?;
                Ok(MediaInfo {
                    duration,
                    chapters: parse_chapters(&probe_data),
                })
            }
        }
    }

    pub async fn run_silence_report<P: AsRef<Path>>(
        &self,
        input_path: P,
        settings: &BackendSettings,
        window: &AnalysisWindow,
    ) -> Result<String> {
        let filter = silence_filter(settings);
        self.run_analysis(input_path.as_ref(), window, &["-af", filter.as_str(), "-vn"])
            .await
    }

    pub async fn run_black_report<P: AsRef<Path>>(
        &self,
        input_path: P,
        settings: &BackendSettings,
        window: &AnalysisWindow,
    ) -> Result<String> {
        let filter = black_filter(settings);
        self.run_analysis(input_path.as_ref(), window, &["-vf", filter.as_str(), "-an"])
            .await
    }

    pub async fn run_frame_report<P: AsRef<Path>>(
        &self,
        input_path: P,
        window: &AnalysisWindow,
    ) -> Result<String> {
        self.run_analysis(
            input_path.as_ref(),
            window,
            &["-vf", FRAME_VIDEO_FILTER, "-af", FRAME_AUDIO_FILTER],
        )
        .await
    }

    /// Frames whose scene score exceeds `threshold`, in the frame report format.
    pub async fn run_scene_report<P: AsRef<Path>>(
        &self,
        input_path: P,
        threshold: f64,
        window: &AnalysisWindow,
    ) -> Result<String> {
        let filter = scene_filter(threshold);
        self.run_analysis(input_path.as_ref(), window, &["-vf", filter.as_str(), "-an"])
            .await
    }

    /// Runs ffmpeg into the null muxer and returns its stderr, where the
    /// analysis filters print their findings.
    async fn run_analysis(
        &self,
        input_path: &Path,
        window: &AnalysisWindow,
        filter_args: &[&str],
    ) -> Result<String> {
        let mut args: Vec<String> = vec!["-hide_banner".to_string(), "-nostats".to_string()];
        args.extend(window.seek_args());
        args.push("-i".to_string());
        args.push(input_path.to_string_lossy().to_string());
        args.extend(filter_args.iter().map(|a| a.to_string()));
        args.extend(["-f", "null", "-"].iter().map(|a| a.to_string()));

        debug!("Running ffmpeg with args: {:?}", args);

        let output = TokioCommand::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await?;

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(Error::ffmpeg(format!(
                "ffmpeg failed on {}: {}",
                input_path.display(),
                stderr_tail(&stderr)
            )));
        }

        Ok(stderr)
    }

    async fn extract_duration_from_text(&self, input_path: &str) -> Result<f64> {
        let output = TokioCommand::new(&self.ffprobe_path)
            .args(["-hide_banner", input_path])
            .output()
            .await
            .map_err(|e| Error::ffmpeg(format!("Failed to run ffprobe for duration: {}", e)))?;

        // ffprobe prints the stream summary on stderr
        let text_output = String::from_utf8_lossy(&output.stderr);
        parse_duration_text(&text_output)
            .ok_or_else(|| Error::parse("Could not extract duration from raw output"))
    }
}

pub fn silence_filter(settings: &BackendSettings) -> String {
    format!(
        "silencedetect=noise={}dB:d={}",
        settings.silence_noise_db, settings.silence_detect_duration
    )
}

pub fn black_filter(settings: &BackendSettings) -> String {
    format!(
        "blackdetect=d={}:pic_th={}:pix_th={}",
        settings.black_detect_duration,
        settings.black_picture_threshold,
        settings.black_pixel_threshold
    )
}

pub fn scene_filter(threshold: f64) -> String {
    format!("select='gt(scene,{})',metadata=print,showinfo", threshold)
}

fn parse_media_info(data: &serde_json::Value) -> Result<MediaInfo> {
    let duration = data["format"]["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| Error::parse("Duration not found in ffprobe output"))?;

    Ok(MediaInfo {
        duration,
        chapters: parse_chapters(data),
    })
}

fn parse_chapters(data: &serde_json::Value) -> Vec<f64> {
    let mut chapters: Vec<f64> = data["chapters"]
        .as_array()
        .map(|chapters| {
            chapters
                .iter()
                .filter_map(|c| c["start_time"].as_str())
                .filter_map(|s| s.parse::<f64>().ok())
                .filter(|t| t.is_finite())
                .collect()
        })
        .unwrap_or_default();
    chapters.sort_by(f64::total_cmp);
    chapters
}

fn parse_duration_text(text: &str) -> Option<f64> {
    let captures = DURATION_REGEX.captures(text)?;
    let hours: f64 = captures[1].parse().ok()?;
    let minutes: f64 = captures[2].parse().ok()?;
    let seconds: f64 = captures[3].parse().ok()?;
    let centiseconds: f64 = captures[4].parse().ok()?;

    let total_seconds = hours * 3600.0 + minutes * 60.0 + seconds + centiseconds / 100.0;
    debug!("Extracted duration from text: {}s", total_seconds);
    Some(total_seconds)
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let skip = lines.len().saturating_sub(ERROR_TAIL_LINES);
    lines[skip..].join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings() -> BackendSettings {
        BackendSettings {
            silence_noise_db: -30.0,
            silence_detect_duration: 0.05,
            black_detect_duration: 0.03,
            black_picture_threshold: 0.9,
            black_pixel_threshold: 0.1,
            frame_analysis: true,
        }
    }

    #[test]
    fn test_filters() {
        assert_eq!(silence_filter(&settings()), "silencedetect=noise=-30dB:d=0.05");
        assert_eq!(black_filter(&settings()), "blackdetect=d=0.03:pic_th=0.9:pix_th=0.1");
        assert_eq!(scene_filter(0.2), "select='gt(scene,0.2)',metadata=print,showinfo");
    }

    #[test]
    fn test_window_args() {
        assert!(AnalysisWindow::full().seek_args().is_empty());

        let window = AnalysisWindow::between(Some(60.0), Some(90.5)).unwrap();
        assert_eq!(window.offset(), 60.0);
        assert_eq!(
            window.seek_args(),
            vec!["-ss", "60.000000", "-t", "30.500000"]
        );

        assert!(AnalysisWindow::between(Some(10.0), Some(5.0)).is_err());
        assert!(AnalysisWindow::between(Some(-1.0), None).is_err());
    }

    #[test]
    fn test_parse_media_info() {
        let data = serde_json::json!({
            "chapters": [
                {"id": 1, "start_time": "631.297333", "end_time": "1257.256000"},
                {"id": 0, "start_time": "0.000000", "end_time": "94.360933"},
                {"id": 2, "start_time": "94.360933", "end_time": "631.297333"}
            ],
            "format": {"filename": "show.mkv", "duration": "1298.263625"}
        });

        let info = parse_media_info(&data).unwrap();
        assert_eq!(info.duration, 1298.263625);
        assert_eq!(info.chapters, vec![0.0, 94.360933, 631.297333]);
    }

    #[test]
    fn test_parse_media_info_without_duration() {
        let data = serde_json::json!({"format": {"filename": "broken.ts"}});
        assert!(parse_media_info(&data).is_err());
        assert!(parse_chapters(&data).is_empty());
    }

    #[test]
    fn test_parse_duration_text() {
        let text = "Input #0, matroska,webm, from 'show.mkv':\n  Duration: 00:21:38.26, start: 0.000000, bitrate: 4012 kb/s";
        let duration = parse_duration_text(text).unwrap();
        assert!((duration - 1298.26).abs() < 1e-9);
        assert_eq!(parse_duration_text("no duration here"), None);
    }

    #[test]
    fn test_stderr_tail() {
        let stderr = "a\nb\n\nc\nd\ne\nf\ng\n";
        assert_eq!(stderr_tail(stderr), "c | d | e | f | g");
    }
}
