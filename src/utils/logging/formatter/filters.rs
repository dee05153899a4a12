//! Suppression of log lines that carry no detection information

/// Demuxer and decoder chatter that ends up in backend error tails.
const FFMPEG_NOISE: &[&str] = &[
    "Invalid Block Addition value",
    "Could not find codec parameters for stream",
    "Consider increasing the value for the 'analyzeduration'",
    "non monotonically increasing dts",
    "Past duration",
    "matroska,webm",
];

/// Returns false for empty messages and known FFmpeg noise.
pub fn should_show_message(message: &str) -> bool {
    if message.trim().is_empty() {
        return false;
    }
    !FFMPEG_NOISE.iter().any(|noise| message.contains(noise))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_messages_pass() {
        assert!(should_show_message("Processing file: show.mkv"));
        assert!(should_show_message("Detection completed: 2 break(s) from 5 candidate(s)"));
    }

    #[test]
    fn test_ffmpeg_noise_is_dropped() {
        assert!(!should_show_message("Invalid Block Addition value"));
        assert!(!should_show_message("Could not find codec parameters for stream 2"));
        assert!(!should_show_message("Past duration 0.999992 too large"));
    }

    #[test]
    fn test_blank_is_dropped() {
        assert!(!should_show_message(""));
        assert!(!should_show_message("   "));
    }
}
