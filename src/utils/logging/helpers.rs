//! Simple logging helper functions for common operations

/// Logs the start of detection on one file
pub fn log_detection_start(input: &str, profile: &str, mode: &str) {
    tracing::info!("Processing file: {}", input);
    tracing::info!("Starting {} detection (profile: {})", mode, profile);
}

/// Logs how many records the three reports produced
pub fn log_reports_parsed(silences: usize, blacks: usize, frames: usize, synthesized: bool) {
    tracing::info!(
        "Reports parsed: {} silence, {} black{}, {} frame(s)",
        silences,
        blacks,
        if synthesized { " (from frames)" } else { "" },
        frames
    );
}

/// Logs the outcome of fade detection
pub fn log_detection_complete(breaks: usize, candidates: usize) {
    tracing::info!(
        "Detection completed: {} break(s) from {} candidate(s)",
        breaks,
        candidates
    );
}

/// Logs profile selection reasoning
pub fn log_profile_selection(profile: &str, reason: &str) {
    tracing::info!("Profile selected: {} ({})", profile, reason);
}
