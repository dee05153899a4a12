use crate::{
    cli::CliArgs,
    config::{Config, DetectionProfile, ProfileManager},
    utils::Result,
};

/// Runs the informational commands. Returns `true` when one was handled.
pub async fn handle_commands(args: &CliArgs, config: &Config) -> Result<bool> {
    if args.list_profiles {
        list_profiles(config).await?;
        return Ok(true);
    }

    if let Some(profile_name) = &args.show_profile {
        show_profile(config, profile_name).await?;
        return Ok(true);
    }

    if args.validate_config {
        validate_config(args.config.as_deref()).await?;
        return Ok(true);
    }

    Ok(false)
}

async fn list_profiles(config: &Config) -> Result<()> {
    let mut profile_manager = ProfileManager::new();
    profile_manager.load_profiles(config.profiles.clone())?;

    println!("Available detection profiles:");
    println!("{:-<80}", "");
    println!(
        "{:<14} {:<36} {:<10} {:<9} {:<8}",
        "Name", "Title", "Noise dB", "Overlap", "Frames"
    );
    println!("{:-<80}", "");

    for profile_name in profile_manager.list_profiles() {
        if let Some(profile) = profile_manager.get_profile(profile_name) {
            let marker = if profile_name == config.detection.default_profile {
                " *"
            } else {
                ""
            };
            println!(
                "{:<14} {:<36} {:<10} {:<9} {:<8}",
                format!("{}{}", profile_name, marker),
                truncate(&profile.title, 36),
                profile.backend.silence_noise_db,
                format!("{}s", profile.min_overlap),
                if profile.backend.frame_analysis { "yes" } else { "no" }
            );
        }
    }

    println!("{:-<80}", "");
    println!("* default profile");
    println!("Use '--show-profile <name>' to see detailed information about a specific profile.");

    Ok(())
}

async fn show_profile(config: &Config, name: &str) -> Result<()> {
    let mut profile_manager = ProfileManager::new();
    profile_manager.load_profiles(config.profiles.clone())?;

    if let Some(profile) = profile_manager.get_profile(name) {
        print_profile(profile);
    } else {
        println!("Profile '{}' not found.", name);
        println!();
        println!("Available profiles:");
        for profile_name in profile_manager.list_profiles() {
            println!("  - {}", profile_name);
        }
    }

    Ok(())
}

fn print_profile(profile: &DetectionProfile) {
    println!("Profile Details: {}", profile.name);
    println!("{:=<60}", "");
    println!("Title: {}", profile.title);
    println!();

    println!("Backend Filters:");
    println!("{:-<40}", "");
    println!(
        "  silencedetect: noise={}dB d={}",
        profile.backend.silence_noise_db, profile.backend.silence_detect_duration
    );
    println!(
        "  blackdetect: d={} pic_th={} pix_th={}",
        profile.backend.black_detect_duration,
        profile.backend.black_picture_threshold,
        profile.backend.black_pixel_threshold
    );
    println!(
        "  Frame analysis: {}",
        if profile.backend.frame_analysis { "enabled" } else { "disabled" }
    );
    println!();

    println!("Matching:");
    println!("{:-<40}", "");
    println!("  Minimum silence: {}s", profile.min_silence_duration);
    println!("  Minimum black: {}s", profile.min_black_duration);
    println!("  Minimum overlap: {}s", profile.min_overlap);
    println!(
        "  Close overlap: within {}s, {} bounds, frames >= {}% black",
        profile.close_overlap_tolerance,
        profile.close_overlap_policy.as_str(),
        profile.confirm_black_percentage
    );
    if profile.chapter_marks.is_empty() {
        println!("  Chapter marks: none");
    } else {
        let marks: Vec<String> = profile
            .chapter_marks
            .iter()
            .map(|mark| format!("{:.3}", mark))
            .collect();
        println!("  Chapter marks: {}", marks.join(", "));
    }
    println!(
        "  Chapter confirmation: frames >= {}% black, silence >= {}s",
        profile.chapter_confirm_black_percentage, profile.chapter_min_silence
    );
    println!();

    println!("Synthesis and Merge:");
    println!("{:-<40}", "");
    println!(
        "  Synthesized black: frames >= {}% black, at least {}s",
        profile.synth_black_percentage, profile.synth_min_duration
    );
    println!("  Frame rate: {} fps", profile.frame_rate);
    println!("  Merge gap: {}s", profile.merge_gap);
    println!("  Minimum period: {}s", profile.min_period_duration);
    println!("  Scene threshold: {}", profile.scene_threshold());
}

async fn validate_config(config_path: Option<&std::path::Path>) -> Result<()> {
    match Config::load_with_fallback(config_path) {
        Ok(config) => {
            if let Some(path) = config_path {
                println!("✓ Configuration file is valid: {}", path.display());
            } else {
                println!("✓ Configuration is valid (using discovered/default config)");
            }
            println!();

            println!("Configuration Summary:");
            println!("{:-<40}", "");
            println!("Profiles defined: {}", config.profiles.len());
            println!("Default profile: {}", config.detection.default_profile);
            println!("Edge margin: {}s", config.detection.edge_margin);
            println!(
                "Parallel jobs: {}",
                match config.detection.max_parallel_jobs {
                    0 => "auto".to_string(),
                    n => n.to_string(),
                }
            );

            let mut profile_manager = ProfileManager::new();
            match profile_manager.load_profiles(config.profiles) {
                Ok(()) => {
                    println!("✓ All profiles loaded successfully");
                }
                Err(e) => {
                    println!("✗ Profile validation failed: {}", e);
                    return Err(e);
                }
            }

            Ok(())
        }
        Err(e) => {
            println!("✗ Configuration validation failed: {}", e);
            println!();
            println!("Common issues:");
            println!("  - Check YAML syntax and indentation");
            println!("  - Verify all required profile fields are present");
            println!("  - Durations must not be negative");
            println!("  - Percentages must lie between 0 and 100");
            Err(e)
        }
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_list_profiles() {
        let config = Config::default();

        // prints to stdout; only checks it does not fail
        let result = list_profiles(&config).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_show_profile() {
        let config = Config::default();

        assert!(show_profile(&config, "sensitive").await.is_ok());

        // unknown profiles list the alternatives instead of failing
        assert!(show_profile(&config, "nonexistent").await.is_ok());
    }

    #[tokio::test]
    async fn test_validate_config() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", Config::default().to_yaml().unwrap()).unwrap();
        temp_file.flush().unwrap();

        assert!(validate_config(Some(temp_file.path())).await.is_ok());

        let mut broken = NamedTempFile::new().unwrap();
        writeln!(broken, "profiles: [unclosed").unwrap();
        broken.flush().unwrap();

        assert!(validate_config(Some(broken.path())).await.is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(
            truncate("Sensitive fades with frame confirmation", 20),
            "Sensitive fades w..."
        );
    }
}
