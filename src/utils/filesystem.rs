use crate::utils::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const VIDEO_EXTENSIONS: &[&str] = &[
    ".mkv", ".mp4", ".mov", ".m4v", ".avi", ".webm", ".ts", ".m2ts", ".mpg", ".mpeg", ".flv",
];

pub fn find_video_files<P: AsRef<Path>>(path: P) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(Error::validation(format!(
            "Path does not exist: {}",
            path.display()
        )));
    }

    let mut video_files = Vec::new();

    if path.is_file() {
        if is_video_file(path) {
            video_files.push(path.to_path_buf());
        } else {
            return Err(Error::validation(format!(
                "File is not a supported video format: {}",
                path.display()
            )));
        }
    } else if path.is_dir() {
        for entry in WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && is_video_file(path) {
                video_files.push(path.to_path_buf());
            }
        }

        if video_files.is_empty() {
            return Err(Error::validation(format!(
                "No supported video files found in directory: {}",
                path.display()
            )));
        }

        video_files.sort();
    }

    Ok(video_files)
}

/// Expands every input path and drops duplicates, keeping first-seen order.
pub fn collect_inputs<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for path in paths {
        for file in find_video_files(path)? {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }

    Ok(files)
}

pub fn is_video_file<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();

    if let Some(extension) = path.extension() {
        if let Some(ext_str) = extension.to_str() {
            let ext_lower = format!(".{}", ext_str.to_lowercase());
            return VIDEO_EXTENSIONS.contains(&ext_lower.as_str());
        }
    }

    false
}

/// Reads a captured backend report. Invalid UTF-8 is replaced rather than
/// rejected, since ffmpeg echoes container metadata verbatim.
pub fn read_report<P: AsRef<Path>>(path: P) -> Result<String> {
    let bytes = std::fs::read(path.as_ref()).map_err(|e| {
        Error::validation(format!(
            "Cannot read report {}: {}",
            path.as_ref().display(),
            e
        ))
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file("test.mkv"));
        assert!(is_video_file("test.MP4"));
        assert!(is_video_file("recording.ts"));
        assert!(!is_video_file("test.txt"));
        assert!(!is_video_file("test"));
    }

    #[test]
    fn test_find_video_files_in_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("season1")).unwrap();
        fs::write(dir.path().join("season1/b.mkv"), b"").unwrap();
        fs::write(dir.path().join("a.mp4"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let files = find_video_files(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.mp4"), dir.path().join("season1/b.mkv")]
        );
    }

    #[test]
    fn test_find_video_files_errors() {
        let dir = tempdir().unwrap();
        assert!(find_video_files(dir.path()).is_err());
        assert!(find_video_files(dir.path().join("missing.mkv")).is_err());

        let text = dir.path().join("notes.txt");
        fs::write(&text, b"").unwrap();
        assert!(find_video_files(&text).is_err());
    }

    #[test]
    fn test_collect_inputs_dedups() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("show.mkv");
        fs::write(&file, b"").unwrap();

        let files = collect_inputs(&[dir.path().to_path_buf(), file.clone()]).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_read_report() {
        let dir = tempdir().unwrap();
        let report = dir.path().join("silence.log");
        fs::write(&report, b"[silencedetect @ 0x1] silence_start: 1.5\n\xff").unwrap();

        let text = read_report(&report).unwrap();
        assert!(text.starts_with("[silencedetect @ 0x1] silence_start: 1.5"));
        assert!(read_report(dir.path().join("missing.log")).is_err());
    }
}
