//! Locating yt-dlp, ffmpeg and ffprobe.

use std::path::{Path, PathBuf};

use scout_config::ToolsConfig;

/// Resolved paths of the external binaries.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub yt_dlp: PathBuf,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl ToolPaths {
    /// Use configured paths, discovering ffmpeg when it is not set.
    pub fn from_config(cfg: &ToolsConfig) -> Self {
        let ffmpeg = cfg.ffmpeg.clone().unwrap_or_else(|| {
            let path_dirs: Vec<PathBuf> = std::env::var_os("PATH")
                .map(|p| std::env::split_paths(&p).collect())
                .unwrap_or_default();
            discover_ffmpeg(&path_dirs, &fallback_dirs())
        });
        let ffprobe = cfg
            .ffprobe
            .clone()
            .unwrap_or_else(|| sibling_ffprobe(&ffmpeg));
        tracing::debug!(ffmpeg = %ffmpeg.display(), ffprobe = %ffprobe.display(), "Resolved media tools");
        Self {
            yt_dlp: cfg.yt_dlp.clone(),
            ffmpeg,
            ffprobe,
        }
    }
}

/// Common install locations outside `PATH` (user bin, Homebrew Intel, Homebrew Apple Silicon).
fn fallback_dirs() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join("bin"));
    }
    candidates.push(PathBuf::from("/usr/local/bin"));
    candidates.push(PathBuf::from("/opt/homebrew/bin"));
    candidates
}

/// Prefer `ffmpeg` on `PATH`, then the first fallback directory that has it,
/// otherwise the bare name.
pub fn discover_ffmpeg(path_dirs: &[PathBuf], fallbacks: &[PathBuf]) -> PathBuf {
    if path_dirs.iter().any(|d| d.join("ffmpeg").is_file()) {
        return PathBuf::from("ffmpeg");
    }
    fallbacks
        .iter()
        .map(|d| d.join("ffmpeg"))
        .find(|p| p.is_file())
        .unwrap_or_else(|| PathBuf::from("ffmpeg"))
}

/// ffprobe installed next to the given ffmpeg.
pub fn sibling_ffprobe(ffmpeg: &Path) -> PathBuf {
    match ffmpeg.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join("ffprobe"),
        _ => PathBuf::from("ffprobe"),
    }
}
