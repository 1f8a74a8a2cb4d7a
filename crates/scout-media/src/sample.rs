//! Evenly spaced frame sampling for the downstream vision step.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use scout_types::{FrameSample, Result, SampledFrame, ScoutError};

const FRAME_PREFIXES: [&str; 2] = ["frame_", "scene_"];

/// Pick `sample_count` evenly spaced frames from `frames_dir`, optionally
/// inlining each image as base64.
pub async fn sample_frames(
    frames_dir: &Path,
    sample_count: usize,
    include_data: bool,
) -> Result<FrameSample> {
    if sample_count == 0 {
        return Err(ScoutError::InvalidArgument(
            "sample_count must be at least 1".to_string(),
        ));
    }

    let all = list_frame_files(frames_dir).await?;
    if all.is_empty() {
        return Err(ScoutError::InvalidArgument(format!(
            "{}: no frame_*.jpg or scene_*.jpg files",
            frames_dir.display()
        )));
    }

    let selected = pick_evenly(&all, sample_count);
    let mut frames = Vec::with_capacity(selected.len());
    for path in selected {
        match read_frame(path, include_data).await {
            Ok(frame) => frames.push(frame),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable frame"),
        }
    }
    if frames.is_empty() {
        return Err(ScoutError::Decode(format!(
            "{}: none of the selected frames could be read",
            frames_dir.display()
        )));
    }

    Ok(FrameSample {
        total_frames: all.len(),
        analyzed_frames: frames.len(),
        frames,
    })
}

/// All of `items` when there are few enough, otherwise every `len / count`-th item.
pub fn pick_evenly<T>(items: &[T], count: usize) -> Vec<&T> {
    if items.len() <= count {
        return items.iter().collect();
    }
    let step = items.len() / count;
    (0..count).map(|i| &items[i * step]).collect()
}

struct FrameFile {
    path: PathBuf,
    prefix: &'static str,
    modified: SystemTime,
}

async fn list_frame_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        ScoutError::InvalidArgument(format!("{}: {e}", dir.display()))
    })?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ScoutError::InvalidArgument(format!("{}: {e}", dir.display())))?
    {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.ends_with(".jpg") {
            continue;
        }
        let Some(prefix) = FRAME_PREFIXES.iter().copied().find(|p| name.starts_with(p)) else {
            continue;
        };
        let modified = entry
            .metadata()
            .await
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        files.push(FrameFile {
            path: entry.path(),
            prefix,
            modified,
        });
    }
    Ok(latest_run(files))
}

/// One extraction writes a single prefix. When a reused directory holds
/// both, keep the prefix of the most recently written file.
fn latest_run(files: Vec<FrameFile>) -> Vec<PathBuf> {
    let Some(newest) = files.iter().max_by_key(|f| f.modified).map(|f| f.prefix) else {
        return Vec::new();
    };
    let total = files.len();
    let mut paths: Vec<PathBuf> = files
        .into_iter()
        .filter(|f| f.prefix == newest)
        .map(|f| f.path)
        .collect();
    if paths.len() < total {
        tracing::info!(
            prefix = newest,
            ignored = total - paths.len(),
            "Ignoring frames left by an earlier extraction"
        );
    }
    paths.sort();
    paths
}

async fn read_frame(path: &Path, include_data: bool) -> std::io::Result<SampledFrame> {
    let bytes = tokio::fs::read(path).await?;
    let encoded = STANDARD.encode(&bytes);
    Ok(SampledFrame {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        size: bytes.len() as u64,
        mime_type: mime_for(path).to_string(),
        base64_length: encoded.len(),
        data: include_data.then_some(encoded),
    })
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
