//! ffprobe wrapper.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;

use scout_config::ToolsConfig;
use scout_types::{MediaFile, Result, ScoutError};

use crate::process::{run_tool, stderr_summary};
use crate::tools::ToolPaths;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    codec_name: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    disposition: Option<ProbeDisposition>,
}

#[derive(Debug, Deserialize)]
struct ProbeDisposition {
    #[serde(default)]
    attached_pic: u8,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    format_name: Option<String>,
    #[serde(default)]
    duration: Option<String>,
}

/// What the frame extractor needs to know about a media file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeInfo {
    pub duration: f64,
    pub format_name: String,
    pub video_codec: String,
    pub width: u32,
    pub height: u32,
}

/// Interpret `ffprobe -print_format json -show_format -show_streams` output.
pub fn parse_probe_output(json: &str) -> Result<ProbeInfo> {
    let probe: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| ScoutError::Decode(format!("unreadable ffprobe output: {e}")))?;

    let format_name = probe
        .format
        .as_ref()
        .and_then(|f| f.format_name.clone())
        .unwrap_or_else(|| "unknown".to_string());

    // Cover art shows up as a video stream; it is not something to sample.
    let video = probe
        .streams
        .iter()
        .find(|s| {
            s.codec_type.as_deref() == Some("video")
                && s.disposition.as_ref().is_none_or(|d| d.attached_pic == 0)
        })
        .ok_or_else(|| {
            ScoutError::UnsupportedFormat(format!("no video stream in {format_name} container"))
        })?;

    let video_codec = match video.codec_name.as_deref() {
        Some(name) if !name.is_empty() && name != "none" && name != "unknown" => name.to_string(),
        _ => {
            return Err(ScoutError::UnsupportedFormat(format!(
                "unknown video codec in {format_name} container"
            )));
        }
    };

    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| ScoutError::Decode("media duration is unknown".to_string()))?;

    Ok(ProbeInfo {
        duration,
        format_name,
        video_codec,
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
    })
}

pub struct Prober {
    ffprobe: PathBuf,
    timeout: Duration,
}

impl Prober {
    pub fn new(tools: &ToolPaths, cfg: &ToolsConfig) -> Self {
        Self {
            ffprobe: tools.ffprobe.clone(),
            timeout: Duration::from_secs(cfg.ffmpeg_timeout_secs),
        }
    }

    pub async fn probe(&self, path: &Path) -> Result<ProbeInfo> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| ScoutError::Decode(format!("{}: {e}", path.display())))?;
        if !meta.is_file() {
            return Err(ScoutError::Decode(format!(
                "{}: not a regular file",
                path.display()
            )));
        }

        let mut cmd = Command::new(&self.ffprobe);
        cmd.args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path);
        let output = run_tool(&mut cmd, self.timeout)
            .await
            .map_err(|e| ScoutError::Decode(e.to_string()))?;

        if !output.status.success() {
            let summary = stderr_summary(&output);
            let lower = summary.to_lowercase();
            return Err(
                if lower.contains("unsupported") || lower.contains("no decoder") {
                    ScoutError::UnsupportedFormat(format!("{}: {summary}", path.display()))
                } else {
                    ScoutError::Decode(format!("{}: {summary}", path.display()))
                },
            );
        }

        let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!(
            path = %path.display(),
            duration = info.duration,
            codec = %info.video_codec,
            "Probed media file"
        );
        Ok(info)
    }

    /// Build a [`MediaFile`] for a file already on disk.
    pub async fn probe_media_file(&self, path: &Path) -> Result<MediaFile> {
        let info = self.probe(path).await?;
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| ScoutError::Decode(format!("{}: {e}", path.display())))?
            .len();
        Ok(MediaFile {
            path: path.to_path_buf(),
            source_url: path.display().to_string(),
            size,
            duration: info.duration,
        })
    }
}
