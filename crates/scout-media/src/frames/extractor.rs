use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

use scout_config::{FramesConfig, ToolsConfig};
use scout_types::{ExtractionPolicy, Frame, MediaFile, Result, ScoutError};

use super::policy::{ResolvedPolicy, fixed_interval_timestamps, resolve_policy};
use super::scene::{
    SAMPLE_HEIGHT, SAMPLE_WIDTH, SceneParams, select_scene_timestamps, split_luma_frames,
};
use crate::probe::Prober;
use crate::process::{is_disk_write_failure, run_tool, stderr_summary};
use crate::tools::ToolPaths;

/// Renders still frames from a local media file with ffmpeg.
pub struct FrameExtractor {
    ffmpeg: PathBuf,
    prober: Prober,
    timeout: Duration,
    scene: SceneParams,
    jpeg_quality: u8,
}

impl FrameExtractor {
    pub fn new(tools: &ToolPaths, tools_cfg: &ToolsConfig, frames_cfg: &FramesConfig) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
            prober: Prober::new(tools, tools_cfg),
            timeout: Duration::from_secs(tools_cfg.ffmpeg_timeout_secs),
            scene: SceneParams::from(frames_cfg),
            jpeg_quality: frames_cfg.jpeg_quality,
        }
    }

    /// Extract frames from `media` into `output_dir`.
    ///
    /// The returned frames are ordered by timestamp and every `image_path`
    /// exists on disk when this returns.
    pub async fn extract_frames(
        &self,
        media: &MediaFile,
        output_dir: &Path,
        policy: ExtractionPolicy,
    ) -> Result<Vec<Frame>> {
        let info = self.prober.probe(&media.path).await?;
        let duration = info.duration;

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| ScoutError::disk_write(output_dir, e))?;

        let resolved = resolve_policy(policy, duration);
        tracing::info!(
            path = %media.path.display(),
            duration,
            policy = ?resolved,
            "Extracting frames"
        );

        let timestamps = match resolved {
            ResolvedPolicy::FixedInterval(n) => fixed_interval_timestamps(duration, n),
            ResolvedPolicy::SceneChange => self.scene_timestamps(&media.path, duration).await?,
        };

        let width = frame_index_width(timestamps.len());
        let mut frames = Vec::with_capacity(timestamps.len());
        for (i, timestamp) in timestamps.into_iter().enumerate() {
            let name = frame_file_name(resolved.file_prefix(), i + 1, width);
            let target = output_dir.join(name);
            if self.render_frame(&media.path, timestamp, &target).await? {
                frames.push(Frame {
                    timestamp,
                    image_path: target,
                });
            }
        }

        if frames.is_empty() {
            return Err(ScoutError::Decode(format!(
                "{}: no frames could be rendered",
                media.path.display()
            )));
        }
        tracing::info!(count = frames.len(), dir = %output_dir.display(), "Frames extracted");
        Ok(frames)
    }

    async fn scene_timestamps(&self, input: &Path, duration: f64) -> Result<Vec<f64>> {
        let raw = self.sample_luma(input).await?;
        let samples = split_luma_frames(&raw, self.scene.sample_fps);
        let timestamps = select_scene_timestamps(&samples, &self.scene, duration);
        tracing::debug!(
            samples = samples.len(),
            boundaries = timestamps.len(),
            "Scene detection finished"
        );
        Ok(timestamps)
    }

    /// Decode the whole input as a small grayscale stream on stdout.
    async fn sample_luma(&self, input: &Path) -> Result<Vec<u8>> {
        let filter = format!(
            "fps={},scale={SAMPLE_WIDTH}:{SAMPLE_HEIGHT},format=gray",
            self.scene.sample_fps
        );
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-loglevel", "error", "-nostdin", "-i"])
            .arg(input)
            .args(["-an", "-vf", &filter])
            .args(["-f", "rawvideo", "-pix_fmt", "gray", "pipe:1"]);

        let output = run_tool(&mut cmd, self.timeout)
            .await
            .map_err(|e| ScoutError::Decode(e.to_string()))?;
        if !output.status.success() {
            return Err(ScoutError::Decode(format!(
                "{}: {}",
                input.display(),
                stderr_summary(&output)
            )));
        }
        Ok(output.stdout)
    }

    /// Render a single frame. Returns `false` when ffmpeg produced nothing
    /// for this timestamp.
    async fn render_frame(&self, input: &Path, timestamp: f64, target: &Path) -> Result<bool> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-loglevel", "error", "-nostdin"])
            .args(["-ss", &format!("{timestamp:.3}"), "-i"])
            .arg(input)
            .args(["-frames:v", "1", "-q:v", &self.jpeg_quality.to_string(), "-y"])
            .arg(target);

        let output = run_tool(&mut cmd, self.timeout)
            .await
            .map_err(|e| ScoutError::Decode(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_disk_write_failure(&stderr) {
                return Err(ScoutError::DiskWrite(format!(
                    "{}: {}",
                    target.display(),
                    stderr_summary(&output)
                )));
            }
            tracing::warn!(
                timestamp,
                error = %stderr_summary(&output),
                "Frame render failed, skipping"
            );
            return Ok(false);
        }

        match tokio::fs::metadata(target).await {
            Ok(meta) if meta.len() > 0 => Ok(true),
            _ => {
                tracing::warn!(timestamp, "ffmpeg wrote no image, skipping");
                Ok(false)
            }
        }
    }
}

/// Zero padding wide enough that lexicographic order is index order.
fn frame_index_width(count: usize) -> usize {
    count.to_string().len().max(5)
}

fn frame_file_name(prefix: &str, index: usize, width: usize) -> String {
    format!("{prefix}_{index:0width$}.jpg")
}
