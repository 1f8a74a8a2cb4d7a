//! Media download through yt-dlp.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

use scout_config::ToolsConfig;
use scout_types::{MediaFile, Result, ScoutError};

use crate::process::{ToolError, is_disk_write_failure, run_tool, stderr_summary};
use crate::resolver;
use crate::tools::ToolPaths;

/// File name template handed to yt-dlp, relative to the output directory.
const OUTPUT_TEMPLATE: &str = "%(id)s.%(ext)s";

/// Requested encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quality {
    Best,
    Worst,
    /// Best encoding no taller than this many lines.
    MaxHeight(u32),
    /// A raw yt-dlp format selector.
    Custom(String),
}

impl From<&str> for Quality {
    fn from(s: &str) -> Self {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "" | "best" => Self::Best,
            "worst" => Self::Worst,
            lower => lower
                .strip_suffix('p')
                .and_then(|h| h.parse().ok())
                .filter(|h: &u32| *h > 0)
                .map(Self::MaxHeight)
                .unwrap_or_else(|| Self::Custom(s.to_string())),
        }
    }
}

impl Quality {
    /// yt-dlp `--format` value. Every selector ends in `/best` so an
    /// unavailable encoding falls back to the best one offered.
    pub fn format_selector(&self) -> String {
        match self {
            Self::Best => "bestvideo+bestaudio/best".to_string(),
            Self::Worst => "worst/best".to_string(),
            Self::MaxHeight(h) => {
                format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]/best")
            }
            Self::Custom(sel) => format!("{sel}/best"),
        }
    }
}

/// Downloads media with skip-if-present semantics.
pub struct Downloader {
    yt_dlp: PathBuf,
    timeout: Duration,
}

impl Downloader {
    pub fn new(tools: &ToolPaths, cfg: &ToolsConfig) -> Self {
        Self {
            yt_dlp: tools.yt_dlp.clone(),
            timeout: Duration::from_secs(cfg.download_timeout_secs),
        }
    }

    /// Download `url` into `output_dir`.
    ///
    /// If the target file already exists and is non-empty it is returned
    /// unchanged and nothing is downloaded.
    pub async fn download(
        &self,
        url: &str,
        output_dir: &Path,
        quality: &Quality,
    ) -> Result<MediaFile> {
        resolver::parse_http_url(url)?;

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| ScoutError::disk_write(output_dir, e))?;

        let template = output_dir.join(OUTPUT_TEMPLATE);
        let selector = quality.format_selector();

        let (target, duration) = self.preflight(url, &template, &selector).await?;

        if let Some(size) = existing_size(&target).await {
            tracing::info!(path = %target.display(), size, "Already downloaded, skipping");
            return Ok(MediaFile {
                path: target,
                source_url: url.to_string(),
                size,
                duration,
            });
        }

        tracing::info!(url = %url, format = %selector, "Downloading video");
        let mut cmd = self.base_command(&template, &selector);
        cmd.args(["--no-overwrites", "--print", "after_move:filepath"])
            .arg(url);
        let output = run_tool(&mut cmd, self.timeout).await.map_err(tool_failure)?;
        if !output.status.success() {
            return Err(classify_failure(&output));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = last_line(&stdout).map(PathBuf::from).unwrap_or(target);
        let size = tokio::fs::metadata(&path)
            .await
            .map_err(|e| ScoutError::disk_write(&path, e))?
            .len();

        tracing::info!(path = %path.display(), size, "Download complete");
        Ok(MediaFile {
            path,
            source_url: url.to_string(),
            size,
            duration,
        })
    }

    /// Ask yt-dlp where the file will land and how long it is, without downloading.
    async fn preflight(&self, url: &str, template: &Path, selector: &str) -> Result<(PathBuf, f64)> {
        let mut cmd = self.base_command(template, selector);
        cmd.args(["--print", "filename", "--print", "duration"]).arg(url);
        let output = run_tool(&mut cmd, self.timeout).await.map_err(tool_failure)?;
        if !output.status.success() {
            return Err(classify_failure(&output));
        }
        parse_preflight(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            ScoutError::SourceUnavailable(format!("{url}: yt-dlp reported no output file"))
        })
    }

    fn base_command(&self, template: &Path, selector: &str) -> Command {
        let mut cmd = Command::new(&self.yt_dlp);
        cmd.args(["--no-playlist", "--no-warnings", "--no-progress"])
            .args(["--format", selector])
            .args(["--merge-output-format", "mp4"])
            .arg("--output")
            .arg(template);
        cmd
    }
}

async fn existing_size(path: &Path) -> Option<u64> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Some(meta.len()),
        _ => None,
    }
}

fn last_line(stdout: &str) -> Option<&str> {
    stdout.lines().rev().map(str::trim).find(|l| !l.is_empty())
}

/// Parse the `filename` / `duration` lines of the preflight run.
/// A missing or `NA` duration becomes 0.
pub fn parse_preflight(stdout: &str) -> Option<(PathBuf, f64)> {
    let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
    let path = PathBuf::from(lines.next()?);
    let duration = lines
        .next()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);
    Some((path, duration))
}

fn classify_failure(output: &std::process::Output) -> ScoutError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let summary = stderr_summary(output);
    if is_disk_write_failure(&stderr) {
        ScoutError::DiskWrite(summary)
    } else if stderr.contains("Unsupported URL") {
        // No yt-dlp extractor claims the address.
        ScoutError::InvalidUrl(summary)
    } else {
        ScoutError::SourceUnavailable(summary)
    }
}

fn tool_failure(err: ToolError) -> ScoutError {
    ScoutError::SourceUnavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_parse() {
        assert_eq!(Quality::from("best"), Quality::Best);
        assert_eq!(Quality::from(""), Quality::Best);
        assert_eq!(Quality::from("WORST"), Quality::Worst);
        assert_eq!(Quality::from("720p"), Quality::MaxHeight(720));
        assert_eq!(Quality::from("30080"), Quality::Custom("30080".into()));
        assert_eq!(
            Quality::from("bv*[ext=mp4]"),
            Quality::Custom("bv*[ext=mp4]".into())
        );
    }

    #[test]
    fn test_selectors_fall_back_to_best() {
        for q in [
            Quality::Best,
            Quality::Worst,
            Quality::MaxHeight(480),
            Quality::Custom("nonsense".into()),
        ] {
            assert!(q.format_selector().ends_with("/best"), "{q:?}");
        }
        assert_eq!(
            Quality::MaxHeight(480).format_selector(),
            "bestvideo[height<=480]+bestaudio/best[height<=480]/best"
        );
    }

    #[test]
    fn test_parse_preflight() {
        let (path, duration) = parse_preflight("videos/BV1xx411c7mD.mp4\n725.0\n").unwrap();
        assert_eq!(path, PathBuf::from("videos/BV1xx411c7mD.mp4"));
        assert_eq!(duration, 725.0);

        let (_, duration) = parse_preflight("videos/x.mp4\nNA\n").unwrap();
        assert_eq!(duration, 0.0);

        assert!(parse_preflight("\n \n").is_none());
    }
}
