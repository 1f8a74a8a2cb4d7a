use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON5 parse error: {0}")]
    Json5(#[from] json5::Error),
    #[error("Config directory not found")]
    NoDirFound,
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Outbound HTTP settings shared by the fetcher and the trending collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_http_timeout() -> u64 {
    15
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Bilibili API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BilibiliConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_referer")]
    pub referer: String,
    /// Number of hot comments to request.
    #[serde(default = "default_comment_count")]
    pub comment_count: u32,
    /// Host whose links redirect to a watch page.
    #[serde(default = "default_short_link_host")]
    pub short_link_host: String,
}

fn default_api_base() -> String {
    "https://api.bilibili.com".to_string()
}

fn default_referer() -> String {
    "https://www.bilibili.com".to_string()
}

fn default_comment_count() -> u32 {
    10
}

fn default_short_link_host() -> String {
    "b23.tv".to_string()
}

impl Default for BilibiliConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            referer: default_referer(),
            comment_count: default_comment_count(),
            short_link_host: default_short_link_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingConfig {
    /// Site root; the listing lives at `{base_url}/trending`.
    #[serde(default = "default_trending_base")]
    pub base_url: String,
}

fn default_trending_base() -> String {
    "https://github.com".to_string()
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            base_url: default_trending_base(),
        }
    }
}

/// External binaries and their time limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_yt_dlp")]
    pub yt_dlp: PathBuf,
    /// Explicit ffmpeg path; discovered when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg: Option<PathBuf>,
    /// Explicit ffprobe path; derived from ffmpeg when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffprobe: Option<PathBuf>,
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
    #[serde(default = "default_ffmpeg_timeout")]
    pub ffmpeg_timeout_secs: u64,
}

fn default_yt_dlp() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_download_timeout() -> u64 {
    1800
}

fn default_ffmpeg_timeout() -> u64 {
    600
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp: default_yt_dlp(),
            ffmpeg: None,
            ffprobe: None,
            download_timeout_secs: default_download_timeout(),
            ffmpeg_timeout_secs: default_ffmpeg_timeout(),
        }
    }
}

/// Frame extraction tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramesConfig {
    /// Fraction of the frame area that must change to count as a scene cut.
    #[serde(default = "default_scene_threshold")]
    pub scene_threshold: f64,
    /// Per-pixel luma delta (0-255) above which a pixel counts as changed.
    #[serde(default = "default_pixel_delta")]
    pub pixel_delta: u8,
    /// Minimum distance between two emitted scene frames.
    #[serde(default = "default_min_spacing")]
    pub min_spacing_secs: f64,
    /// Rate at which frames are sampled for scene detection.
    #[serde(default = "default_sample_fps")]
    pub sample_fps: f64,
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,
    /// ffmpeg `-q:v` value (2 = high quality).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_scene_threshold() -> f64 {
    0.3
}

fn default_pixel_delta() -> u8 {
    30
}

fn default_min_spacing() -> f64 {
    5.0
}

fn default_sample_fps() -> f64 {
    1.0
}

fn default_max_frames() -> usize {
    300
}

fn default_jpeg_quality() -> u8 {
    2
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            scene_threshold: default_scene_threshold(),
            pixel_delta: default_pixel_delta(),
            min_spacing_secs: default_min_spacing(),
            sample_fps: default_sample_fps(),
            max_frames: default_max_frames(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default download directory.
    #[serde(default = "default_videos_dir")]
    pub videos_dir: PathBuf,
}

fn default_videos_dir() -> PathBuf {
    PathBuf::from("./videos")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            videos_dir: default_videos_dir(),
        }
    }
}

/// Top-level scout configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoutConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub bilibili: BilibiliConfig,
    #[serde(default)]
    pub trending: TrendingConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub frames: FramesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl ScoutConfig {
    /// Apply `SCOUT_*` overrides using the given variable lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("SCOUT_YT_DLP") {
            self.tools.yt_dlp = PathBuf::from(path);
        }
        if let Some(path) = lookup("SCOUT_FFMPEG") {
            self.tools.ffmpeg = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("SCOUT_FFPROBE") {
            self.tools.ffprobe = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup("SCOUT_HTTP_TIMEOUT_SECS") {
            match raw.trim().parse() {
                Ok(secs) => self.http.timeout_secs = secs,
                Err(_) => tracing::warn!(value = %raw, "Ignoring non-numeric SCOUT_HTTP_TIMEOUT_SECS"),
            }
        }
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "http.timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }
        if self.bilibili.short_link_host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "bilibili.short_link_host",
                reason: "must not be empty".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.frames.scene_threshold) {
            return Err(ConfigError::Invalid {
                field: "frames.scene_threshold",
                reason: format!("{} is outside 0.0..=1.0", self.frames.scene_threshold),
            });
        }
        if self.frames.sample_fps.is_nan() || self.frames.sample_fps <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "frames.sample_fps",
                reason: "must be greater than zero".into(),
            });
        }
        if self.frames.min_spacing_secs < 0.0 {
            return Err(ConfigError::Invalid {
                field: "frames.min_spacing_secs",
                reason: "must not be negative".into(),
            });
        }
        if self.frames.max_frames == 0 {
            return Err(ConfigError::Invalid {
                field: "frames.max_frames",
                reason: "must be greater than zero".into(),
            });
        }
        if !(1..=31).contains(&self.frames.jpeg_quality) {
            return Err(ConfigError::Invalid {
                field: "frames.jpeg_quality",
                reason: format!("{} is outside 1..=31", self.frames.jpeg_quality),
            });
        }
        Ok(())
    }
}

/// Resolve the scout config directory (~/.scout/).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|h| h.join(".scout"))
        .ok_or(ConfigError::NoDirFound)
}

/// Resolve the config file path (~/.scout/config.json5).
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.json5"))
}

/// Load configuration from the default path (or `explicit`), then apply
/// environment overrides and validate.
pub fn load_config(explicit: Option<&Path>) -> Result<ScoutConfig, ConfigError> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    let mut config = load_config_from(&path)?;
    config.apply_env_overrides(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Load configuration from a specific path, falling back to defaults if not found.
pub fn load_config_from(path: &Path) -> Result<ScoutConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("Config file not found at {}, using defaults", path.display());
        return Ok(ScoutConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: ScoutConfig = json5::from_str(&content)?;
    Ok(config)
}
