use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod error;

pub use error::{Result, ScoutError};

// ──────────────────── Video Metadata ────────────────────

/// Metadata for a single video, as produced by the fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Platform-assigned id (Bilibili BV id).
    pub id: String,
    /// Numeric archive id, used for the comment endpoint.
    pub aid: u64,
    /// Content id of the first page, used for the subtitle endpoint.
    pub cid: u64,
    pub title: String,
    pub description: String,
    /// Length in whole seconds.
    pub duration: u64,
    /// `MM:SS`, or `HH:MM:SS` past one hour.
    pub duration_formatted: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    /// Publication time, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    pub owner: Owner,
    pub stats: VideoStats,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Canonical watch URL.
    pub url: String,
    /// Subtitle tracks; empty when the video has none or they could not be fetched.
    #[serde(default)]
    pub subtitles: Vec<SubtitleTrack>,
    /// Hot comments; empty when unavailable.
    #[serde(default)]
    pub top_comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoStats {
    pub views: u64,
    pub likes: u64,
    pub coins: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorites: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub danmaku: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<u64>,
}

/// One subtitle track in one language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleTrack {
    /// Language code (e.g. "zh-CN", "ai-zh").
    pub language: String,
    /// Human-readable language label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub segments: Vec<SubtitleSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleSegment {
    /// Start offset in seconds.
    pub from: f64,
    /// End offset in seconds.
    pub to: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    /// Like count.
    pub score: u64,
}

/// Format whole seconds as `MM:SS`, or `HH:MM:SS` past one hour.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

// ──────────────────── Media Types ────────────────────

/// A media asset on local disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    pub path: PathBuf,
    pub source_url: String,
    /// Size in bytes.
    pub size: u64,
    /// Duration in seconds.
    pub duration: f64,
}

/// A still image extracted from a media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Offset into the source in seconds.
    pub timestamp: f64,
    pub image_path: PathBuf,
}

/// Frame sampling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "seconds", rename_all = "snake_case")]
pub enum ExtractionPolicy {
    /// One frame every `n` seconds.
    FixedInterval(u32),
    /// Chosen from the media duration.
    Auto,
    /// One frame per detected visual discontinuity.
    SceneChange,
}

impl FromStr for ExtractionPolicy {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "scene" | "scene_change" => Ok(Self::SceneChange),
            other => match other.parse::<u32>() {
                Ok(n) if n > 0 => Ok(Self::FixedInterval(n)),
                _ => Err(ScoutError::InvalidArgument(format!(
                    "interval must be a positive number of seconds, \"auto\" or \"scene\", got \"{s}\""
                ))),
            },
        }
    }
}

/// Evenly spaced subset of extracted frames, prepared for a vision step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSample {
    pub total_frames: usize,
    pub analyzed_frames: usize,
    pub frames: Vec<SampledFrame>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampledFrame {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub mime_type: String,
    pub base64_length: usize,
    /// Base64 image data, only when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

// ──────────────────── Trending Types ────────────────────

/// Time range over which trending star gain is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendingWindow {
    Daily,
    Weekly,
    Monthly,
}

impl TrendingWindow {
    /// Value of the `since` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Suffix the listing page prints after the period star count.
    pub fn period_label(&self) -> &'static str {
        match self {
            Self::Daily => "today",
            Self::Weekly => "this week",
            Self::Monthly => "this month",
        }
    }
}

impl fmt::Display for TrendingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendingWindow {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(ScoutError::InvalidArgument(format!(
                "since must be one of: daily, weekly, monthly (got \"{other}\")"
            ))),
        }
    }
}

/// One ranked repository from a trending listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingEntry {
    /// 1-based position in the result set.
    pub rank: u32,
    /// "owner/repo".
    pub full_name: String,
    /// Empty when the repository has no description.
    pub description: String,
    pub primary_language: Option<String>,
    pub total_stars: u64,
    /// Stars gained within the requested window.
    pub period_stars: u64,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(725), "12:05");
        assert_eq!(format_duration(3661), "01:01:01");
    }

    #[test]
    fn test_extraction_policy_parse() {
        assert_eq!("auto".parse::<ExtractionPolicy>().unwrap(), ExtractionPolicy::Auto);
        assert_eq!(
            "Scene".parse::<ExtractionPolicy>().unwrap(),
            ExtractionPolicy::SceneChange
        );
        assert_eq!(
            "15".parse::<ExtractionPolicy>().unwrap(),
            ExtractionPolicy::FixedInterval(15)
        );
        assert!(matches!(
            "0".parse::<ExtractionPolicy>(),
            Err(ScoutError::InvalidArgument(_))
        ));
        assert!(matches!(
            "often".parse::<ExtractionPolicy>(),
            Err(ScoutError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_trending_window_parse() {
        assert_eq!("weekly".parse::<TrendingWindow>().unwrap(), TrendingWindow::Weekly);
        assert_eq!(TrendingWindow::Monthly.period_label(), "this month");
        assert!(matches!(
            "invalid".parse::<TrendingWindow>(),
            Err(ScoutError::InvalidArgument(_))
        ));
        // Case matters: the listing only accepts lowercase values.
        assert!("Daily".parse::<TrendingWindow>().is_err());
    }

    #[test]
    fn test_metadata_lists_always_serialized() {
        let meta = VideoMetadata {
            id: "BV1xx411c7mD".into(),
            aid: 1,
            cid: 2,
            title: "t".into(),
            description: String::new(),
            duration: 90,
            duration_formatted: format_duration(90),
            cover: None,
            published_at: None,
            owner: Owner {
                name: "up".into(),
                mid: None,
            },
            stats: VideoStats::default(),
            tags: vec![],
            url: "https://www.bilibili.com/video/BV1xx411c7mD".into(),
            subtitles: vec![],
            top_comments: vec![],
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["subtitles"], serde_json::json!([]));
        assert_eq!(json["top_comments"], serde_json::json!([]));
        assert!(json.get("cover").is_none());
    }

    #[test]
    fn test_metadata_missing_lists_default_empty() {
        let json = r#"{
            "id": "BV1xx411c7mD", "aid": 1, "cid": 2, "title": "t", "description": "",
            "duration": 5, "duration_formatted": "00:05",
            "owner": {"name": "up"}, "stats": {"views": 1, "likes": 2, "coins": 3},
            "url": "https://www.bilibili.com/video/BV1xx411c7mD"
        }"#;
        let meta: VideoMetadata = serde_json::from_str(json).unwrap();
        assert!(meta.subtitles.is_empty());
        assert!(meta.top_comments.is_empty());
        assert!(meta.tags.is_empty());
    }

    #[test]
    fn test_extraction_policy_serde() {
        let json = serde_json::to_string(&ExtractionPolicy::FixedInterval(10)).unwrap();
        assert_eq!(json, r#"{"type":"fixed_interval","seconds":10}"#);
        let json = serde_json::to_string(&ExtractionPolicy::Auto).unwrap();
        assert_eq!(json, r#"{"type":"auto"}"#);
    }
}
