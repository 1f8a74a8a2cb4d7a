//! Bilibili web API client: video metadata, subtitles and hot comments.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use scout_config::{BilibiliConfig, HttpConfig};
use scout_types::{
    Comment, Owner, Result, ScoutError, SubtitleSegment, SubtitleTrack, VideoMetadata, VideoStats,
    format_duration,
};

use crate::resolver::{self, ResolvedUrl};
use crate::source::VideoSource;

// ──────────────────── Wire Types ────────────────────

/// Envelope shared by every `api.bilibili.com` endpoint.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct ApiResponse<T> {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ViewData {
    bvid: String,
    aid: u64,
    cid: u64,
    title: String,
    #[serde(default)]
    desc: String,
    #[serde(default)]
    duration: i64,
    #[serde(default)]
    pic: Option<String>,
    #[serde(default)]
    pubdate: Option<i64>,
    owner: ViewOwner,
    stat: ViewStat,
    #[serde(default)]
    tag: Vec<ViewTag>,
}

#[derive(Debug, Deserialize)]
struct ViewOwner {
    name: String,
    #[serde(default)]
    mid: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ViewStat {
    #[serde(default)]
    view: i64,
    #[serde(default)]
    like: i64,
    #[serde(default)]
    coin: i64,
    #[serde(default)]
    favorite: Option<i64>,
    #[serde(default)]
    share: Option<i64>,
    #[serde(default)]
    danmaku: Option<i64>,
    #[serde(default)]
    reply: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ViewTag {
    tag_name: String,
}

#[derive(Debug, Deserialize)]
struct PlayerData {
    #[serde(default)]
    subtitle: Option<PlayerSubtitles>,
}

#[derive(Debug, Deserialize)]
struct PlayerSubtitles {
    #[serde(default)]
    subtitles: Vec<SubtitleRef>,
}

#[derive(Debug, Deserialize)]
struct SubtitleRef {
    lan: String,
    #[serde(default)]
    lan_doc: Option<String>,
    subtitle_url: String,
}

#[derive(Debug, Deserialize)]
struct SubtitleBody {
    #[serde(default)]
    body: Vec<SubtitleLine>,
}

#[derive(Debug, Deserialize)]
struct SubtitleLine {
    from: f64,
    to: f64,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ReplyData {
    #[serde(default)]
    replies: Option<Vec<Reply>>,
}

#[derive(Debug, Deserialize)]
struct Reply {
    member: ReplyMember,
    content: ReplyContent,
    #[serde(default)]
    like: i64,
}

#[derive(Debug, Deserialize)]
struct ReplyMember {
    uname: String,
}

#[derive(Debug, Deserialize)]
struct ReplyContent {
    message: String,
}

fn non_negative(v: i64) -> u64 {
    v.max(0) as u64
}

impl ViewData {
    fn into_metadata(self) -> VideoMetadata {
        let duration = non_negative(self.duration);
        VideoMetadata {
            url: resolver::watch_url(&self.bvid),
            id: self.bvid,
            aid: self.aid,
            cid: self.cid,
            title: self.title,
            description: self.desc,
            duration,
            duration_formatted: format_duration(duration),
            cover: self.pic.filter(|p| !p.is_empty()),
            published_at: self
                .pubdate
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.to_rfc3339()),
            owner: Owner {
                name: self.owner.name,
                mid: self.owner.mid,
            },
            stats: VideoStats {
                views: non_negative(self.stat.view),
                likes: non_negative(self.stat.like),
                coins: non_negative(self.stat.coin),
                favorites: self.stat.favorite.map(non_negative),
                shares: self.stat.share.map(non_negative),
                danmaku: self.stat.danmaku.map(non_negative),
                replies: self.stat.reply.map(non_negative),
            },
            tags: self.tag.into_iter().map(|t| t.tag_name).collect(),
            subtitles: Vec::new(),
            top_comments: Vec::new(),
        }
    }
}

/// Subtitle URLs are usually protocol-relative (`//aisubtitle.hdslb.com/...`).
fn absolute_subtitle_url(raw: &str) -> String {
    if raw.starts_with("//") {
        format!("https:{raw}")
    } else {
        raw.to_string()
    }
}

// ──────────────────── Client ────────────────────

/// HTTP client for the public Bilibili web API.
pub struct BilibiliClient {
    client: Client,
    /// Same settings as `client` but never follows redirects.
    short_links: Client,
    api_base: String,
    referer: String,
    comment_count: u32,
    short_link_host: String,
}

impl BilibiliClient {
    pub fn new(http: &HttpConfig, cfg: &BilibiliConfig) -> Result<Self> {
        let builder = || {
            Client::builder()
                .user_agent(http.user_agent.as_str())
                .timeout(Duration::from_secs(http.timeout_secs))
        };
        let client = builder()
            .build()
            .map_err(|e| ScoutError::source_unavailable("failed to create HTTP client", e))?;
        let short_links = builder()
            .redirect(Policy::none())
            .build()
            .map_err(|e| ScoutError::source_unavailable("failed to create HTTP client", e))?;
        Ok(Self {
            client,
            short_links,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            referer: cfg.referer.clone(),
            comment_count: cfg.comment_count,
            short_link_host: cfg.short_link_host.trim().to_string(),
        })
    }

    /// Fetch metadata for a Bilibili video URL.
    ///
    /// Subtitles and comments are best effort: any failure there leaves the
    /// corresponding list empty instead of failing the call.
    pub async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata> {
        let bvid = self.resolve_bvid(url).await?;
        tracing::info!(bvid = %bvid, "Fetching video info");

        let view = self.fetch_view(&bvid).await?;
        let (aid, cid) = (view.aid, view.cid);
        let mut meta = view.into_metadata();

        meta.subtitles = match self.fetch_subtitles(&bvid, cid).await {
            Ok(tracks) => tracks,
            Err(e) => {
                tracing::warn!(bvid = %bvid, "Subtitles unavailable: {e}");
                Vec::new()
            }
        };
        meta.top_comments = match self.fetch_top_comments(aid).await {
            Ok(comments) => comments,
            Err(e) => {
                tracing::warn!(bvid = %bvid, "Comments unavailable: {e}");
                Vec::new()
            }
        };

        Ok(meta)
    }

    async fn resolve_bvid(&self, url: &str) -> Result<String> {
        match resolver::resolve(url, &self.short_link_host)? {
            ResolvedUrl::Video { bvid } => Ok(bvid),
            ResolvedUrl::ShortLink(short) => {
                let target = self.follow_short_link(&short).await?;
                tracing::debug!(short = %short, target = %target, "Followed short link");
                match resolver::resolve(target.as_str(), &self.short_link_host)? {
                    ResolvedUrl::Video { bvid } => Ok(bvid),
                    ResolvedUrl::ShortLink(_) => Err(ScoutError::InvalidUrl(format!(
                        "{url}: short link did not lead to a video"
                    ))),
                }
            }
        }
    }

    /// Follow exactly one redirect hop and return its target.
    async fn follow_short_link(&self, short: &Url) -> Result<Url> {
        let resp = self
            .short_links
            .get(short.clone())
            .send()
            .await
            .map_err(|e| ScoutError::source_unavailable("short link lookup failed", e))?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(ScoutError::SourceUnavailable(format!(
                "short link lookup returned HTTP {status}"
            )));
        }
        if !status.is_redirection() {
            return Err(ScoutError::InvalidUrl(format!(
                "{short}: short link did not redirect (HTTP {status})"
            )));
        }
        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ScoutError::InvalidUrl(format!("{short}: redirect has no Location header"))
            })?;
        short
            .join(location)
            .map_err(|e| ScoutError::InvalidUrl(format!("{short}: bad redirect target: {e}")))
    }

    async fn fetch_view(&self, bvid: &str) -> Result<ViewData> {
        let url = format!("{}/x/web-interface/view?bvid={bvid}", self.api_base);
        let resp: ApiResponse<ViewData> = self.get_json(&url, "view request").await?;
        if resp.code != 0 {
            return Err(ScoutError::SourceUnavailable(format!(
                "video {bvid} unavailable (code {}): {}",
                resp.code, resp.message
            )));
        }
        resp.data.ok_or_else(|| {
            ScoutError::SourceUnavailable(format!("video {bvid}: view response has no data"))
        })
    }

    async fn fetch_subtitles(&self, bvid: &str, cid: u64) -> Result<Vec<SubtitleTrack>> {
        let url = format!("{}/x/player/v2?bvid={bvid}&cid={cid}", self.api_base);
        let resp: ApiResponse<PlayerData> = self.get_json(&url, "player request").await?;
        if resp.code != 0 {
            return Err(ScoutError::SourceUnavailable(format!(
                "player info (code {}): {}",
                resp.code, resp.message
            )));
        }
        let refs = resp
            .data
            .and_then(|d| d.subtitle)
            .map(|s| s.subtitles)
            .unwrap_or_default();

        let mut tracks = Vec::with_capacity(refs.len());
        for track in refs {
            let url = absolute_subtitle_url(&track.subtitle_url);
            let body: SubtitleBody = match self.get_json(&url, "subtitle download").await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(language = %track.lan, "Skipping subtitle track: {e}");
                    continue;
                }
            };
            tracks.push(SubtitleTrack {
                language: track.lan,
                label: track.lan_doc,
                segments: body
                    .body
                    .into_iter()
                    .map(|l| SubtitleSegment {
                        from: l.from,
                        to: l.to,
                        text: l.content,
                    })
                    .collect(),
            });
        }
        Ok(tracks)
    }

    async fn fetch_top_comments(&self, aid: u64) -> Result<Vec<Comment>> {
        // sort=2 orders by popularity.
        let url = format!(
            "{}/x/v2/reply?type=1&oid={aid}&sort=2&ps={}",
            self.api_base, self.comment_count
        );
        let resp: ApiResponse<ReplyData> = self.get_json(&url, "comment request").await?;
        if resp.code != 0 {
            return Err(ScoutError::SourceUnavailable(format!(
                "comments (code {}): {}",
                resp.code, resp.message
            )));
        }
        Ok(resp
            .data
            .and_then(|d| d.replies)
            .unwrap_or_default()
            .into_iter()
            .take(self.comment_count as usize)
            .map(|r| Comment {
                author: r.member.uname,
                text: r.content.message,
                score: non_negative(r.like),
            })
            .collect())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, context: &str) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .header("Referer", &self.referer)
            .send()
            .await
            .map_err(|e| ScoutError::source_unavailable(context, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScoutError::SourceUnavailable(format!(
                "{context} returned HTTP {status}"
            )));
        }
        resp.json()
            .await
            .map_err(|e| ScoutError::source_unavailable(context, e))
    }
}

#[async_trait]
impl VideoSource for BilibiliClient {
    fn id(&self) -> &str {
        "bilibili"
    }

    fn recognizes(&self, url: &str) -> bool {
        resolver::resolve(url, &self.short_link_host).is_ok()
    }

    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata> {
        BilibiliClient::fetch_metadata(self, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW_JSON: &str = r#"{
        "code": 0, "message": "0", "ttl": 1,
        "data": {
            "bvid": "BV1xx411c7mD", "aid": 2, "cid": 62131, "videos": 1,
            "title": "字幕君交流场所", "desc": "www", "duration": 2403,
            "pic": "http://i0.hdslb.com/bfs/archive/cover.jpg", "pubdate": 1256995125,
            "owner": { "mid": 2, "name": "碧诗", "face": "" },
            "stat": { "view": 3210, "danmaku": 12, "reply": 5, "favorite": 7,
                      "coin": 9, "share": 1, "like": 44 }
        }
    }"#;

    #[test]
    fn test_view_into_metadata() {
        let resp: ApiResponse<ViewData> = serde_json::from_str(VIEW_JSON).unwrap();
        assert_eq!(resp.code, 0);
        let meta = resp.data.unwrap().into_metadata();
        assert_eq!(meta.id, "BV1xx411c7mD");
        assert_eq!(meta.duration, 2403);
        assert_eq!(meta.duration_formatted, "40:03");
        assert_eq!(meta.owner.name, "碧诗");
        assert_eq!(meta.stats.views, 3210);
        assert_eq!(meta.stats.favorites, Some(7));
        assert_eq!(meta.url, "https://www.bilibili.com/video/BV1xx411c7mD");
        assert_eq!(
            meta.published_at.as_deref(),
            Some("2009-10-31T13:18:45+00:00")
        );
        assert!(meta.tags.is_empty());
        assert!(meta.subtitles.is_empty());
    }

    #[test]
    fn test_negative_counters_clamped() {
        let json = r#"{"bvid":"BV1xx411c7mD","aid":1,"cid":1,"title":"t","duration":-1,
            "owner":{"name":"n"},"stat":{"view":-1,"like":3,"coin":0}}"#;
        let view: ViewData = serde_json::from_str(json).unwrap();
        let meta = view.into_metadata();
        assert_eq!(meta.duration, 0);
        assert_eq!(meta.stats.views, 0);
        assert_eq!(meta.stats.likes, 3);
    }

    #[test]
    fn test_error_envelope_without_data() {
        let json = r#"{"code": -404, "message": "啥都木有", "ttl": 1}"#;
        let resp: ApiResponse<ViewData> = serde_json::from_str(json).unwrap();
        assert_eq!(resp.code, -404);
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_null_replies() {
        let json = r#"{"code": 0, "data": {"replies": null}}"#;
        let resp: ApiResponse<ReplyData> = serde_json::from_str(json).unwrap();
        assert!(resp.data.unwrap().replies.is_none());
    }

    #[test]
    fn test_absolute_subtitle_url() {
        assert_eq!(
            absolute_subtitle_url("//aisubtitle.hdslb.com/bfs/ai_subtitle/x.json"),
            "https://aisubtitle.hdslb.com/bfs/ai_subtitle/x.json"
        );
        assert_eq!(
            absolute_subtitle_url("http://127.0.0.1:9/sub.json"),
            "http://127.0.0.1:9/sub.json"
        );
    }
}
