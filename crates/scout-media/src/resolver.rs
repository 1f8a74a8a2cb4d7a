//! Bilibili URL recognition.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use scout_types::{Result, ScoutError};

static BVID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bBV[0-9A-Za-z]{10}\b").unwrap());

/// Outcome of resolving a user-supplied URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedUrl {
    /// A watch URL with its BV id.
    Video { bvid: String },
    /// A short link (`b23.tv` by default) that must be followed to find the BV id.
    ShortLink(Url),
}

/// Parse `raw` and check it belongs to Bilibili. Links on `short_link_host`
/// are classified as short links. Performs no I/O.
pub fn resolve(raw: &str, short_link_host: &str) -> Result<ResolvedUrl> {
    let url = parse_http_url(raw)?;
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();

    if host_matches(&host, &short_link_host.to_ascii_lowercase()) {
        return Ok(ResolvedUrl::ShortLink(url));
    }
    if !host_matches(&host, "bilibili.com") {
        return Err(ScoutError::InvalidUrl(format!(
            "{raw}: host \"{host}\" is not a Bilibili address"
        )));
    }

    if let Some(m) = BVID_RE.find(url.path()) {
        return Ok(ResolvedUrl::Video {
            bvid: m.as_str().to_string(),
        });
    }
    url.query_pairs()
        .find(|(k, v)| k == "bvid" && is_bvid(v))
        .map(|(_, v)| ResolvedUrl::Video {
            bvid: v.into_owned(),
        })
        .ok_or_else(|| ScoutError::InvalidUrl(format!("{raw}: no BV id in URL")))
}

/// Parse an absolute http(s) URL.
pub fn parse_http_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ScoutError::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        scheme => Err(ScoutError::InvalidUrl(format!(
            "{raw}: unsupported scheme \"{scheme}\""
        ))),
    }
}

/// True for a complete BV id.
pub fn is_bvid(candidate: &str) -> bool {
    candidate.len() == 12
        && BVID_RE
            .find(candidate)
            .is_some_and(|m| m.as_str() == candidate)
}

/// Canonical watch URL for a BV id.
pub fn watch_url(bvid: &str) -> String {
    format!("https://www.bilibili.com/video/{bvid}")
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT: &str = "b23.tv";

    fn bvid_of(raw: &str) -> String {
        match resolve(raw, SHORT).unwrap() {
            ResolvedUrl::Video { bvid } => bvid,
            other => panic!("Expected video, got {other:?}"),
        }
    }

    #[test]
    fn test_watch_urls() {
        assert_eq!(
            bvid_of("https://www.bilibili.com/video/BV1xx411c7mD"),
            "BV1xx411c7mD"
        );
        assert_eq!(
            bvid_of("https://m.bilibili.com/video/BV1xx411c7mD/?p=2&share_source=copy"),
            "BV1xx411c7mD"
        );
        assert_eq!(
            bvid_of("https://www.bilibili.com/festival/x?bvid=BV1GJ411x7h7"),
            "BV1GJ411x7h7"
        );
    }

    #[test]
    fn test_short_link() {
        assert!(matches!(
            resolve("https://b23.tv/AbCdEf", SHORT).unwrap(),
            ResolvedUrl::ShortLink(_)
        ));
    }

    #[test]
    fn test_custom_short_link_host() {
        assert!(matches!(
            resolve("http://127.0.0.1:8080/AbCdEf", "127.0.0.1").unwrap(),
            ResolvedUrl::ShortLink(_)
        ));
        // The default host is no longer special once another is configured.
        assert!(matches!(
            resolve("https://b23.tv/AbCdEf", "127.0.0.1"),
            Err(ScoutError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_rejects_other_hosts() {
        let err = resolve("https://www.youtube.com/watch?v=BV1xx411c7mD", SHORT).unwrap_err();
        assert!(matches!(err, ScoutError::InvalidUrl(_)));
        // Lookalike domains must not pass the suffix check.
        assert!(resolve("https://notbilibili.com/video/BV1xx411c7mD", SHORT).is_err());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(resolve("not a url", SHORT), Err(ScoutError::InvalidUrl(_))));
        assert!(matches!(
            resolve("ftp://www.bilibili.com/video/BV1xx411c7mD", SHORT),
            Err(ScoutError::InvalidUrl(_))
        ));
        assert!(matches!(
            resolve("https://www.bilibili.com/video/av170001", SHORT),
            Err(ScoutError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_is_bvid() {
        assert!(is_bvid("BV1xx411c7mD"));
        assert!(!is_bvid("BV1xx411c7m"));
        assert!(!is_bvid("BV1xx411c7mDx"));
    }
}
