//! Video metadata sources and URL routing.

use async_trait::async_trait;

use scout_types::{Result, ScoutError, VideoMetadata};

use crate::resolver;

/// A platform that can turn a watch URL into [`VideoMetadata`].
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Source identifier.
    fn id(&self) -> &str;
    /// Whether this source handles `url`. Must not perform I/O.
    fn recognizes(&self, url: &str) -> bool;
    /// Fetch metadata for `url`.
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata>;
}

/// Routes a URL to the first source that recognizes it.
pub struct SourceRouter {
    sources: Vec<Box<dyn VideoSource>>,
}

impl SourceRouter {
    pub fn new(sources: Vec<Box<dyn VideoSource>>) -> Self {
        Self { sources }
    }

    fn source_for(&self, url: &str) -> Option<&dyn VideoSource> {
        self.sources
            .iter()
            .find(|s| s.recognizes(url))
            .map(|s| s.as_ref())
    }

    /// Fetch metadata, failing with `InvalidUrl` before any network call
    /// when no source recognizes the URL.
    pub async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata> {
        resolver::parse_http_url(url)?;
        let source = self.source_for(url).ok_or_else(|| {
            ScoutError::InvalidUrl(format!("{url}: no resolver recognizes this URL"))
        })?;
        tracing::debug!(source = source.id(), "Routing metadata request");
        source.fetch_metadata(url).await
    }
}
