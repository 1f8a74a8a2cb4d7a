//! Fetching and ranking the trending listing.

use std::time::Duration;

use reqwest::Client;

use scout_config::{HttpConfig, TrendingConfig};
use scout_types::{Result, ScoutError, TrendingEntry, TrendingWindow};

use crate::parser::{GithubHtmlParser, ParsedRepo, TrendingParser};

pub struct TrendingCollector {
    client: Client,
    base_url: String,
    parser: Box<dyn TrendingParser>,
}

impl TrendingCollector {
    pub fn new(http: &HttpConfig, cfg: &TrendingConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(http.user_agent.as_str())
            .timeout(Duration::from_secs(http.timeout_secs))
            .build()
            .map_err(|e| ScoutError::source_unavailable("failed to create HTTP client", e))?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            parser: Box::new(GithubHtmlParser),
        })
    }

    /// Replace the page parser.
    pub fn with_parser(mut self, parser: impl TrendingParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Fetch the listing for `since` and return at most `count` ranked entries.
    ///
    /// Arguments are validated before any request is made.
    pub async fn fetch_trending(&self, count: usize, since: &str) -> Result<Vec<TrendingEntry>> {
        if count == 0 {
            return Err(ScoutError::InvalidArgument(
                "count must be at least 1".to_string(),
            ));
        }
        let window: TrendingWindow = since.parse()?;

        let html = self.fetch_page(window).await?;
        let repos = self
            .parser
            .parse(&html, window)
            .map_err(|e| ScoutError::source_unavailable("trending page", e))?;

        let entries = rank_entries(repos, count, &self.base_url);
        tracing::info!(window = %window, count = entries.len(), "Collected trending repositories");
        Ok(entries)
    }

    async fn fetch_page(&self, window: TrendingWindow) -> Result<String> {
        let url = format!("{}/trending?since={}", self.base_url, window.as_str());
        tracing::debug!(url = %url, "Fetching trending page");

        let resp = self
            .client
            .get(&url)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await
            .map_err(|e| ScoutError::source_unavailable("trending request", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScoutError::SourceUnavailable(format!(
                "trending page returned HTTP {status}"
            )));
        }
        resp.text()
            .await
            .map_err(|e| ScoutError::source_unavailable("trending page", e))
    }
}

/// Keep the first `count` rows and number them from 1.
pub fn rank_entries(repos: Vec<ParsedRepo>, count: usize, base_url: &str) -> Vec<TrendingEntry> {
    repos
        .into_iter()
        .take(count)
        .zip(1u32..)
        .map(|(repo, rank)| TrendingEntry {
            rank,
            url: format!("{base_url}/{}", repo.full_name),
            full_name: repo.full_name,
            description: repo.description,
            primary_language: repo.primary_language,
            total_stars: repo.total_stars,
            period_stars: repo.period_stars,
        })
        .collect()
}

/// Parse a user-supplied count. Zero, negative and non-numeric values are rejected.
pub fn parse_count(raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ScoutError::InvalidArgument(format!(
            "count must be a positive integer, got \"{raw}\""
        ))),
    }
}
