use scout_config::ScoutConfig;
use scout_trending::{TrendingCollector, parse_count};
use scout_types::Result;

use crate::output;

pub async fn fetch_trending(config: &ScoutConfig, count: &str, since: &str) -> Result<()> {
    let count = parse_count(count)?;
    let collector = TrendingCollector::new(&config.http, &config.trending)?;
    let entries = collector.fetch_trending(count, since).await?;
    output::print_json(&entries)
}
