//! scout-trending: ranked listing of trending repositories.

pub mod collector;
pub mod parser;

pub use collector::{TrendingCollector, parse_count};
pub use parser::{GithubHtmlParser, ParseError, ParsedRepo, TrendingParser};
