//! Trending page parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use scout_types::TrendingWindow;

static ARTICLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<article[^>]*class="[^"]*\bBox-row\b[^"]*"[^>]*>(.*?)</article>"#).unwrap()
});
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<h2[^>]*>.*?<a[^>]*href="/([^"]+)""#).unwrap());
static DESCRIPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<p[^>]*class="[^"]*\bcol-9\b[^"]*"[^>]*>(.*?)</p>"#).unwrap()
});
static LANGUAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<span[^>]*itemprop="programmingLanguage"[^>]*>(.*?)</span>"#).unwrap()
});
static STARGAZERS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<a[^>]*href="/[^"]+/stargazers"[^>]*>.*?</svg>\s*([\d,]+)"#).unwrap()
});
// Older markup wraps the count in a span after the star icon.
static STAR_ICON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<svg[^>]*octicon-star[^>]*>.*?</svg>\s*<span[^>]*>([\d,]+)</span>"#).unwrap()
});
static PERIOD_SPAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<span[^>]*class="[^"]*\bfloat-sm-right\b[^"]*"[^>]*>(.*?)</span>"#).unwrap()
});
static PERIOD_STARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\d,]+)\s+stars?\s+(today|this week|this month)").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap());

/// One repository row, in page order and not yet ranked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRepo {
    pub full_name: String,
    pub description: String,
    pub primary_language: Option<String>,
    pub total_stars: u64,
    pub period_stars: u64,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no repository rows found on the page")]
    NoRows,
    #[error("page shows stars for \"{found}\" but \"{expected}\" was requested")]
    WindowMismatch {
        expected: &'static str,
        found: String,
    },
}

/// Turns a trending listing page into repository rows.
pub trait TrendingParser: Send + Sync {
    fn parse(&self, html: &str, window: TrendingWindow) -> Result<Vec<ParsedRepo>, ParseError>;
}

/// Parser for the github.com trending page markup.
#[derive(Debug, Default, Clone, Copy)]
pub struct GithubHtmlParser;

impl TrendingParser for GithubHtmlParser {
    fn parse(&self, html: &str, window: TrendingWindow) -> Result<Vec<ParsedRepo>, ParseError> {
        let mut repos = Vec::new();
        for block in ARTICLE_RE.captures_iter(html) {
            let block = block.get(1).map_or("", |m| m.as_str());
            match parse_row(block, window)? {
                Some(repo) => repos.push(repo),
                None => tracing::warn!("Skipping trending row without a repository link"),
            }
        }
        if repos.is_empty() {
            return Err(ParseError::NoRows);
        }
        Ok(repos)
    }
}

fn parse_row(block: &str, window: TrendingWindow) -> Result<Option<ParsedRepo>, ParseError> {
    let Some(full_name) = NAME_RE
        .captures(block)
        .map(|c| WS_RE.replace_all(c[1].trim(), "").into_owned())
        .filter(|n| n.contains('/'))
    else {
        return Ok(None);
    };

    let description = DESCRIPTION_RE
        .captures(block)
        .map(|c| clean_text(&c[1]))
        .unwrap_or_default();

    let primary_language = LANGUAGE_RE
        .captures(block)
        .map(|c| clean_text(&c[1]))
        .filter(|l| !l.is_empty());

    let total_stars = STARGAZERS_RE
        .captures(block)
        .or_else(|| STAR_ICON_RE.captures(block))
        .map(|c| parse_number(&c[1]))
        .unwrap_or(0);

    let period_stars = match PERIOD_SPAN_RE
        .captures(block)
        .map(|c| clean_text(&c[1]))
        .and_then(|text| {
            PERIOD_STARS_RE
                .captures(&text)
                .map(|c| (parse_number(&c[1]), c[2].to_string()))
        }) {
        Some((stars, label)) if label == window.period_label() => stars,
        Some((_, label)) => {
            return Err(ParseError::WindowMismatch {
                expected: window.period_label(),
                found: label,
            });
        }
        None => 0,
    };

    Ok(Some(ParsedRepo {
        full_name,
        description,
        primary_language,
        total_stars,
        period_stars,
    }))
}

/// Strip tags, decode entities, collapse whitespace.
fn clean_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    WS_RE.replace_all(&decoded, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name.strip_prefix("#x").or(name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse().ok().and_then(char::from_u32)
            } else {
                match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn parse_number(raw: &str) -> u64 {
    raw.replace(',', "").parse().unwrap_or(0)
}
