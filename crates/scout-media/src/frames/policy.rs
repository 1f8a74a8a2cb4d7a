//! Timestamp selection that does not need to look at pixels.

use scout_types::ExtractionPolicy;

/// Videos shorter than this get a fixed 10 s interval under `Auto`.
pub const SHORT_VIDEO_SECS: f64 = 300.0;
/// Videos at least this long get a fixed 30 s interval under `Auto`.
pub const LONG_VIDEO_SECS: f64 = 1800.0;

/// Distance kept from the end of the stream so the decoder still has a frame to return.
pub const END_BACKOFF_SECS: f64 = 0.1;

/// A policy with `Auto` already decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedPolicy {
    FixedInterval(u32),
    SceneChange,
}

impl ResolvedPolicy {
    /// File name prefix of rendered frames.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::FixedInterval(_) => "frame",
            Self::SceneChange => "scene",
        }
    }
}

/// Decide `Auto` from the duration. Explicit policies pass through.
pub fn resolve_policy(policy: ExtractionPolicy, duration: f64) -> ResolvedPolicy {
    match policy {
        ExtractionPolicy::FixedInterval(n) => ResolvedPolicy::FixedInterval(n.max(1)),
        ExtractionPolicy::SceneChange => ResolvedPolicy::SceneChange,
        ExtractionPolicy::Auto if duration < SHORT_VIDEO_SECS => ResolvedPolicy::FixedInterval(10),
        ExtractionPolicy::Auto if duration < LONG_VIDEO_SECS => ResolvedPolicy::SceneChange,
        ExtractionPolicy::Auto => ResolvedPolicy::FixedInterval(30),
    }
}

/// `0, n, 2n, …` up to the end of the stream, plus one closing frame near
/// the end when the last multiple falls short of it.
pub fn fixed_interval_timestamps(duration: f64, interval: u32) -> Vec<f64> {
    let step = f64::from(interval.max(1));
    let last = (duration - END_BACKOFF_SECS).max(0.0);

    let mut out = vec![0.0];
    let mut k: u64 = 1;
    loop {
        let t = k as f64 * step;
        if t > last {
            break;
        }
        out.push(t);
        k += 1;
    }

    if out.last().is_some_and(|prev| last > *prev) {
        out.push(last);
    }
    out
}
