//! Scene-change detection over a low-resolution grayscale sample stream.

use scout_config::FramesConfig;

/// Width of the sampled luma frames.
pub const SAMPLE_WIDTH: usize = 64;
/// Height of the sampled luma frames.
pub const SAMPLE_HEIGHT: usize = 36;
/// Bytes per sampled frame (one byte of luma per pixel).
pub const SAMPLE_FRAME_LEN: usize = SAMPLE_WIDTH * SAMPLE_HEIGHT;

#[derive(Debug, Clone, PartialEq)]
pub struct SceneParams {
    /// Fraction of changed pixels above which a cut is reported.
    pub threshold: f64,
    pub pixel_delta: u8,
    pub min_spacing: f64,
    pub sample_fps: f64,
    pub max_frames: usize,
}

impl From<&FramesConfig> for SceneParams {
    fn from(cfg: &FramesConfig) -> Self {
        Self {
            threshold: cfg.scene_threshold,
            pixel_delta: cfg.pixel_delta,
            min_spacing: cfg.min_spacing_secs,
            sample_fps: cfg.sample_fps,
            max_frames: cfg.max_frames,
        }
    }
}

/// One decoded sample.
#[derive(Debug, Clone, Copy)]
pub struct LumaSample<'a> {
    pub timestamp: f64,
    pub pixels: &'a [u8],
}

/// Fraction of pixels whose luma moved by more than `pixel_delta`.
pub fn changed_fraction(prev: &[u8], cur: &[u8], pixel_delta: u8) -> f64 {
    let len = prev.len().min(cur.len());
    if len == 0 {
        return 0.0;
    }
    let changed = prev
        .iter()
        .zip(cur)
        .filter(|&(a, b)| a.abs_diff(*b) > pixel_delta)
        .count();
    changed as f64 / len as f64
}

/// Split raw `gray` output into whole frames stamped by their sample index.
/// A trailing partial frame is ignored.
pub fn split_luma_frames(raw: &[u8], sample_fps: f64) -> Vec<LumaSample<'_>> {
    raw.chunks_exact(SAMPLE_FRAME_LEN)
        .enumerate()
        .map(|(i, pixels)| LumaSample {
            timestamp: i as f64 / sample_fps,
            pixels,
        })
        .collect()
}

/// Pick scene boundaries. The first sample is always kept; a later sample is
/// kept when it differs enough from the one before it and lies at least
/// `min_spacing` after the last kept timestamp. Never returns an empty list.
pub fn select_scene_timestamps(
    samples: &[LumaSample<'_>],
    params: &SceneParams,
    duration: f64,
) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::new();
    let mut prev: Option<&LumaSample<'_>> = None;

    for sample in samples {
        if out.len() >= params.max_frames {
            break;
        }
        if sample.timestamp > duration {
            break;
        }
        let keep = match (prev, out.last()) {
            (None, _) | (_, None) => true,
            (Some(p), Some(&last)) => {
                changed_fraction(p.pixels, sample.pixels, params.pixel_delta) > params.threshold
                    && sample.timestamp - last >= params.min_spacing
            }
        };
        if keep {
            out.push(sample.timestamp);
        }
        prev = Some(sample);
    }

    if out.is_empty() {
        out.push(0.0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SceneParams {
        SceneParams::from(&FramesConfig::default())
    }

    fn flat(level: u8) -> Vec<u8> {
        vec![level; SAMPLE_FRAME_LEN]
    }

    /// One frame per second: `levels[i]` is the uniform luma of second `i`.
    fn stream(levels: &[u8]) -> Vec<u8> {
        levels.iter().flat_map(|l| flat(*l)).collect()
    }

    #[test]
    fn test_changed_fraction() {
        let a = flat(10);
        let mut b = flat(10);
        for px in b.iter_mut().take(SAMPLE_FRAME_LEN / 4) {
            *px = 200;
        }
        assert_eq!(changed_fraction(&a, &a, 30), 0.0);
        assert_eq!(changed_fraction(&a, &b, 30), 0.25);
        // Exactly at the delta does not count.
        assert_eq!(changed_fraction(&flat(0), &flat(30), 30), 0.0);
        assert_eq!(changed_fraction(&[], &[], 30), 0.0);
    }

    #[test]
    fn test_split_ignores_partial_tail() {
        let mut raw = stream(&[0, 0, 0]);
        raw.extend_from_slice(&[1, 2, 3]);
        let samples = split_luma_frames(&raw, 2.0);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[2].timestamp, 1.0);
    }

    #[test]
    fn test_detects_cuts() {
        let mut levels = vec![0u8; 30];
        levels[10..20].fill(255);
        levels[20..].fill(0);
        let raw = stream(&levels);
        let samples = split_luma_frames(&raw, 1.0);
        let ts = select_scene_timestamps(&samples, &params(), 30.0);
        assert_eq!(ts, vec![0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_min_spacing_keeps_first() {
        // Cuts at 0, 6, 8 and 20: 8 is too close to 6.
        let mut levels = vec![0u8; 25];
        levels[6..8].fill(200);
        levels[8..20].fill(50);
        levels[20..].fill(250);
        let raw = stream(&levels);
        let samples = split_luma_frames(&raw, 1.0);
        let ts = select_scene_timestamps(&samples, &params(), 25.0);
        assert_eq!(ts, vec![0.0, 6.0, 20.0]);
        assert!(ts.windows(2).all(|w| w[1] - w[0] >= 5.0));
    }

    #[test]
    fn test_static_stream_yields_first_frame() {
        let raw = stream(&[42; 60]);
        let samples = split_luma_frames(&raw, 1.0);
        assert_eq!(select_scene_timestamps(&samples, &params(), 60.0), vec![0.0]);
    }

    #[test]
    fn test_empty_stream_falls_back_to_start() {
        assert_eq!(select_scene_timestamps(&[], &params(), 10.0), vec![0.0]);
    }

    #[test]
    fn test_cap_and_duration_bound() {
        let levels: Vec<u8> = (0..100).map(|i| if i % 2 == 0 { 0 } else { 255 }).collect();
        let raw = stream(&levels);
        let samples = split_luma_frames(&raw, 1.0);

        let p = SceneParams {
            min_spacing: 0.0,
            max_frames: 4,
            ..params()
        };
        assert_eq!(select_scene_timestamps(&samples, &p, 100.0), vec![0.0, 1.0, 2.0, 3.0]);

        let p = SceneParams {
            min_spacing: 0.0,
            ..params()
        };
        let ts = select_scene_timestamps(&samples, &p, 9.5);
        assert_eq!(ts.len(), 10);
        assert!(ts.iter().all(|t| *t <= 9.5));
    }
}
