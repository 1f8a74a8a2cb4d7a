//! Frame extraction on generated clips. Skipped when ffmpeg is not installed.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use scout_config::{FramesConfig, ToolsConfig};
use scout_media::{FrameExtractor, Prober, ToolPaths};
use scout_types::{ExtractionPolicy, ScoutError};

fn ffmpeg_available() -> bool {
    let ok = Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success());
    if !ok {
        eprintln!("ffmpeg not found, skipping");
    }
    ok
}

fn generate(args: &[&str], out: &Path) {
    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y"])
        .args(args)
        .arg(out)
        .status()
        .unwrap();
    assert!(status.success(), "failed to generate {}", out.display());
}

fn test_clip(dir: &Path, name: &str, seconds: u32) -> PathBuf {
    let out = dir.join(name);
    let src = format!("testsrc=size=160x90:rate=2:duration={seconds}");
    generate(&["-f", "lavfi", "-i", &src, "-c:v", "mpeg4"], &out);
    out
}

fn tools() -> (ToolPaths, ToolsConfig) {
    let cfg = ToolsConfig {
        ffmpeg: Some(PathBuf::from("ffmpeg")),
        ffprobe: Some(PathBuf::from("ffprobe")),
        ..ToolsConfig::default()
    };
    (ToolPaths::from_config(&cfg), cfg)
}

fn extractor() -> FrameExtractor {
    let (paths, cfg) = tools();
    FrameExtractor::new(&paths, &cfg, &FramesConfig::default())
}

#[tokio::test]
async fn twelve_minute_clip_uses_scene_detection() {
    if !ffmpeg_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let clip = test_clip(tmp.path(), "long.mp4", 720);
    let (paths, cfg) = tools();
    let media = Prober::new(&paths, &cfg).probe_media_file(&clip).await.unwrap();
    assert!((media.duration - 720.0).abs() < 1.0);

    let out = tmp.path().join("frames");
    let frames = extractor()
        .extract_frames(&media, &out, ExtractionPolicy::Auto)
        .await
        .unwrap();

    assert!(!frames.is_empty());
    assert_eq!(frames[0].timestamp, 0.0);
    for frame in &frames {
        let name = frame.image_path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("scene_"), "{name}");
        assert!(frame.image_path.is_file());
        assert!(frame.timestamp >= 0.0 && frame.timestamp <= media.duration);
    }
    for pair in frames.windows(2) {
        assert!(pair[1].timestamp - pair[0].timestamp >= 5.0);
        assert!(pair[0].image_path < pair[1].image_path);
    }
}

#[tokio::test]
async fn fixed_interval_frames() {
    if !ffmpeg_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let clip = test_clip(tmp.path(), "short.mp4", 25);
    let (paths, cfg) = tools();
    let media = Prober::new(&paths, &cfg).probe_media_file(&clip).await.unwrap();

    let out = tmp.path().join("frames");
    let frames = extractor()
        .extract_frames(&media, &out, ExtractionPolicy::Auto)
        .await
        .unwrap();

    // 0, 10, 20 always decode; the closing frame near the end may not.
    assert!(frames.len() >= 3 && frames.len() <= 4, "{frames:?}");
    assert_eq!(frames[0].timestamp, 0.0);
    assert_eq!(frames[1].timestamp, 10.0);
    assert_eq!(frames[2].timestamp, 20.0);
    assert_eq!(frames[0].image_path, out.join("frame_00001.jpg"));
    assert!(frames.iter().all(|f| f.image_path.is_file()));
}

#[tokio::test]
async fn audio_only_is_unsupported() {
    if !ffmpeg_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let clip = tmp.path().join("tone.wav");
    generate(&["-f", "lavfi", "-i", "sine=frequency=440:duration=3"], &clip);
    let (paths, cfg) = tools();

    let err = Prober::new(&paths, &cfg).probe(&clip).await.unwrap_err();
    assert!(matches!(err, ScoutError::UnsupportedFormat(_)), "{err:?}");
}

#[tokio::test]
async fn corrupt_file_is_decode_error() {
    if !ffmpeg_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let clip = tmp.path().join("broken.mp4");
    std::fs::write(&clip, b"definitely not an mp4 container").unwrap();
    let (paths, cfg) = tools();

    let err = Prober::new(&paths, &cfg)
        .probe_media_file(&clip)
        .await
        .unwrap_err();
    assert!(matches!(err, ScoutError::Decode(_)), "{err:?}");
}
