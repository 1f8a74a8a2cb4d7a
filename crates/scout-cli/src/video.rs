use std::path::{Path, PathBuf};

use scout_config::ScoutConfig;
use scout_media::{
    BilibiliClient, Downloader, FrameExtractor, Prober, Quality, SourceRouter, ToolPaths,
    sample_frames,
};
use scout_types::{ExtractionPolicy, Result, ScoutError};

use crate::output;

pub async fn fetch_video_info(config: &ScoutConfig, url: &str) -> Result<()> {
    let bilibili = BilibiliClient::new(&config.http, &config.bilibili)?;
    let router = SourceRouter::new(vec![Box::new(bilibili)]);
    let meta = router.fetch_metadata(url).await?;
    output::print_json(&meta)
}

pub async fn download_video(
    config: &ScoutConfig,
    url: &str,
    output_dir: Option<PathBuf>,
    quality: &str,
) -> Result<()> {
    let tools = ToolPaths::from_config(&config.tools);
    let downloader = Downloader::new(&tools, &config.tools);
    let dir = output_dir.unwrap_or_else(|| config.output.videos_dir.clone());
    let media = downloader
        .download(url, &dir, &Quality::from(quality))
        .await?;
    output::print_line(media.path.display())
}

pub async fn extract_frames(
    config: &ScoutConfig,
    video_path: &Path,
    output_dir: &Path,
    interval: &str,
    json: bool,
) -> Result<()> {
    let policy: ExtractionPolicy = interval.parse()?;
    let tools = ToolPaths::from_config(&config.tools);
    let media = Prober::new(&tools, &config.tools)
        .probe_media_file(video_path)
        .await?;

    let extractor = FrameExtractor::new(&tools, &config.tools, &config.frames);
    let frames = extractor.extract_frames(&media, output_dir, policy).await?;
    if json {
        output::print_json(&frames)
    } else {
        output::print_line(frames.len())
    }
}

pub async fn analyze_frames(frames_dir: &Path, sample_count: &str, include_data: bool) -> Result<()> {
    let sample_count = sample_count.trim().parse::<usize>().map_err(|_| {
        ScoutError::InvalidArgument(format!(
            "sample_count must be a positive integer, got \"{sample_count}\""
        ))
    })?;
    let sample = sample_frames(frames_dir, sample_count, include_data).await?;
    output::print_json(&sample)
}
