mod output;
mod trending;
mod video;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use scout_config::ScoutConfig;
use scout_types::ScoutError;

#[derive(Parser)]
#[command(name = "scout", about = "Video and trending-repository helpers for agent skills")]
struct Cli {
    /// Config file (defaults to ~/.scout/config.json5)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print metadata, subtitles and top comments of a Bilibili video as JSON
    #[command(name = "fetch_video_info")]
    FetchVideoInfo {
        /// Video URL (bilibili.com/video/BV... or b23.tv short link)
        url: String,
    },
    /// Download a video and print the resulting file path
    #[command(name = "download_video")]
    DownloadVideo {
        url: String,

        /// Output directory (overrides config)
        output_dir: Option<PathBuf>,

        /// best, worst, <height>p or a yt-dlp format selector
        #[arg(default_value = "best")]
        quality: String,
    },
    /// Extract frames from a local video and print how many were written
    #[command(name = "extract_frames")]
    ExtractFrames {
        video_path: PathBuf,

        output_dir: PathBuf,

        /// auto, scene or a number of seconds
        #[arg(default_value = "auto", allow_negative_numbers = true)]
        interval: String,

        /// Print the frame list as JSON instead of the count
        #[arg(long)]
        json: bool,
    },
    /// Pick evenly spaced frames from a directory for visual analysis
    #[command(name = "analyze_frames")]
    AnalyzeFrames {
        frames_dir: PathBuf,

        #[arg(default_value = "8", allow_negative_numbers = true)]
        sample_count: String,

        /// Inline each frame as base64
        #[arg(long)]
        include_data: bool,
    },
    /// Print trending repositories as JSON
    #[command(name = "fetch_trending")]
    FetchTrending {
        #[arg(default_value = "5", allow_negative_numbers = true)]
        count: String,

        /// daily, weekly or monthly
        #[arg(default_value = "daily")]
        since: String,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr; stdout carries the command output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return Ok(report(&e)),
    };
    tracing::debug!(
        yt_dlp = %config.tools.yt_dlp.display(),
        videos_dir = %config.output.videos_dir.display(),
        "Configuration loaded"
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match rt.block_on(run(cli.command, &config)) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => Ok(report(&e)),
    }
}

/// A bad config file is reported like a bad argument.
fn load_config(path: Option<&Path>) -> scout_types::Result<ScoutConfig> {
    scout_config::load_config(path)
        .map_err(|e| ScoutError::InvalidArgument(format!("config: {e}")))
}

/// Print `error[<kind>]: <message>` on one line and pick the exit code.
fn report(e: &ScoutError) -> ExitCode {
    eprintln!("error[{}]: {}", e.kind(), one_line(&e.to_string()));
    ExitCode::from(e.exit_code())
}

fn one_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

async fn run(command: Commands, config: &ScoutConfig) -> scout_types::Result<()> {
    match command {
        Commands::FetchVideoInfo { url } => video::fetch_video_info(config, &url).await,
        Commands::DownloadVideo {
            url,
            output_dir,
            quality,
        } => video::download_video(config, &url, output_dir, &quality).await,
        Commands::ExtractFrames {
            video_path,
            output_dir,
            interval,
            json,
        } => video::extract_frames(config, &video_path, &output_dir, &interval, json).await,
        Commands::AnalyzeFrames {
            frames_dir,
            sample_count,
            include_data,
        } => video::analyze_frames(&frames_dir, &sample_count, include_data).await,
        Commands::FetchTrending { count, since } => {
            trending::fetch_trending(config, &count, &since).await
        }
    }
}
