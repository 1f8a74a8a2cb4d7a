//! scout-media: video metadata fetch, download, frame extraction and sampling.

pub mod bilibili;
pub mod download;
pub mod frames;
pub mod probe;
pub mod process;
pub mod resolver;
pub mod sample;
pub mod source;
pub mod tools;

pub use bilibili::BilibiliClient;
pub use download::{Downloader, Quality};
pub use frames::FrameExtractor;
pub use probe::{ProbeInfo, Prober};
pub use sample::sample_frames;
pub use source::{SourceRouter, VideoSource};
pub use tools::ToolPaths;
