//! Frame extraction: policy resolution, scene detection and rendering.

mod extractor;
pub mod policy;
pub mod scene;

pub use extractor::FrameExtractor;
pub use policy::{ResolvedPolicy, fixed_interval_timestamps, resolve_policy};
pub use scene::{SceneParams, select_scene_timestamps};
