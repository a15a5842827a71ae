//! FFmpeg CLI pipeline for scrolling-text video assembly.
//!
//! This crate provides:
//! - Type-safe multi-input FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Cancellation and timeout support via tokio
//! - Caption banner rasterization (fontdue + image)
//! - Asset resolvers with documented per-asset fallbacks
//! - Filter-graph assembly for the layered composite

pub mod command;
pub mod error;
pub mod graph;
pub mod layers;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod text;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegInput, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use graph::{build_graph, CompositionGraph};
pub use layers::{BackgroundLayer, IntroLayer, PipLayer};
pub use pipeline::{render, RenderInputs, RenderOptions, RenderedArtifact};
pub use probe::{probe_video, VideoInfo};
pub use progress::FfmpegProgress;
pub use text::{render_banner, resolve_font_path, TextBanner};
