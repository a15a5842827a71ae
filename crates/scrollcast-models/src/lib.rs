//! Shared data models for the scrollcast renderer.
//!
//! Everything here is a single-request-scoped value type: the validated
//! render request, the derived layout/timing plan, style options, encoder
//! settings and the per-job progress state.

pub mod color;
pub mod encoding;
pub mod job;
pub mod layout;
pub mod request;
pub mod style;

pub use color::{Color, ColorParseError};
pub use encoding::EncodingConfig;
pub use job::{JobState, JobStatus};
pub use layout::LayoutPlan;
pub use request::{normalize_text, RenderRequest, RequestError};
pub use style::{FallbackPolicy, OverlayShape, ShadowStyle};
