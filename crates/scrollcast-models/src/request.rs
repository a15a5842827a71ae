//! Validated render request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Color;
use crate::style::{FallbackPolicy, OverlayShape, ShadowStyle};

/// Upper bound on font size; anything larger is a client mistake.
pub const MAX_FONT_SIZE: u32 = 200;
/// Upper bound on caption length after normalization.
pub const MAX_TEXT_LEN: usize = 20_000;

/// A validated render request.
///
/// Construct through [`RenderRequest::new`], which normalizes the caption
/// and rejects degenerate parameters before any rendering work begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Caption text, whitespace-normalized
    pub text: String,
    /// Scroll speed in pixels per second
    pub scroll_speed: f64,
    /// Font size in pixels
    pub font_size: u32,
    /// Main caption color
    pub main_color: Color,
    /// Shadow color; defaults to white when a shadow style is set
    pub shadow_color: Option<Color>,
    /// Shadow rendering strategy
    pub shadow_style: ShadowStyle,
    /// Picture-in-picture overlay shape
    pub overlay_shape: OverlayShape,
    /// What to do when an optional asset is unreadable
    pub fallback_policy: FallbackPolicy,
}

impl RenderRequest {
    /// Build a validated request from raw form values.
    pub fn new(
        text: &str,
        scroll_speed: f64,
        font_size: u32,
        main_color: Color,
    ) -> Result<Self, RequestError> {
        let text = normalize_text(text);
        if text.is_empty() {
            return Err(RequestError::EmptyText);
        }
        if text.len() > MAX_TEXT_LEN {
            return Err(RequestError::TextTooLong(text.len()));
        }
        if !scroll_speed.is_finite() || scroll_speed <= 0.0 {
            return Err(RequestError::InvalidScrollSpeed(scroll_speed));
        }
        if font_size == 0 || font_size > MAX_FONT_SIZE {
            return Err(RequestError::InvalidFontSize(font_size));
        }

        Ok(Self {
            text,
            scroll_speed,
            font_size,
            main_color,
            shadow_color: None,
            shadow_style: ShadowStyle::default(),
            overlay_shape: OverlayShape::default(),
            fallback_policy: FallbackPolicy::default(),
        })
    }

    pub fn with_shadow(mut self, style: ShadowStyle, color: Option<Color>) -> Self {
        self.shadow_style = style;
        self.shadow_color = color;
        self
    }

    pub fn with_overlay_shape(mut self, shape: OverlayShape) -> Self {
        self.overlay_shape = shape;
        self
    }

    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback_policy = policy;
        self
    }

    /// Effective shadow color: explicit, or white when a shadow is drawn.
    pub fn effective_shadow_color(&self) -> Color {
        self.shadow_color.unwrap_or(Color::WHITE)
    }
}

/// Collapse whitespace runs (including pasted line breaks) to single spaces
/// and trim the ends.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Validation failures for a render request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Caption text is empty")]
    EmptyText,

    #[error("Caption text too long ({0} chars)")]
    TextTooLong(usize),

    #[error("Scroll speed must be a positive number, got {0}")]
    InvalidScrollSpeed(f64),

    #[error("Font size must be between 1 and {MAX_FONT_SIZE}, got {0}")]
    InvalidFontSize(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Hello\n\n World\t!  "), "Hello World !");
        assert_eq!(normalize_text("one two"), "one two");
        assert_eq!(normalize_text("   \n\t "), "");
    }

    #[test]
    fn test_valid_request() {
        let req = RenderRequest::new("Hello World", 50.0, 40, Color::BLACK).unwrap();
        assert_eq!(req.text, "Hello World");
        assert_eq!(req.shadow_style, ShadowStyle::Offset);
    }

    #[test]
    fn test_empty_text_rejected() {
        assert!(matches!(
            RenderRequest::new("  \n ", 50.0, 40, Color::BLACK),
            Err(RequestError::EmptyText)
        ));
    }

    #[test]
    fn test_degenerate_scroll_speed_rejected() {
        assert!(RenderRequest::new("hi", 0.0, 40, Color::BLACK).is_err());
        assert!(RenderRequest::new("hi", -10.0, 40, Color::BLACK).is_err());
        assert!(RenderRequest::new("hi", f64::NAN, 40, Color::BLACK).is_err());
        assert!(RenderRequest::new("hi", f64::INFINITY, 40, Color::BLACK).is_err());
    }

    #[test]
    fn test_font_size_bounds() {
        assert!(RenderRequest::new("hi", 50.0, 0, Color::BLACK).is_err());
        assert!(RenderRequest::new("hi", 50.0, MAX_FONT_SIZE + 1, Color::BLACK).is_err());
        assert!(RenderRequest::new("hi", 50.0, MAX_FONT_SIZE, Color::BLACK).is_ok());
    }

    #[test]
    fn test_shadow_defaults() {
        let req = RenderRequest::new("hi", 50.0, 40, Color::BLACK).unwrap();
        assert_eq!(req.effective_shadow_color(), Color::WHITE);

        let req = req.with_shadow(ShadowStyle::Halo, Some(Color::rgb(10, 20, 30)));
        assert_eq!(req.effective_shadow_color(), Color::rgb(10, 20, 30));
    }
}
