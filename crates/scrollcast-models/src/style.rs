//! Style options for the render pipeline.
//!
//! The original generator existed in several near-duplicate variants (offset
//! shadow vs. halo shadow, rectangular vs. circular picture-in-picture).
//! These enums fold the variants into one parameterized pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How the caption shadow is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShadowStyle {
    /// No shadow layer
    None,
    /// Single duplicate offset 2px down-right
    #[default]
    Offset,
    /// Eight duplicates at the compass offsets, stroke-like
    Halo,
}

impl ShadowStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShadowStyle::None => "none",
            ShadowStyle::Offset => "offset",
            ShadowStyle::Halo => "halo",
        }
    }

    /// Offsets (dx, dy) of the shadow passes drawn under the main text.
    pub fn offsets(&self) -> &'static [(i32, i32)] {
        match self {
            ShadowStyle::None => &[],
            ShadowStyle::Offset => &[(2, 2)],
            ShadowStyle::Halo => &[
                (-2, -2),
                (0, -2),
                (2, -2),
                (-2, 0),
                (2, 0),
                (-2, 2),
                (0, 2),
                (2, 2),
            ],
        }
    }
}

impl fmt::Display for ShadowStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ShadowStyle {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(ShadowStyle::None),
            "offset" => Ok(ShadowStyle::Offset),
            "halo" => Ok(ShadowStyle::Halo),
            _ => Err(StyleParseError(s.to_string())),
        }
    }
}

/// Shape of the picture-in-picture overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverlayShape {
    /// Plain rectangular footprint
    #[default]
    Rectangle,
    /// Centered circular mask; the clip's audio is carried through
    Circle,
}

impl OverlayShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayShape::Rectangle => "rectangle",
            OverlayShape::Circle => "circle",
        }
    }
}

impl fmt::Display for OverlayShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OverlayShape {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rectangle" | "rect" => Ok(OverlayShape::Rectangle),
            "circle" => Ok(OverlayShape::Circle),
            _ => Err(StyleParseError(s.to_string())),
        }
    }
}

/// What happens when an optional asset fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Substitute the documented fallback and keep rendering
    #[default]
    Substitute,
    /// Fail the render on the first unreadable asset
    Abort,
}

impl FromStr for FallbackPolicy {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "substitute" => Ok(FallbackPolicy::Substitute),
            "abort" => Ok(FallbackPolicy::Abort),
            _ => Err(StyleParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown style option: {0}")]
pub struct StyleParseError(String);
