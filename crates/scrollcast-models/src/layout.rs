//! Scroll layout and timing math.
//!
//! The one piece of genuine design logic in the system: the rendered caption
//! banner scrolls bottom-to-top at a fixed speed, and its measured height
//! determines the total render duration.

use serde::{Deserialize, Serialize};

/// Output frame width in pixels.
pub const FRAME_WIDTH: u32 = 854;
/// Output frame height in pixels.
pub const FRAME_HEIGHT: u32 = 480;
/// Output frame rate.
pub const FRAME_RATE: u32 = 15;
/// Horizontal margin on each side of the caption banner.
pub const SIDE_MARGIN: u32 = 5;
/// Picture-in-picture footprint.
pub const PIP_WIDTH: u32 = 320;
pub const PIP_HEIGHT: u32 = 180;
/// Cross-fade overlap between the intro tail and the main composite head.
pub const CROSSFADE_SECS: f64 = 1.0;

/// Derived frame/timing plan for one render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutPlan {
    /// Output frame width
    pub width: u32,
    /// Output frame height
    pub height: u32,
    /// Output frame rate
    pub fps: u32,
    /// Measured caption banner height in pixels
    pub text_height: u32,
    /// Scroll speed in pixels per second
    pub scroll_speed: f64,
}

impl LayoutPlan {
    /// Build a plan for the default 854x480 @ 15fps output.
    pub fn new(text_height: u32, scroll_speed: f64) -> Self {
        Self {
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            fps: FRAME_RATE,
            text_height,
            scroll_speed,
        }
    }

    /// Total scroll duration in seconds.
    ///
    /// The banner travels from fully below the frame to fully above it:
    /// `(text_height + frame_height) / scroll_speed`.
    pub fn duration(&self) -> f64 {
        (self.text_height as f64 + self.height as f64) / self.scroll_speed
    }

    /// Caption position at elapsed time `t`: x fixed at the side margin,
    /// y dropping linearly from the bottom edge.
    pub fn text_position(&self, t: f64) -> (f64, f64) {
        (SIDE_MARGIN as f64, self.height as f64 - self.scroll_speed * t)
    }

    /// Total frame count of the main composite.
    pub fn total_frames(&self) -> u64 {
        (self.duration() * self.fps as f64).ceil() as u64
    }

    /// Usable caption width between the side margins.
    pub fn text_width(&self) -> u32 {
        self.width - 2 * SIDE_MARGIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_formula() {
        let plan = LayoutPlan::new(520, 50.0);
        assert!((plan.duration() - (520.0 + 480.0) / 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_duration_lower_bound() {
        // Even with no measurable text height, the banner still has to cross
        // the full frame.
        let plan = LayoutPlan::new(0, 50.0);
        assert!(plan.duration() >= FRAME_HEIGHT as f64 / 50.0);
    }

    #[test]
    fn test_duration_monotonicity() {
        let base = LayoutPlan::new(300, 50.0);
        let taller = LayoutPlan::new(400, 50.0);
        let faster = LayoutPlan::new(300, 80.0);

        assert!(taller.duration() > base.duration());
        assert!(faster.duration() < base.duration());
    }

    #[test]
    fn test_position_boundaries() {
        let plan = LayoutPlan::new(520, 50.0);

        // At t=0 the banner top edge sits just below the visible frame.
        let (x, y0) = plan.text_position(0.0);
        assert!((x - SIDE_MARGIN as f64).abs() < 1e-9);
        assert!((y0 - FRAME_HEIGHT as f64).abs() < 1e-9);

        // At t=duration it has fully cleared the top.
        let (_, y_end) = plan.text_position(plan.duration());
        assert!((y_end + plan.text_height as f64).abs() < 1e-9);
    }

    #[test]
    fn test_position_linear() {
        let plan = LayoutPlan::new(520, 50.0);
        let (_, y) = plan.text_position(2.0);
        assert!((y - (480.0 - 100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_total_frames() {
        let plan = LayoutPlan::new(520, 50.0);
        // 20s at 15fps
        assert_eq!(plan.total_frames(), 300);
    }

    #[test]
    fn test_text_width() {
        let plan = LayoutPlan::new(100, 50.0);
        assert_eq!(plan.text_width(), FRAME_WIDTH - 10);
    }
}
