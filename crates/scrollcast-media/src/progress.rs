//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};

/// Progress information from FFmpeg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Current FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Percentage from the encoder's frame counter against the planned
    /// total: `floor(100 * frame / total)`, clamped to 100.
    pub fn percent_of_frames(&self, total_frames: u64) -> u8 {
        if total_frames == 0 {
            return 0;
        }
        ((self.frame * 100) / total_frames).min(100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_of_frames() {
        let progress = FfmpegProgress {
            frame: 150,
            ..Default::default()
        };
        assert_eq!(progress.percent_of_frames(300), 50);
        assert_eq!(progress.percent_of_frames(150), 100);
        // Never exceeds 100 even if the encoder overruns the plan
        assert_eq!(progress.percent_of_frames(100), 100);
    }

    #[test]
    fn test_percent_floors() {
        let progress = FfmpegProgress {
            frame: 199,
            ..Default::default()
        };
        assert_eq!(progress.percent_of_frames(300), 66);
    }

    #[test]
    fn test_ceiled_plan_caps_encoder_percent_at_99() {
        // A 20.02s render at 15fps plans ceil(300.3) = 301 frames, but the
        // encoder's final report is frame 300; the pipeline must top the
        // sink off at 100 itself.
        let progress = FfmpegProgress {
            frame: 300,
            ..Default::default()
        };
        assert_eq!(progress.percent_of_frames(301), 99);
    }

    #[test]
    fn test_zero_total() {
        let progress = FfmpegProgress::default();
        assert_eq!(progress.percent_of_frames(0), 0);
    }
}
