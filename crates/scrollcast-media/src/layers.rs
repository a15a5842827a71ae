//! Asset resolvers for the optional media layers.
//!
//! Each resolver reports failure explicitly; the pipeline decides per the
//! request's fallback policy whether to substitute the documented fallback
//! (black background, omitted overlay, skipped intro) or abort.

use std::path::{Path, PathBuf};

use tracing::info;

use scrollcast_models::layout::CROSSFADE_SECS;
use scrollcast_models::OverlayShape;

use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;

/// The background layer: the user image, or the solid-black fallback.
#[derive(Debug, Clone)]
pub enum BackgroundLayer {
    Image(PathBuf),
    SolidBlack,
}

/// A resolved picture-in-picture layer.
#[derive(Debug, Clone)]
pub struct PipLayer {
    pub path: PathBuf,
    /// Source clip duration in seconds
    pub clip_duration: f64,
    /// Additional whole-clip repetitions needed to cover the render
    pub extra_loops: u32,
    /// Whether the clip carries an audio stream
    pub has_audio: bool,
    pub shape: OverlayShape,
}

/// A resolved intro clip.
#[derive(Debug, Clone)]
pub struct IntroLayer {
    pub path: PathBuf,
    pub duration: f64,
}

/// Check the background image is decodable. The caller substitutes
/// [`BackgroundLayer::SolidBlack`] on failure when the policy allows it.
pub fn resolve_background(path: &Path) -> MediaResult<BackgroundLayer> {
    image::open(path)
        .map_err(|e| MediaError::asset_unreadable(path, e.to_string()))?;
    Ok(BackgroundLayer::Image(path.to_path_buf()))
}

/// Probe the picture-in-picture clip and work out how many whole-clip
/// loops cover the render duration.
pub async fn resolve_pip(
    path: &Path,
    render_duration: f64,
    shape: OverlayShape,
) -> MediaResult<PipLayer> {
    let info = probe_video(path).await?;
    if info.duration <= 0.0 {
        return Err(MediaError::asset_unreadable(path, "zero-duration clip"));
    }

    let loops = loops_needed(render_duration, info.duration);
    if loops > 1 {
        info!(
            clip = %path.display(),
            loops,
            "Looping picture-in-picture clip to cover render duration"
        );
    }

    Ok(PipLayer {
        path: path.to_path_buf(),
        clip_duration: info.duration,
        extra_loops: loops - 1,
        has_audio: info.has_audio,
        shape,
    })
}

/// Probe an intro clip. Clips shorter than the cross-fade window cannot be
/// sequenced and are treated as unreadable.
pub async fn resolve_intro(path: &Path) -> MediaResult<IntroLayer> {
    let info = probe_video(path).await?;
    if info.duration <= CROSSFADE_SECS {
        return Err(MediaError::asset_unreadable(
            path,
            format!("intro shorter than the {CROSSFADE_SECS}s cross-fade"),
        ));
    }

    Ok(IntroLayer {
        path: path.to_path_buf(),
        duration: info.duration,
    })
}

/// Whole-clip repetitions needed to cover `render_duration`:
/// `ceil(render_duration / clip_duration)`, at least 1.
pub fn loops_needed(render_duration: f64, clip_duration: f64) -> u32 {
    ((render_duration / clip_duration).ceil() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loops_needed() {
        // 20s render over a 6s clip needs 4 plays
        assert_eq!(loops_needed(20.0, 6.0), 4);
        // Exact multiple needs no extra play
        assert_eq!(loops_needed(18.0, 6.0), 3);
        // Clip longer than the render plays once
        assert_eq!(loops_needed(5.0, 30.0), 1);
    }

    #[test]
    fn test_resolve_background_missing() {
        let err = resolve_background(Path::new("/nonexistent/bg.jpg")).unwrap_err();
        assert!(matches!(err, MediaError::AssetUnreadable { .. }));
        assert!(err.is_asset_error());
    }

    #[tokio::test]
    async fn test_resolve_pip_missing() {
        let err = resolve_pip(
            Path::new("/nonexistent/pip.mp4"),
            10.0,
            OverlayShape::Rectangle,
        )
        .await
        .unwrap_err();
        assert!(err.is_asset_error());
    }

    #[tokio::test]
    async fn test_resolve_intro_missing() {
        let err = resolve_intro(Path::new("/nonexistent/intro.mp4"))
            .await
            .unwrap_err();
        assert!(err.is_asset_error());
    }
}
