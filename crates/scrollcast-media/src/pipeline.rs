//! Render orchestration: caption banner, layer resolution, filter graph,
//! one FFmpeg invocation with progress forwarding.

use std::path::PathBuf;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::watch;
use tracing::{info, warn};

use scrollcast_models::{EncodingConfig, FallbackPolicy, LayoutPlan, RenderRequest};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::graph::build_graph;
use crate::layers::{
    resolve_background, resolve_intro, resolve_pip, BackgroundLayer, IntroLayer, PipLayer,
};
use crate::text::{load_font, render_banner, resolve_font_path};

/// Media file paths for one render, already saved by the upload layer.
#[derive(Debug, Clone)]
pub struct RenderInputs {
    /// Background image (fallback-protected)
    pub background: PathBuf,
    /// Optional picture-in-picture clip
    pub pip: Option<PathBuf>,
    /// Zero, one or two intro clips
    pub intros: Vec<PathBuf>,
}

/// Pipeline settings supplied by the caller.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Directory the finished artifact is written to
    pub output_dir: PathBuf,
    /// Explicit font path; system fonts are searched when unset
    pub font_path: Option<PathBuf>,
    /// Encoder settings
    pub encoding: EncodingConfig,
    /// Hard cap on the encoder run
    pub timeout_secs: Option<u64>,
}

/// The finished output file.
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    pub path: PathBuf,
    pub filename: String,
    /// Final timeline duration in seconds
    pub duration: f64,
}

/// Run the full pipeline for one validated request.
///
/// Progress percentages (0-100) are forwarded to `progress` as the encoder
/// reports frames; a final 100 is always delivered on success. Flipping
/// `cancel` to `true` kills the encoder.
pub async fn render<F>(
    request: &RenderRequest,
    inputs: &RenderInputs,
    options: &RenderOptions,
    progress: F,
    cancel: Option<watch::Receiver<bool>>,
) -> MediaResult<RenderedArtifact>
where
    F: Fn(u8) + Send + Sync + 'static,
{
    crate::command::check_ffmpeg()?;

    let font_path = resolve_font_path(options.font_path.as_deref())?;
    let font = load_font(&font_path)?;

    // Per-job scratch space; dropped (and deleted) when the render ends.
    let workdir = tempfile::tempdir()?;

    let text_width =
        scrollcast_models::layout::FRAME_WIDTH - 2 * scrollcast_models::layout::SIDE_MARGIN;
    let banner = render_banner(
        request,
        text_width,
        &font,
        &workdir.path().join("caption.png"),
    )?;

    let plan = LayoutPlan::new(banner.height, request.scroll_speed);
    info!(
        text_height = banner.height,
        duration = plan.duration(),
        "Layout planned"
    );

    let (background, pip, intros) =
        resolve_layers(inputs, &plan, request.fallback_policy, request).await?;

    let graph = build_graph(&plan, &background, &banner, pip.as_ref(), &intros);

    let filename = output_filename();
    let output_path = options.output_dir.join(&filename);

    let mut cmd = FfmpegCommand::new(&output_path);
    for input in graph.inputs.clone() {
        cmd = cmd.input(input);
    }
    cmd = cmd
        .filter_complex(graph.filter_complex.clone())
        .map(graph.video_map.clone())
        .output_args(options.encoding.video_args())
        .frame_rate(plan.fps);

    if let Some(audio_label) = &graph.audio_map {
        cmd = cmd
            .map(audio_label.clone())
            .output_args(options.encoding.audio_args());
    }

    let mut runner = FfmpegRunner::new();
    if let Some(secs) = options.timeout_secs {
        runner = runner.with_timeout(secs);
    }
    if let Some(rx) = cancel {
        runner = runner.with_cancel(rx);
    }

    let total_frames = graph.total_frames;
    info!(
        output = %output_path.display(),
        total_duration = graph.total_duration,
        total_frames,
        "Starting encode"
    );

    let progress = Arc::new(progress);
    let sink = Arc::clone(&progress);
    runner
        .run_with_progress(&cmd, move |p| {
            (*sink)(p.percent_of_frames(total_frames));
        })
        .await
        .inspect_err(|_| {
            // Never leave a half-written artifact behind
            let _ = std::fs::remove_file(&output_path);
        })?;

    // The ceil() in the frame plan can overshoot the encoded count, leaving
    // the encoder's last report one percent short
    (*progress)(100);

    info!(file = %filename, "Encode complete");

    Ok(RenderedArtifact {
        path: output_path,
        filename,
        duration: graph.total_duration,
    })
}

/// Resolve the optional asset layers, applying the fallback policy.
async fn resolve_layers(
    inputs: &RenderInputs,
    plan: &LayoutPlan,
    policy: FallbackPolicy,
    request: &RenderRequest,
) -> MediaResult<(BackgroundLayer, Option<PipLayer>, Vec<IntroLayer>)> {
    let background = match resolve_background(&inputs.background) {
        Ok(layer) => layer,
        Err(e) if policy == FallbackPolicy::Substitute && e.is_asset_error() => {
            warn!(error = %e, "Background failed, using solid black");
            BackgroundLayer::SolidBlack
        }
        Err(e) => return Err(e),
    };

    let pip = match &inputs.pip {
        Some(path) => {
            match resolve_pip(path, plan.duration(), request.overlay_shape).await {
                Ok(layer) => Some(layer),
                Err(e) if policy == FallbackPolicy::Substitute && e.is_asset_error() => {
                    warn!(error = %e, "Picture-in-picture failed, omitting overlay");
                    None
                }
                Err(e) => return Err(e),
            }
        }
        None => None,
    };

    let mut intros = Vec::new();
    for path in &inputs.intros {
        match resolve_intro(path).await {
            Ok(layer) => intros.push(layer),
            Err(e) if policy == FallbackPolicy::Substitute && e.is_asset_error() => {
                warn!(error = %e, "Intro failed, skipping");
            }
            Err(e) => return Err(e),
        }
    }

    Ok((background, pip, intros))
}

/// Collision-safe output name: `final_<8-hex-random>.mp4`.
fn output_filename() -> String {
    format!("final_{:08x}.mp4", rand::rng().random::<u32>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrollcast_models::Color;

    fn request() -> RenderRequest {
        RenderRequest::new("Hello World", 50.0, 40, Color::BLACK).unwrap()
    }

    #[test]
    fn test_output_filename_shape() {
        let name = output_filename();
        assert!(name.starts_with("final_"));
        assert!(name.ends_with(".mp4"));
        let hex = &name["final_".len()..name.len() - ".mp4".len()];
        assert_eq!(hex.len(), 8);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_resolve_layers_substitutes_everything() {
        let inputs = RenderInputs {
            background: PathBuf::from("/nonexistent/bg.jpg"),
            pip: Some(PathBuf::from("/nonexistent/pip.mp4")),
            intros: vec![
                PathBuf::from("/nonexistent/intro1.mp4"),
                PathBuf::from("/nonexistent/intro2.mp4"),
            ],
        };
        let plan = LayoutPlan::new(520, 50.0);

        let (background, pip, intros) =
            resolve_layers(&inputs, &plan, FallbackPolicy::Substitute, &request())
                .await
                .unwrap();

        assert!(matches!(background, BackgroundLayer::SolidBlack));
        assert!(pip.is_none());
        assert!(intros.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_layers_abort_policy() {
        let inputs = RenderInputs {
            background: PathBuf::from("/nonexistent/bg.jpg"),
            pip: None,
            intros: Vec::new(),
        };
        let plan = LayoutPlan::new(520, 50.0);

        let err = resolve_layers(&inputs, &plan, FallbackPolicy::Abort, &request())
            .await
            .unwrap_err();
        assert!(err.is_asset_error());
    }
}
