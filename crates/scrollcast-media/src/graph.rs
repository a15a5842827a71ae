//! FFmpeg filter-graph construction for the layered composite.
//!
//! Z-order is fixed: background at the bottom, the picture-in-picture
//! overlay above it, the scrolling caption on top. Intro clips precede the
//! main composite in time, joined by a 1s cross-fade.

use scrollcast_models::layout::CROSSFADE_SECS;
use scrollcast_models::{Color, LayoutPlan, OverlayShape};

use crate::command::FfmpegInput;
use crate::layers::{BackgroundLayer, IntroLayer, PipLayer};
use crate::text::TextBanner;

/// A fully assembled input list + filter graph for one render.
#[derive(Debug, Clone)]
pub struct CompositionGraph {
    /// Inputs in the order the filter labels reference them
    pub inputs: Vec<FfmpegInput>,
    /// The `-filter_complex` string
    pub filter_complex: String,
    /// Video output label to map (e.g. `[vout]`)
    pub video_map: String,
    /// Audio output label, when the overlay clip's audio is carried through
    pub audio_map: Option<String>,
    /// Total output duration in seconds, cross-fade overlap deducted
    pub total_duration: f64,
    /// Total output frame count, for progress percentage
    pub total_frames: u64,
}

/// Build the composition graph from the resolved layers.
pub fn build_graph(
    plan: &LayoutPlan,
    background: &BackgroundLayer,
    banner: &TextBanner,
    pip: Option<&PipLayer>,
    intros: &[IntroLayer],
) -> CompositionGraph {
    let main_duration = plan.duration();
    let (w, h, fps) = (plan.width, plan.height, plan.fps);

    let mut inputs = Vec::new();
    let mut chains: Vec<String> = Vec::new();

    // Intros come first so their input indices match their timeline order.
    let intro_indices: Vec<usize> = intros
        .iter()
        .map(|intro| {
            inputs.push(FfmpegInput::file(&intro.path));
            inputs.len() - 1
        })
        .collect();

    let bg_index = inputs.len();
    match background {
        BackgroundLayer::Image(path) => {
            inputs.push(FfmpegInput::file(path).loop_image(fps, main_duration));
            chains.push(format!(
                "[{bg_index}:v]scale={w}:{h},setsar=1,fps={fps}[bg]"
            ));
        }
        BackgroundLayer::SolidBlack => {
            inputs.push(
                FfmpegInput::lavfi(format!(
                    "color=c={}:s={w}x{h}:r={fps}",
                    Color::BLACK.to_ffmpeg()
                ))
                .duration(main_duration),
            );
            chains.push(format!("[{bg_index}:v]setsar=1[bg]"));
        }
    }

    let banner_index = inputs.len();
    inputs.push(FfmpegInput::file(&banner.path).loop_image(fps, main_duration));

    // Optional picture-in-picture between background and text.
    let base_label = if let Some(pip) = pip {
        let pip_index = inputs.len();
        let mut input = FfmpegInput::file(&pip.path);
        if pip.extra_loops > 0 {
            input = input.stream_loop(pip.extra_loops);
        }
        inputs.push(input);

        let mask = match pip.shape {
            OverlayShape::Rectangle => "",
            OverlayShape::Circle => {
                ",format=rgba,geq=r='r(X,Y)':g='g(X,Y)':b='b(X,Y)'\
                 :a='if(lte(pow(X-W/2,2)+pow(Y-H/2,2),pow(min(W,H)/2,2)),alpha(X,Y),0)'"
            }
        };
        chains.push(format!(
            "[{pip_index}:v]fps={fps},scale={pw}:{ph},setsar=1,\
             trim=duration={main_duration:.3},setpts=PTS-STARTPTS{mask}[pipv]",
            pw = scrollcast_models::layout::PIP_WIDTH,
            ph = scrollcast_models::layout::PIP_HEIGHT,
        ));
        chains.push("[bg][pipv]overlay=(W-w)/2:(H-h)/2[base]".to_string());
        "base"
    } else {
        "bg"
    };

    // Scrolling caption: starts just below the frame, climbs at the scroll
    // speed until fully past the top.
    chains.push(format!("[{banner_index}:v]format=rgba[txt]"));
    chains.push(format!(
        "[{base_label}][txt]overlay=x=(W-w)/2:y=H-{speed:.3}*t[comp]",
        speed = plan.scroll_speed,
    ));

    // Intro sequencing with cross-fade into the main composite.
    let intro_lead: f64 = intros.iter().map(|i| i.duration).sum();
    let (total_duration, video_map) = if intros.is_empty() {
        chains.push("[comp]format=yuv420p[vout]".to_string());
        (main_duration, "[vout]".to_string())
    } else {
        let lead_label = if intro_indices.len() == 2 {
            for (n, idx) in intro_indices.iter().enumerate() {
                chains.push(format!(
                    "[{idx}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
                     pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}[in{n}]"
                ));
            }
            chains.push("[in0][in1]concat=n=2:v=1:a=0[lead]".to_string());
            "lead".to_string()
        } else {
            let idx = intro_indices[0];
            chains.push(format!(
                "[{idx}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
                 pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}[lead]"
            ));
            "lead".to_string()
        };

        chains.push(format!(
            "[{lead_label}][comp]xfade=transition=fade:duration={CROSSFADE_SECS}:\
             offset={offset:.3},format=yuv420p[vout]",
            offset = intro_lead - CROSSFADE_SECS,
        ));
        (intro_lead + main_duration - CROSSFADE_SECS, "[vout]".to_string())
    };

    // The circular overlay variant carries the clip's audio through as the
    // output's only audio track, delayed past the intro lead.
    let audio_map = match pip {
        Some(pip) if pip.shape == OverlayShape::Circle && pip.has_audio => {
            let pip_index = banner_index + 1;
            chains.push(format!(
                "[{pip_index}:a]atrim=duration={main_duration:.3},asetpts=PTS-STARTPTS[pa]"
            ));
            if intro_lead > 0.0 {
                let delay_ms = ((intro_lead - CROSSFADE_SECS) * 1000.0).round().max(0.0) as u64;
                chains.push(format!("[pa]adelay={delay_ms}:all=1[aout]"));
                Some("[aout]".to_string())
            } else {
                Some("[pa]".to_string())
            }
        }
        _ => None,
    };

    CompositionGraph {
        inputs,
        filter_complex: chains.join(";"),
        video_map,
        audio_map,
        total_duration,
        total_frames: (total_duration * fps as f64).ceil() as u64,
    }
}
