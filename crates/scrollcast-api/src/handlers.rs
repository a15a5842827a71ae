//! HTTP handlers: job submission, progress polling, cancellation, download.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use scrollcast_media::{MediaError, RenderInputs, RenderOptions};
use scrollcast_models::{
    Color, EncodingConfig, FallbackPolicy, OverlayShape, RenderRequest, ShadowStyle,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Serialize)]
pub struct GenerateResponse {
    pub job_id: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct ProgressResponse {
    pub job_id: String,
    pub status: String,
    pub percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ffmpeg: bool,
}

/// Raw multipart form contents before validation.
#[derive(Default)]
struct GenerateForm {
    text: Option<String>,
    scroll_speed: Option<String>,
    font_size: Option<String>,
    main_color: Option<String>,
    shadow_color: Option<String>,
    shadow_style: Option<String>,
    overlay_shape: Option<String>,
    fallback: Option<String>,
    background: Option<PathBuf>,
    pip: Option<PathBuf>,
    intro1: Option<PathBuf>,
    intro2: Option<PathBuf>,
}

impl GenerateForm {
    /// Upload paths already written to disk for this form.
    fn saved_files(&self) -> Vec<PathBuf> {
        [&self.background, &self.pip, &self.intro1, &self.intro2]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }
}

/// Accept a render request, validate it, and queue the render.
///
/// Responds `202 Accepted` with a job id; clients poll `/progress/{job_id}`
/// and fetch the artifact from `/download/{file}` once completed.
pub async fn generate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = read_form(&state, multipart).await?;
    let saved = form.saved_files();

    let (request, inputs) = match build_render_job(form) {
        Ok(job) => job,
        Err(e) => {
            // A rejected request must not leave its uploads behind
            remove_files(&saved).await;
            return Err(e);
        }
    };

    let job_id = Uuid::new_v4().to_string();
    let cancel_rx = state.jobs.create(&job_id);

    info!(job_id = %job_id, "Render job queued");
    spawn_render(state, job_id.clone(), request, inputs, cancel_rx);

    Ok((
        StatusCode::ACCEPTED,
        Json(GenerateResponse {
            job_id,
            status: "queued".to_string(),
        }),
    ))
}

/// Validate the form fields and assemble the render job. Required-input
/// errors surface here, before any rendering work.
fn build_render_job(form: GenerateForm) -> ApiResult<(RenderRequest, RenderInputs)> {
    let text = form
        .text
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("Missing field: text"))?;
    let scroll_speed: f64 = parse_field(form.scroll_speed.as_deref(), "scroll_speed")?;
    let font_size: u32 = parse_field(form.font_size.as_deref(), "font_size")?;
    let main_color: Color = form
        .main_color
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("Missing field: main_color"))?
        .parse()
        .map_err(|e| ApiError::bad_request(format!("Bad main_color: {e}")))?;

    let shadow_color = match form.shadow_color.as_deref() {
        Some(s) => Some(
            s.parse::<Color>()
                .map_err(|e| ApiError::bad_request(format!("Bad shadow_color: {e}")))?,
        ),
        None => None,
    };
    let shadow_style = match form.shadow_style.as_deref() {
        Some(s) => s
            .parse::<ShadowStyle>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => ShadowStyle::default(),
    };
    let overlay_shape = match form.overlay_shape.as_deref() {
        Some(s) => s
            .parse::<OverlayShape>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => OverlayShape::default(),
    };
    let fallback_policy = match form.fallback.as_deref() {
        Some(s) => s
            .parse::<FallbackPolicy>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => FallbackPolicy::default(),
    };

    let request = RenderRequest::new(text, scroll_speed, font_size, main_color)?
        .with_shadow(shadow_style, shadow_color)
        .with_overlay_shape(overlay_shape)
        .with_fallback_policy(fallback_policy);

    let background = form
        .background
        .ok_or_else(|| ApiError::bad_request("Missing file: background"))?;

    let inputs = RenderInputs {
        background,
        pip: form.pip,
        intros: [form.intro1, form.intro2].into_iter().flatten().collect(),
    };

    Ok((request, inputs))
}

/// Run the render on a background task, gated by the admission semaphore.
fn spawn_render(
    state: AppState,
    job_id: String,
    request: RenderRequest,
    inputs: RenderInputs,
    cancel_rx: tokio::sync::watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        let Ok(_permit) = Arc::clone(&state.render_slots).acquire_owned().await else {
            // Semaphore closed; process is shutting down
            return;
        };

        if *cancel_rx.borrow() {
            state.jobs.mark_cancelled(&job_id);
            return;
        }

        state.jobs.start(&job_id);

        let options = RenderOptions {
            output_dir: state.config.output_dir.clone(),
            font_path: state.config.font_path.clone(),
            encoding: EncodingConfig::default(),
            timeout_secs: Some(state.config.render_timeout_secs),
        };

        let jobs = Arc::clone(&state.jobs);
        let progress_job_id = job_id.clone();
        let progress = move |percent: u8| jobs.set_progress(&progress_job_id, percent);

        match scrollcast_media::render(&request, &inputs, &options, progress, Some(cancel_rx))
            .await
        {
            Ok(artifact) => {
                info!(job_id = %job_id, file = %artifact.filename, "Render completed");
                state.jobs.complete(&job_id, &artifact.filename);
            }
            Err(MediaError::Cancelled) => {
                info!(job_id = %job_id, "Render cancelled");
                state.jobs.mark_cancelled(&job_id);
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Render failed");
                state.jobs.fail(&job_id, &e.to_string());
            }
        }

        cleanup_uploads(&inputs).await;
    });
}

/// Poll a job's progress.
pub async fn progress(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<ProgressResponse>> {
    let job = state
        .jobs
        .get(&job_id)
        .ok_or_else(|| ApiError::not_found("Unknown job"))?;

    Ok(Json(ProgressResponse {
        job_id: job.job_id,
        status: job.status.to_string(),
        percent: job.percent,
        file: job.output_file,
        error: job.error_message,
    }))
}

/// Cancel a queued or running job.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let job = state
        .jobs
        .get(&job_id)
        .ok_or_else(|| ApiError::not_found("Unknown job"))?;

    if job.is_terminal() {
        return Err(ApiError::conflict(format!(
            "Job already {}",
            job.status
        )));
    }

    state.jobs.request_cancel(&job_id);
    Ok(Json(serde_json::json!({ "job_id": job_id, "status": "cancelling" })))
}

/// Download a finished artifact as an attachment.
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    if !is_artifact_name(&filename) {
        return Err(ApiError::bad_request("Invalid filename"));
    }

    let path = state.config.output_dir.join(&filename);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::not_found("File not found"))?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(bytes.into())
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(response)
}

/// Liveness plus encoder availability.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        ffmpeg: scrollcast_media::check_ffmpeg().is_ok(),
    })
}

/// Read the multipart form, saving file parts under randomized names. A
/// stream that errors part-way leaves no files behind.
async fn read_form(state: &AppState, mut multipart: Multipart) -> ApiResult<GenerateForm> {
    let mut form = GenerateForm::default();
    if let Err(e) = fill_form(state, &mut multipart, &mut form).await {
        remove_files(&form.saved_files()).await;
        return Err(e);
    }
    Ok(form)
}

async fn fill_form(
    state: &AppState,
    multipart: &mut Multipart,
    form: &mut GenerateForm,
) -> ApiResult<()> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "text" | "scroll_speed" | "font_size" | "main_color" | "shadow_color"
            | "shadow_style" | "overlay_shape" | "fallback" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Bad field {name}: {e}")))?;
                match name.as_str() {
                    "text" => form.text = Some(value),
                    "scroll_speed" => form.scroll_speed = Some(value),
                    "font_size" => form.font_size = Some(value),
                    "main_color" => form.main_color = Some(value),
                    "shadow_color" => form.shadow_color = Some(value),
                    "shadow_style" => form.shadow_style = Some(value),
                    "overlay_shape" => form.overlay_shape = Some(value),
                    "fallback" => form.fallback = Some(value),
                    _ => unreachable!(),
                }
            }
            "background" | "pip" | "intro" | "intro1" | "intro2" => {
                let original = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Bad upload {name}: {e}")))?;
                if bytes.is_empty() {
                    continue;
                }

                let path = state
                    .config
                    .upload_dir
                    .join(upload_filename(original.as_deref()));
                tokio::fs::write(&path, &bytes)
                    .await
                    .map_err(|e| ApiError::internal(format!("Failed to save upload: {e}")))?;

                match name.as_str() {
                    "background" => form.background = Some(path),
                    "pip" => form.pip = Some(path),
                    "intro" | "intro1" => form.intro1 = Some(path),
                    "intro2" => form.intro2 = Some(path),
                    _ => unreachable!(),
                }
            }
            other => {
                warn!(field = other, "Ignoring unknown form field");
            }
        }
    }

    Ok(())
}

fn parse_field<T: std::str::FromStr>(value: Option<&str>, name: &str) -> ApiResult<T> {
    let value = value.ok_or_else(|| ApiError::bad_request(format!("Missing field: {name}")))?;
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Field {name} is not a valid number")))
}

/// Randomized upload name; only a sanitized extension survives from the
/// client-supplied filename, so uploads can never collide or traverse.
fn upload_filename(original: Option<&str>) -> String {
    let ext = original
        .and_then(|n| n.rsplit('.').next())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_lowercase)
        .unwrap_or_else(|| "bin".to_string());
    format!("upload_{}.{}", Uuid::new_v4().simple(), ext)
}

/// Artifact names are exactly `final_<8 hex>.mp4`; anything else is rejected
/// before touching the filesystem.
fn is_artifact_name(name: &str) -> bool {
    let Some(hex) = name
        .strip_prefix("final_")
        .and_then(|rest| rest.strip_suffix(".mp4"))
    else {
        return false;
    };
    hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Uploads are single-use; remove them once the render ends.
async fn cleanup_uploads(inputs: &RenderInputs) {
    let mut paths = vec![inputs.background.clone()];
    paths.extend(inputs.pip.clone());
    paths.extend(inputs.intros.iter().cloned());
    remove_files(&paths).await;
}

async fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_artifact_name() {
        assert!(is_artifact_name("final_0a1b2c3d.mp4"));
        assert!(is_artifact_name("final_DEADBEEF.mp4"));

        assert!(!is_artifact_name("final_0a1b2c3.mp4")); // short hex
        assert!(!is_artifact_name("final_0a1b2c3d.mkv"));
        assert!(!is_artifact_name("../etc/passwd"));
        assert!(!is_artifact_name("final_../../x.mp4"));
        assert!(!is_artifact_name("final_0a1b2c3d.mp4/../x"));
        assert!(!is_artifact_name(""));
    }

    #[test]
    fn test_upload_filename_sanitizes_extension() {
        assert!(upload_filename(Some("movie.MP4")).ends_with(".mp4"));
        assert!(upload_filename(Some("no_extension")).ends_with(".bin"));
        assert!(upload_filename(Some("weird.../../name")).ends_with(".bin"));
        assert!(upload_filename(None).ends_with(".bin"));

        // Names never collide on the original filename
        let a = upload_filename(Some("same.mp4"));
        let b = upload_filename(Some("same.mp4"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_saved_files_collects_present_uploads() {
        let form = GenerateForm {
            background: Some(PathBuf::from("/tmp/a")),
            intro2: Some(PathBuf::from("/tmp/b")),
            ..GenerateForm::default()
        };
        assert_eq!(
            form.saved_files(),
            vec![PathBuf::from("/tmp/a"), PathBuf::from("/tmp/b")]
        );
        assert!(GenerateForm::default().saved_files().is_empty());
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(parse_field::<f64>(Some("50"), "scroll_speed").unwrap(), 50.0);
        assert_eq!(parse_field::<u32>(Some(" 40 "), "font_size").unwrap(), 40);
        assert!(parse_field::<u32>(Some("forty"), "font_size").is_err());
        assert!(parse_field::<u32>(None, "font_size").is_err());
    }
}
