//! Job submission and polling
//!
//! POST /create-mixtape and POST /make-video return 202 with a job token as
//! soon as the job is registered. GET /job/:job_id polls it.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::file_component;
use crate::error::{ApiError, ApiResult, Error};
use crate::jobs::{spawn_job, Job, JobId, JobKind};
use crate::library::{scan_folder, shuffle_tracks};
use crate::AppState;

/// POST /create-mixtape request
#[derive(Debug, Deserialize)]
pub struct CreateMixtapeRequest {
    pub job_prefix: String,
    pub transition_ms: Option<u64>,
    pub output_name: Option<String>,
    /// Shuffle track order (service default when absent)
    pub shuffle: Option<bool>,
}

/// POST /make-video request
#[derive(Debug, Deserialize)]
pub struct MakeVideoRequest {
    pub image_path: PathBuf,
    pub audio_path: PathBuf,
    pub output_name: Option<String>,
}

/// Response for accepted job submissions
#[derive(Debug, Serialize)]
pub struct JobAccepted {
    pub job_id: JobId,
}

/// POST /create-mixtape
///
/// Mixes every allowed audio file in the prefix folder. An empty folder fails
/// the job rather than the request.
pub async fn create_mixtape(
    State(state): State<AppState>,
    Json(request): Json<CreateMixtapeRequest>,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    let config = &state.config;
    let folder = config.prefix_dir(&file_component(&request.job_prefix, "job_prefix")?);
    let output_name = match &request.output_name {
        Some(name) => file_component(name, "output_name")?,
        None => config.mixing.output_name.clone(),
    };
    let output = config.output_path(&output_name);
    let shuffle = request.shuffle.unwrap_or(config.mixing.shuffle);
    let allowed = config.allowed_extensions.clone();
    let mixer = config.mixer(request.transition_ms);
    let encoder = config.audio_encoder();

    let (job_id, _handle) = spawn_job(
        Arc::clone(&state.registry),
        JobKind::Mixtape,
        move |ctx| async move {
            let mut tracks = scan_folder(&folder, &allowed)?;
            if tracks.is_empty() {
                return Err(Error::InvalidInput("No audio files found".to_string()));
            }

            ctx.start()?;
            if shuffle {
                shuffle_tracks(&mut tracks);
            }
            info!(job_id = %ctx.id(), tracks = tracks.len(), shuffle, "Mixing tracks");

            let written =
                tokio::task::spawn_blocking(move || mixer.mix_files(&tracks, &output, &encoder))
                    .await
                    .map_err(|e| Error::Internal(format!("Mix task aborted: {}", e)))??;

            Ok::<_, Error>(written.display().to_string())
        },
    );

    info!(job_id = %job_id, prefix = %request.job_prefix, "Mixtape job submitted");
    Ok((StatusCode::ACCEPTED, Json(JobAccepted { job_id })))
}

/// POST /make-video
pub async fn make_video(
    State(state): State<AppState>,
    Json(request): Json<MakeVideoRequest>,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    let output_name = match &request.output_name {
        Some(name) => file_component(name, "output_name")?,
        None => state.config.video.output_name.clone(),
    };
    let renderer = state.config.video_renderer();
    let MakeVideoRequest {
        image_path,
        audio_path,
        ..
    } = request;

    let (job_id, _handle) = spawn_job(
        Arc::clone(&state.registry),
        JobKind::Video,
        move |ctx| async move {
            ctx.start()?;
            let written = renderer.render(&image_path, &audio_path, &output_name).await?;
            Ok::<_, Error>(written.display().to_string())
        },
    );

    info!(job_id = %job_id, "Video job submitted");
    Ok((StatusCode::ACCEPTED, Json(JobAccepted { job_id })))
}

/// GET /job/:job_id
///
/// Unknown and malformed tokens are both 404.
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Job>> {
    let not_found = || ApiError::NotFound(format!("job not found: {}", job_id));
    let id: JobId = job_id.parse().map_err(|_| not_found())?;
    state.registry.lookup(id).map(Json).ok_or_else(not_found)
}

/// Build job routes
pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/create-mixtape", post(create_mixtape))
        .route("/make-video", post(make_video))
        .route("/job/:job_id", get(job_status))
}
