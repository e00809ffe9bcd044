//! POST /generate-description

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::file_component;
use crate::description::generate_description;
use crate::error::{ApiError, ApiResult, Error};
use crate::library::scan_folder;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DescriptionRequest {
    pub job_prefix: String,
    pub mixtape_name: Option<String>,
    pub genre: Option<String>,
    pub start_offset_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct DescriptionResponse {
    pub description: String,
}

/// Describe the prefix folder's tracks in file-name order.
///
/// Runs synchronously; a folder without tracks is a 400.
pub async fn create_description(
    State(state): State<AppState>,
    Json(request): Json<DescriptionRequest>,
) -> ApiResult<Json<DescriptionResponse>> {
    let prefix = file_component(&request.job_prefix, "job_prefix")?;
    let folder = state.config.prefix_dir(&prefix);

    let tracks = match scan_folder(&folder, &state.config.allowed_extensions) {
        Ok(tracks) => tracks,
        Err(Error::NotFound(_)) => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    if tracks.is_empty() {
        return Err(ApiError::BadRequest(format!("No tracks found for job_prefix {}", prefix)));
    }

    let mut options = state.config.description_options();
    if let Some(name) = request.mixtape_name {
        options.mixtape_name = name;
    }
    if let Some(genre) = request.genre {
        options.genre = genre;
    }
    if let Some(offset) = request.start_offset_secs {
        options.start_offset_secs = offset;
    }

    let track_count = tracks.len();
    let description = tokio::task::spawn_blocking(move || generate_description(&tracks, &options))
        .await
        .map_err(|e| ApiError::Internal(format!("Description task aborted: {}", e)))??;

    info!(prefix = %prefix, tracks = track_count, "Generated description");
    Ok(Json(DescriptionResponse { description }))
}

/// Build description routes
pub fn description_routes() -> Router<AppState> {
    Router::new().route("/generate-description", post(create_description))
}
