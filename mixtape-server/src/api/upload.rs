//! POST /upload-track

use std::path::{Path, PathBuf};

use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use mixtape_common::uuid_utils;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use super::file_component;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Job prefix used when the form omits one
pub const DEFAULT_JOB_PREFIX: &str = "default";

/// Largest accepted upload body
const MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Where the track was stored
    pub uploaded: String,
}

/// A file field already written to a hidden staging file
struct StagedFile {
    name: String,
    path: PathBuf,
    bytes: u64,
}

/// Store one track under `<upload_dir>/<job_prefix>/<file name>`.
///
/// Multipart fields: `file` (required) and `job_prefix` (optional). Fields may
/// arrive in any order, so the file is streamed to a staging file in the
/// upload directory and moved into place once the prefix is known.
pub async fn upload_track(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut staged: Option<StagedFile> = None;
    let result = store_upload(&state, multipart, &mut staged).await;

    if result.is_err() {
        if let Some(file) = staged {
            remove_staged(&file.path).await;
        }
    }

    result.map(Json)
}

async fn store_upload(
    state: &AppState,
    mut multipart: Multipart,
    staged: &mut Option<StagedFile>,
) -> ApiResult<UploadResponse> {
    let mut job_prefix: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::BadRequest("Upload has no file name".to_string()))?;

                if let Some(previous) = staged.take() {
                    remove_staged(&previous.path).await;
                }

                tokio::fs::create_dir_all(&state.config.upload_dir).await?;
                let path = state.config.upload_dir.join(format!(
                    ".upload-{}.partial",
                    uuid_utils::to_simple_string(&uuid_utils::generate())
                ));
                *staged = Some(StagedFile {
                    name,
                    path: path.clone(),
                    bytes: 0,
                });

                let bytes = stream_to_file(field, &path).await?;
                if let Some(file) = staged.as_mut() {
                    file.bytes = bytes;
                }
            }
            Some("job_prefix") => {
                let text = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read job_prefix: {}", e))
                })?;
                if !text.trim().is_empty() {
                    job_prefix = Some(text);
                }
            }
            _ => {}
        }
    }

    let file = staged
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("Missing file field".to_string()))?;
    let file_name = file_component(&file.name, "file name")?;
    let job_prefix = match job_prefix {
        Some(prefix) => file_component(&prefix, "job_prefix")?,
        None => DEFAULT_JOB_PREFIX.to_string(),
    };

    let dest_dir = state.config.prefix_dir(&job_prefix);
    tokio::fs::create_dir_all(&dest_dir).await?;
    let dest = dest_dir.join(&file_name);
    tokio::fs::rename(&file.path, &dest).await?;

    info!(
        job_prefix = %job_prefix,
        bytes = file.bytes,
        "Uploaded track to {}",
        dest.display()
    );

    *staged = None;
    Ok(UploadResponse {
        uploaded: dest.display().to_string(),
    })
}

/// Write a multipart field to `path` chunk by chunk, returning the byte count
async fn stream_to_file(mut field: Field<'_>, path: &Path) -> ApiResult<u64> {
    let mut out = tokio::fs::File::create(path).await?;
    let mut written = 0u64;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        out.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    out.flush().await?;
    Ok(written)
}

async fn remove_staged(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove staged upload {}: {}", path.display(), e);
        }
    }
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/upload-track", post(upload_track))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
