//! GET /download?path=
//!
//! Streams a file back to the caller. Unless unscoped downloads are enabled,
//! only files under the output and upload directories are served.

use std::path::{Path, PathBuf};

use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult, Error, Result};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub path: PathBuf,
}

pub async fn download_file(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<Response> {
    let not_found = || ApiError::NotFound(format!("file not found: {}", query.path.display()));

    let resolved = tokio::fs::canonicalize(&query.path).await.map_err(|_| not_found())?;
    if !resolved.is_file() {
        return Err(not_found());
    }

    if !state.config.allow_unscoped_downloads {
        check_scope(&resolved, &state.config.download_roots())?;
    }

    let file = tokio::fs::File::open(&resolved).await?;
    let length = file.metadata().await?.len();
    let file_name = resolved
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', ""))
        .unwrap_or_else(|| "download".to_string());

    debug!("Serving {} ({} bytes)", resolved.display(), length);

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, length.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response())
}

/// Refuse `path` unless it lies under one of `roots`
fn check_scope(path: &Path, roots: &[&Path]) -> Result<()> {
    if is_within_roots(path, roots) {
        return Ok(());
    }
    warn!("Refused download outside served folders: {}", path.display());
    Err(Error::Forbidden(format!(
        "{} is outside the served folders",
        path.display()
    )))
}

/// True when `path` lies under one of `roots` after resolving links
fn is_within_roots(path: &Path, roots: &[&Path]) -> bool {
    roots.iter().any(|root| {
        std::fs::canonicalize(root)
            .map(|root| path.starts_with(root))
            .unwrap_or(false)
    })
}

/// Build download routes
pub fn download_routes() -> Router<AppState> {
    Router::new().route("/download", get(download_file))
}
