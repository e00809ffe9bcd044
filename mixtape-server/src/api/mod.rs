//! HTTP API handlers

pub mod description;
pub mod download;
pub mod health;
pub mod jobs;
pub mod upload;

pub use description::description_routes;
pub use download::download_routes;
pub use health::health_routes;
pub use jobs::job_routes;
pub use upload::upload_routes;

use std::path::Path;

use crate::error::{ApiError, ApiResult};

/// Reduce a client-supplied name to a single path component.
///
/// Directory parts are dropped; names with no usable component are rejected.
pub(crate) fn file_component(name: &str, what: &str) -> ApiResult<String> {
    Path::new(name.trim())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty() && n != "." && n != "..")
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid {}: {:?}", what, name)))
}
