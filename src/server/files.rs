//! Raw files from the content directory (article images and attachments)

use axum::{
    extract::{Path, State},
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use std::path::{Component, PathBuf};

use super::{ApiError, AppState};

/// MIME type by file extension; unknown types are served as octet streams
pub fn mime_type(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        _ => "application/octet-stream",
    }
}

/// Join a decoded request path onto the content root; `None` when it would climb out of it
pub fn resolve(root: &std::path::Path, relative: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for component in std::path::Path::new(relative.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(path)
}

/// `GET /content/*path`
pub async fn content_file(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response, ApiError> {
    let root = state.index.root();
    let path = resolve(root, &raw).ok_or(ApiError::Forbidden)?;

    let metadata = match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => return Err(ApiError::NotFound),
    };

    // Symlinks may still point outside the content tree
    let (canonical, canonical_root) = match (
        tokio::fs::canonicalize(&path).await,
        tokio::fs::canonicalize(root).await,
    ) {
        (Ok(p), Ok(r)) => (p, r),
        _ => return Err(ApiError::NotFound),
    };
    if !canonical.starts_with(&canonical_root) {
        tracing::warn!(path = %path.display(), "content file outside the content root");
        return Err(ApiError::Forbidden);
    }

    let bytes = tokio::fs::read(&canonical)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;
    tracing::debug!(path = %raw, bytes = metadata.len(), "content file served");

    Ok((
        [
            (CONTENT_TYPE, mime_type(&path)),
            (CACHE_CONTROL, "public, max-age=3600"),
        ],
        bytes,
    )
        .into_response())
}
