//! Static file serving for the page that hosts the signaling client.
//!
//! Mounted as the fallback of the relay router so the page and the
//! WebSocket endpoint share one origin.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;

const INDEX_FILE: &str = "index.html";

/// Router serving files below `root` for any path.
pub fn router(root: impl Into<PathBuf>) -> Router {
    Router::new()
        .fallback(serve_asset)
        .with_state(Arc::new(root.into()))
}

/// Content type for a file, chosen by extension. `None` means the file is not served.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match ext.as_str() {
        "html" => "text/html",
        "js" => "application/javascript",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "css" => "text/css",
        "xml" => "text/xml",
        _ => return None,
    };
    Some(content_type)
}

/// Map a request path onto a relative file path, refusing anything that
/// could leave the root.
fn resolve_request_path(request_path: &str) -> Option<PathBuf> {
    let trimmed = request_path.trim_start_matches('/');
    let mut relative = PathBuf::from(trimmed);
    if trimmed.is_empty() || trimmed.ends_with('/') {
        relative.push(INDEX_FILE);
    }

    relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
        .then_some(relative)
}

async fn serve_asset(State(root): State<Arc<PathBuf>>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let Some(relative) = resolve_request_path(uri.path()) else {
        tracing::debug!(path = uri.path(), "rejected asset path");
        return StatusCode::NOT_FOUND.into_response();
    };

    let Some(content_type) = content_type_for(&relative) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let full_path = root.join(&relative);
    match tokio::fs::read(&full_path).await {
        Ok(body) => ([(CONTENT_TYPE, content_type)], body).into_response(),
        Err(err) => {
            tracing::error!(path = %full_path.display(), error = %err, "failed to read asset");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
