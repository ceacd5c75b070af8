use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::AppState;

pub const INDEX_CACHE_PREFIX: &str = "index_page";
const MAX_CACHED_BODY_BYTES: usize = 4 * 1024 * 1024;

#[derive(Serialize, Deserialize)]
struct CachedPage {
    content_type: Option<String>,
    body: String,
}

/// Serves GET requests for the wrapped route from the page cache, keyed by
/// path and query. Entries live for the configured TTL; nothing else
/// invalidates them short of an explicit clear.
pub async fn cache_index_page(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = cache_key(INDEX_CACHE_PREFIX, request.uri());
    match state.cache.get(&key).await {
        Ok(Some(payload)) => match restore(&payload) {
            Some(response) => {
                tracing::debug!(cache_key = %key, "page cache hit");
                return response;
            }
            None => tracing::warn!(cache_key = %key, "discarding unreadable page cache entry"),
        },
        Ok(None) => {}
        Err(err) => tracing::warn!(error = ?err, cache_key = %key, "page cache read failed"),
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK || response.headers().contains_key(header::SET_COOKIE) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_CACHED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(error = ?err, cache_key = %key, "failed to buffer page for caching");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let entry = CachedPage {
        content_type: parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body: STANDARD.encode(&bytes),
    };
    match serde_json::to_vec(&entry) {
        Ok(payload) => {
            let ttl = Duration::from_secs(state.index_cache_ttl_seconds);
            if let Err(err) = state.cache.set(&key, payload, ttl).await {
                tracing::warn!(error = ?err, cache_key = %key, "page cache write failed");
            }
        }
        Err(err) => tracing::warn!(error = ?err, "failed to encode page cache entry"),
    }

    Response::from_parts(parts, Body::from(bytes))
}

/// `<prefix>.GET.<sha256 of path and query>`
pub fn cache_key(prefix: &str, uri: &Uri) -> String {
    let target = uri
        .path_and_query()
        .map(|value| value.as_str())
        .unwrap_or_else(|| uri.path());
    let digest = Sha256::digest(target.as_bytes());
    format!("{}.GET.{}", prefix, hex::encode(digest))
}

fn restore(payload: &[u8]) -> Option<Response> {
    let entry: CachedPage = serde_json::from_slice(payload).ok()?;
    let body = STANDARD.decode(entry.body.as_bytes()).ok()?;

    let mut response = Response::new(Body::from(body));
    if let Some(content_type) = entry.content_type {
        if let Ok(value) = HeaderValue::from_str(&content_type) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
    }
    Some(response)
}
