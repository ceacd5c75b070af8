use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::AppState;

mod auth;
mod error;
mod handlers;
pub mod middleware;
pub mod page;
mod routes;

pub use auth::{AdminToken, AuthUser, SESSION_COOKIE};
pub use error::{login_url, AppError, LOGIN_URL};

// room for the multipart framing and the text fields around an image
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let body_limit = state.upload_max_bytes + FORM_OVERHEAD_BYTES;
    let media = ServeDir::new(state.storage.root());

    Router::new()
        .merge(routes::health())
        .merge(routes::index(state.clone()))
        .merge(routes::posts())
        .merge(routes::follows())
        .merge(routes::auth())
        .merge(routes::admin())
        .nest_service("/media", media)
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
        .with_state(state)
}
