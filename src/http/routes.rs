use axum::{middleware, routing::get, routing::post, Router};

use crate::http::handlers;
use crate::http::middleware::cache_page::cache_index_page;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn index(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index))
        .route_layer(middleware::from_fn_with_state(state, cache_index_page))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/group/:slug/", get(handlers::group_posts))
        .route("/profile/:username/", get(handlers::profile))
        .route("/posts/:post_id/", get(handlers::post_detail))
        .route(
            "/create/",
            get(handlers::post_create_form).post(handlers::post_create),
        )
        .route(
            "/posts/:post_id/edit/",
            get(handlers::post_edit_form).post(handlers::post_edit),
        )
        .route("/posts/:post_id/delete/", post(handlers::post_delete))
        .route("/posts/:post_id/comment/", post(handlers::add_comment))
}

pub fn follows() -> Router<AppState> {
    Router::new()
        .route("/follow/", get(handlers::follow_index))
        .route("/profile/:username/follow/", get(handlers::profile_follow))
        .route(
            "/profile/:username/unfollow/",
            get(handlers::profile_unfollow),
        )
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route(
            "/auth/login/",
            get(handlers::login_form).post(handlers::login),
        )
        .route(
            "/auth/signup/",
            get(handlers::signup_form).post(handlers::signup),
        )
        .route("/auth/logout/", get(handlers::logout))
}

pub fn admin() -> Router<AppState> {
    Router::new()
        .route("/admin/cache/clear", post(handlers::clear_cache))
        .route("/admin/groups", post(handlers::create_group))
}
