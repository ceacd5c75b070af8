use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub const INDEX: &str = "posts/index.html";
pub const GROUP_LIST: &str = "posts/group_list.html";
pub const PROFILE: &str = "posts/profile.html";
pub const POST_DETAIL: &str = "posts/post_detail.html";
pub const POST_FORM: &str = "posts/create.html";
pub const FOLLOW: &str = "posts/follow.html";
pub const LOGIN: &str = "users/login.html";
pub const SIGNUP: &str = "users/signup.html";
pub const LOGGED_OUT: &str = "users/logged_out.html";
pub const NOT_FOUND: &str = "core/404.html";

/// A page handed to the renderer: which template, and the context it is
/// rendered with.
#[derive(Debug, Serialize)]
pub struct Rendered<C> {
    pub template: &'static str,
    pub context: C,
    #[serde(skip)]
    status: StatusCode,
}

pub fn render<C: Serialize>(template: &'static str, context: C) -> Rendered<C> {
    Rendered {
        template,
        context,
        status: StatusCode::OK,
    }
}

impl<C: Serialize> Rendered<C> {
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<C: Serialize> IntoResponse for Rendered<C> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct NoContext {}
