use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub const LOGIN_URL: &str = "/auth/login/";

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    location: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            location: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Anonymous access to a page that needs a session: 302 to the login
    /// page, remembering where the user was going.
    pub fn login_required(next: &str) -> Self {
        Self {
            status: StatusCode::FOUND,
            message: "authentication required".to_string(),
            location: Some(login_url(next)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        match self.location {
            Some(location) => (self.status, [(header::LOCATION, location)], body).into_response(),
            None => (self.status, body).into_response(),
        }
    }
}

/// `/auth/login/?next=<path>`, keeping `/` readable in the query.
pub fn login_url(next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("{}?next={}", LOGIN_URL, encoded.replace("%2F", "/"))
}
