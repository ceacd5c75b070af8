use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderName};
use subtle::ConstantTimeEq;

use crate::app::auth::AuthService;
use crate::http::AppError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "sessionid";

/// The logged-in user of a request. Anonymous requests are rejected with a
/// redirect to the login page; use `Option<AuthUser>` where anonymous
/// access is allowed.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
}

#[derive(Debug, Clone)]
pub struct AdminToken;

const ADMIN_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-admin-token");

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let next = parts
            .uri
            .path_and_query()
            .map(|value| value.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let token = match session_token(&parts.headers) {
            Some(token) => token,
            None => return Err(AppError::login_required(&next)),
        };

        let service = AuthService::new(
            state.db.clone(),
            state.session_key,
            state.session_ttl_minutes,
        );
        let session = service.authenticate(&token).await.map_err(|err| {
            tracing::error!(error = ?err, "failed to authenticate session");
            AppError::internal("failed to authenticate")
        })?;

        let session = session.ok_or_else(|| AppError::login_required(&next))?;
        Ok(AuthUser {
            user_id: session.user_id,
        })
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state
            .admin_token
            .as_ref()
            .ok_or_else(|| AppError::forbidden("admin token not configured"))?;

        let provided = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::forbidden("missing admin token"))?;

        if !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
            return Err(AppError::forbidden("invalid admin token"));
        }

        Ok(AdminToken)
    }
}

/// The session token from the `sessionid` cookie, or from a bearer
/// `Authorization` header for non-browser clients.
fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
    })
}

pub fn session_cookie(token: &str, max_age_seconds: u64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_seconds
    )
}

pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}
