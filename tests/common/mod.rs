#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use scribe::app::auth::AuthService;
use scribe::app::groups::GroupService;
use scribe::app::posts::{PostInput, PostService};
use scribe::config::AppConfig;
use scribe::domain::group::Group;
use scribe::domain::post::Post;
use scribe::domain::user::User;
use scribe::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

// "0123456789abcdef0123456789abcdef", test-only
pub const TEST_SESSION_KEY: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";
pub const TEST_ADMIN_TOKEN: &str = "test-admin-token-12345";
pub const DEFAULT_PASSWORD: &str = "testpassword123";

const MULTIPART_BOUNDARY: &str = "----scribe-test-boundary";

/// A 2x1 GIF.
pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

// ---------------------------------------------------------------------------
// TestApp: one fresh database, cache and media root per test
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub media_root: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookie: Option<String>,
    pub body_bytes: bytes::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn template(&self) -> String {
        self.json()["template"].as_str().unwrap_or("").to_string()
    }

    pub fn context(&self) -> Value {
        self.json()["context"].clone()
    }

    /// Texts of the posts on the rendered page, in display order.
    pub fn page_texts(&self) -> Vec<String> {
        self.context()["page_obj"]["object_list"]
            .as_array()
            .map(|posts| {
                posts
                    .iter()
                    .map(|post| post["text"].as_str().unwrap_or("").to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn page_len(&self) -> usize {
        self.page_texts().len()
    }

    pub fn error_message(&self) -> String {
        self.json()["error"].as_str().unwrap_or("").to_string()
    }
}

pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }
}

pub async fn app() -> TestApp {
    TestApp::setup().await
}

impl TestApp {
    async fn setup() -> Self {
        let media_root = tempfile::tempdir().expect("failed to create media root");

        let config = AppConfig {
            http_addr: "127.0.0.1:0".to_string(),
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 1,
            db_connect_timeout_seconds: 5,
            redis_url: None,
            media_root: media_root.path().to_path_buf(),
            upload_max_bytes: 5 * 1024 * 1024,
            session_key: scribe::config::decode_key_32(TEST_SESSION_KEY)
                .expect("test session key must decode"),
            session_ttl_minutes: 60,
            index_cache_ttl_seconds: 20,
            admin_token: Some(TEST_ADMIN_TOKEN.to_string()),
        };

        let state = AppState::from_config(&config)
            .await
            .expect("failed to build AppState");
        let router = scribe::http::router(state.clone());

        TestApp {
            router,
            state,
            media_root,
        }
    }

    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let header_value = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        let location = header_value(header::LOCATION);
        let set_cookie = header_value(header::SET_COOKIE);
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse {
            status,
            location,
            set_cookie,
            body_bytes,
        }
    }

    fn builder(method: Method, path: &str, token: Option<&str>) -> axum::http::request::Builder {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("sessionid={}", token));
        }
        builder
    }

    // ------------------------------------------------------------------
    // Convenience HTTP helpers
    // ------------------------------------------------------------------
    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        let request = Self::builder(Method::GET, path, token)
            .body(Body::empty())
            .unwrap();
        self.request(request).await
    }

    pub async fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        token: Option<&str>,
    ) -> TestResponse {
        let body: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Self::builder(Method::POST, path, token)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.request(request).await
    }

    /// POST `multipart/form-data` with text fields and an optional
    /// `image` file part of (filename, bytes).
    pub async fn post_multipart(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        image: Option<(&str, &[u8])>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            );
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        if let Some((filename, data)) = image {
            body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\n",
                    filename
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: image/gif\r\n\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

        let request = Self::builder(Method::POST, path, token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.request(request).await
    }

    /// POST JSON with the admin token in the x-admin-token header.
    pub async fn post_admin(
        &self,
        path: &str,
        body: Value,
        admin_token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Self::builder(Method::POST, path, None)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = admin_token {
            builder = builder.header("x-admin-token", token);
        }
        let request = builder
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap();
        self.request(request).await
    }

    pub async fn clear_cache(&self) {
        let resp = self
            .post_admin("/admin/cache/clear", Value::Null, Some(TEST_ADMIN_TOKEN))
            .await;
        assert_eq!(resp.status, StatusCode::NO_CONTENT);
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.state.db.clone(),
            self.state.session_key,
            self.state.session_ttl_minutes,
        )
    }

    /// Create a user and issue a session token for them.
    pub async fn create_user(&self, username: &str) -> TestUser {
        let auth = self.auth_service();
        let user = auth
            .signup(username, &format!("{}@example.com", username), DEFAULT_PASSWORD)
            .await
            .expect("signup failed");
        let session = auth.issue_session(user.id).expect("issue session failed");

        TestUser {
            user,
            token: session.token,
        }
    }

    pub async fn create_group(&self, title: &str, slug: &str) -> Group {
        GroupService::new(self.state.db.clone())
            .create_group(title, slug, "Test group description")
            .await
            .expect("create group failed")
    }

    pub async fn create_post(&self, author: &TestUser, text: &str, group: Option<&Group>) -> Post {
        PostService::new(self.state.db.clone())
            .create_post(
                author.id(),
                PostInput {
                    text: text.to_string(),
                    group_id: group.map(|group| group.id),
                    image: None,
                },
            )
            .await
            .expect("create post failed")
    }

    pub async fn create_posts(&self, author: &TestUser, count: usize, group: Option<&Group>) {
        for i in 0..count {
            self.create_post(author, &format!("Test post {}", i), group)
                .await;
        }
    }

    pub async fn post_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(self.state.db.pool())
            .await
            .expect("count posts failed")
    }
}
