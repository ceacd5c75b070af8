//! URL Tests
//!
//! Covers which pages each kind of visitor may open, the templates pages
//! render with, and unknown addresses.

mod common;

use axum::http::StatusCode;
use common::{app, TestApp, TestUser};
use scribe::domain::group::Group;
use scribe::domain::post::Post;

struct Fixture {
    app: TestApp,
    author: TestUser,
    other: TestUser,
    group: Group,
    post: Post,
}

async fn fixture() -> Fixture {
    let app = app().await;
    let author = app.create_user("author").await;
    let other = app.create_user("reader").await;
    let group = app.create_group("Test group", "test-slug").await;
    let post = app
        .create_post(&author, "Test post text", Some(&group))
        .await;

    Fixture {
        app,
        author,
        other,
        group,
        post,
    }
}

// ===========================================================================
// Public pages
// ===========================================================================

#[tokio::test]
async fn public_pages_open_for_anonymous() {
    let f = fixture().await;

    let pages = [
        "/".to_string(),
        format!("/group/{}/", f.group.slug),
        format!("/profile/{}/", f.author.username()),
        format!("/posts/{}/", f.post.id),
        "/auth/login/".to_string(),
        "/auth/signup/".to_string(),
    ];
    for path in pages {
        let resp = f.app.get(&path, None).await;
        assert_eq!(resp.status, StatusCode::OK, "GET {}", path);
    }
}

#[tokio::test]
async fn pages_use_expected_templates() {
    let f = fixture().await;
    let post_id = f.post.id;

    let pages = [
        ("/".to_string(), "posts/index.html"),
        (format!("/group/{}/", f.group.slug), "posts/group_list.html"),
        (format!("/profile/{}/", f.author.username()), "posts/profile.html"),
        (format!("/posts/{}/", post_id), "posts/post_detail.html"),
        ("/create/".to_string(), "posts/create.html"),
        (format!("/posts/{}/edit/", post_id), "posts/create.html"),
        ("/follow/".to_string(), "posts/follow.html"),
    ];
    for (path, template) in pages {
        let resp = f.app.get(&path, Some(&f.author.token)).await;
        assert_eq!(resp.status, StatusCode::OK, "GET {}", path);
        assert_eq!(resp.template(), template, "GET {}", path);
    }
}

#[tokio::test]
async fn unknown_page_renders_not_found() {
    let f = fixture().await;

    let resp = f.app.get("/unexisting_page/", None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.template(), "core/404.html");
    assert_eq!(resp.context()["path"], "/unexisting_page/");
}

#[tokio::test]
async fn unknown_objects_are_not_found() {
    let f = fixture().await;

    for path in ["/group/missing/", "/profile/nobody/", "/posts/9999/", "/posts/abc/"] {
        let resp = f.app.get(path, None).await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND, "GET {}", path);
    }
}

// ===========================================================================
// Login-only pages
// ===========================================================================

#[tokio::test]
async fn anonymous_is_redirected_to_login() {
    let f = fixture().await;
    let post_id = f.post.id;

    let pages = [
        "/create/".to_string(),
        format!("/posts/{}/edit/", post_id),
        "/follow/".to_string(),
        format!("/profile/{}/follow/", f.author.username()),
        format!("/profile/{}/unfollow/", f.author.username()),
    ];
    for path in pages {
        let resp = f.app.get(&path, None).await;
        assert_eq!(resp.status, StatusCode::FOUND, "GET {}", path);
        assert_eq!(
            resp.location.as_deref(),
            Some(format!("/auth/login/?next={}", path).as_str()),
            "GET {}",
            path
        );
    }
}

#[tokio::test]
async fn anonymous_post_actions_redirect_to_login() {
    let f = fixture().await;
    let post_id = f.post.id;

    let comment = format!("/posts/{}/comment/", post_id);
    let resp = f.app.post_form(&comment, &[("text", "hi")], None).await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(
        resp.location.as_deref(),
        Some(format!("/auth/login/?next={}", comment).as_str())
    );

    let delete = format!("/posts/{}/delete/", post_id);
    let resp = f.app.post_form(&delete, &[], None).await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(
        resp.location.as_deref(),
        Some(format!("/auth/login/?next={}", delete).as_str())
    );
    assert_eq!(f.app.post_count().await, 1);
}

#[tokio::test]
async fn session_of_deleted_user_is_anonymous() {
    let f = fixture().await;

    scribe::app::users::UserService::new(f.app.state.db.clone())
        .delete_user(f.other.id())
        .await
        .unwrap();

    let resp = f.app.get("/follow/", Some(&f.other.token)).await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(resp.location.as_deref(), Some("/auth/login/?next=/follow/"));
}

// ===========================================================================
// Authorship
// ===========================================================================

#[tokio::test]
async fn non_author_edit_redirects_to_post() {
    let f = fixture().await;
    let post_id = f.post.id;

    let resp = f
        .app
        .get(&format!("/posts/{}/edit/", post_id), Some(&f.other.token))
        .await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(
        resp.location.as_deref(),
        Some(format!("/posts/{}/", post_id).as_str())
    );
}

#[tokio::test]
async fn non_author_delete_redirects_to_post() {
    let f = fixture().await;
    let post_id = f.post.id;

    let resp = f
        .app
        .post_form(&format!("/posts/{}/delete/", post_id), &[], Some(&f.other.token))
        .await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(
        resp.location.as_deref(),
        Some(format!("/posts/{}/", post_id).as_str())
    );
    assert_eq!(f.app.post_count().await, 1);
}

#[tokio::test]
async fn author_delete_redirects_to_profile() {
    let f = fixture().await;
    let post_id = f.post.id;

    let resp = f
        .app
        .post_form(&format!("/posts/{}/delete/", post_id), &[], Some(&f.author.token))
        .await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(
        resp.location.as_deref(),
        Some(format!("/profile/{}/", f.author.username()).as_str())
    );
    assert_eq!(f.app.post_count().await, 0);
}

// ===========================================================================
// Operations
// ===========================================================================

#[tokio::test]
async fn health_reports_ok() {
    let f = fixture().await;
    let resp = f.app.get("/health", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["status"], "ok");
}

#[tokio::test]
async fn admin_endpoints_require_token() {
    let f = fixture().await;

    let resp = f
        .app
        .post_admin("/admin/cache/clear", serde_json::Value::Null, None)
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = f
        .app
        .post_admin("/admin/cache/clear", serde_json::Value::Null, Some("wrong"))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_creates_groups() {
    let f = fixture().await;

    let body = serde_json::json!({
        "title": "Cats",
        "slug": "cats",
        "description": "All about cats"
    });
    let resp = f
        .app
        .post_admin("/admin/groups", body.clone(), Some(common::TEST_ADMIN_TOKEN))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["slug"], "cats");

    let resp = f
        .app
        .post_admin("/admin/groups", body, Some(common::TEST_ADMIN_TOKEN))
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    let resp = f.app.get("/group/cats/", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.context()["group"]["title"], "Cats");
}
