use axum::{
    extract::{Multipart, OriginalUri, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use url::{Position, Url};

use crate::app::auth::AuthService;
use crate::app::comments::CommentService;
use crate::app::forms::{
    self, Choice, FormErrors, FormView, PostSubmission, UploadedFile, COMMENT_FORM, LOGIN_FORM,
    POST_FORM, SIGNUP_FORM,
};
use crate::app::groups::GroupService;
use crate::app::paginator::Page;
use crate::app::posts::{PostFilter, PostInput, PostService};
use crate::app::social::SocialService;
use crate::app::users::UserService;
use crate::domain::comment::Comment;
use crate::domain::group::{self, Group};
use crate::domain::post::Post;
use crate::domain::user::{Author, User};
use crate::http::auth::{expired_session_cookie, session_cookie};
use crate::http::page::{self, render, NoContext, Rendered};
use crate::http::{AdminToken, AppError, AuthUser};
use crate::AppState;

const MSG_BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";
const MSG_USERNAME_TAKEN: &str = "A user with that username already exists.";
const LOCAL_ORIGIN: &str = "http://localhost/";

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

/// Raw `?page=` value; the paginator decides what it means.
#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// 302 to `location`.
fn found(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}

fn post_detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

fn profile_url(username: &str) -> String {
    let segment: String = url::form_urlencoded::byte_serialize(username.as_bytes()).collect();
    format!("/profile/{}/", segment)
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::not_found("page not found"))
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = state.db.ping().await.is_ok();
    let cache = state.cache.ping().await.is_ok();
    let status = if db && cache { "ok" } else { "degraded" };

    Json(HealthResponse { status })
}

// ============================================================================
// Listings
// ============================================================================

#[derive(Serialize)]
pub struct IndexContext {
    pub page_obj: Page<Post>,
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Rendered<IndexContext>, AppError> {
    let service = PostService::new(state.db.clone());
    let page_obj = service
        .list_page(PostFilter::All, query.page.as_deref())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to list posts");
            AppError::internal("failed to list posts")
        })?;

    Ok(render(page::INDEX, IndexContext { page_obj }))
}

#[derive(Serialize)]
pub struct GroupContext {
    pub group: Group,
    pub page_obj: Page<Post>,
}

pub async fn group_posts(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Rendered<GroupContext>, AppError> {
    let group = GroupService::new(state.db.clone())
        .get_by_slug(&slug)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, slug = %slug, "failed to fetch group");
            AppError::internal("failed to fetch group")
        })?
        .ok_or_else(|| AppError::not_found("group not found"))?;

    let page_obj = PostService::new(state.db.clone())
        .list_page(PostFilter::Group(group.id), query.page.as_deref())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, group_id = group.id, "failed to list group posts");
            AppError::internal("failed to list group posts")
        })?;

    Ok(render(page::GROUP_LIST, GroupContext { group, page_obj }))
}

#[derive(Serialize)]
pub struct ProfileContext {
    pub author: Author,
    pub page_obj: Page<Post>,
    pub posts_count: i64,
    pub following: bool,
}

pub async fn profile(
    Path(username): Path<String>,
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Rendered<ProfileContext>, AppError> {
    let author = UserService::new(state.db.clone())
        .get_by_username(&username)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %username, "failed to fetch user");
            AppError::internal("failed to fetch user")
        })?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    let page_obj = PostService::new(state.db.clone())
        .list_page(PostFilter::Author(author.id), query.page.as_deref())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, author_id = author.id, "failed to list user posts");
            AppError::internal("failed to list user posts")
        })?;

    let following = match auth {
        Some(auth) if auth.user_id != author.id => SocialService::new(state.db.clone())
            .is_following(auth.user_id, author.id)
            .await
            .map_err(|err| {
                tracing::error!(
                    error = ?err,
                    user_id = auth.user_id,
                    author_id = author.id,
                    "failed to check follow"
                );
                AppError::internal("failed to check follow")
            })?,
        _ => false,
    };

    Ok(render(
        page::PROFILE,
        ProfileContext {
            author: Author::from(&author),
            posts_count: page_obj.count as i64,
            page_obj,
            following,
        },
    ))
}

#[derive(Serialize)]
pub struct FollowContext {
    pub page_obj: Page<Post>,
}

pub async fn follow_index(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Rendered<FollowContext>, AppError> {
    let page_obj = PostService::new(state.db.clone())
        .list_page(PostFilter::FollowedBy(auth.user_id), query.page.as_deref())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to list followed posts");
            AppError::internal("failed to list followed posts")
        })?;

    Ok(render(page::FOLLOW, FollowContext { page_obj }))
}

// ============================================================================
// Post detail and comments
// ============================================================================

#[derive(Serialize)]
pub struct PostDetailContext {
    pub post: Post,
    pub comments: Vec<Comment>,
    pub form: FormView,
    pub author_posts_count: i64,
}

pub async fn post_detail(
    Path(post_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Rendered<PostDetailContext>, AppError> {
    let post_id = parse_id(&post_id)?;
    let posts = PostService::new(state.db.clone());
    let post = fetch_post(&posts, post_id).await?;

    let comments = CommentService::new(state.db.clone())
        .list_for_post(post.id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id = post.id, "failed to list comments");
            AppError::internal("failed to list comments")
        })?;

    let author_posts_count = posts.count_by_author(post.author.id).await.map_err(|err| {
        tracing::error!(error = ?err, author_id = post.author.id, "failed to count posts");
        AppError::internal("failed to count posts")
    })?;

    Ok(render(
        page::POST_DETAIL,
        PostDetailContext {
            post,
            comments,
            form: COMMENT_FORM.view(),
            author_posts_count,
        },
    ))
}

#[derive(Deserialize)]
pub struct CommentSubmission {
    pub text: Option<String>,
}

pub async fn add_comment(
    Path(post_id): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
    Form(payload): Form<CommentSubmission>,
) -> Result<Response, AppError> {
    let post_id = parse_id(&post_id)?;
    let post = fetch_post(&PostService::new(state.db.clone()), post_id).await?;

    match forms::validate_comment(payload.text.as_deref()) {
        Ok(text) => {
            CommentService::new(state.db.clone())
                .add_comment(post.id, auth.user_id, &text)
                .await
                .map_err(|err| {
                    tracing::error!(
                        error = ?err,
                        post_id = post.id,
                        author_id = auth.user_id,
                        "failed to add comment"
                    );
                    AppError::internal("failed to add comment")
                })?;
        }
        Err(errors) => {
            tracing::debug!(post_id = post.id, ?errors, "comment rejected");
        }
    }

    Ok(found(post_detail_url(post.id)))
}

// ============================================================================
// Post create / edit / delete
// ============================================================================

#[derive(Serialize)]
pub struct PostFormContext {
    pub form: FormView,
    pub is_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
}

pub async fn post_create_form(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Rendered<PostFormContext>, AppError> {
    let form = post_form(&state, None, FormErrors::default()).await?;
    Ok(render(
        page::POST_FORM,
        PostFormContext {
            form,
            is_edit: false,
            post_id: None,
        },
    ))
}

pub async fn post_create(
    auth: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let submission = read_post_submission(multipart).await?;
    let groups = list_groups(&state).await?;

    let clean = match forms::validate_post(&submission, &groups, state.upload_max_bytes) {
        Ok(clean) => clean,
        Err(errors) => {
            let form = post_form(&state, Some(&submission), errors).await?;
            return Ok(render(
                page::POST_FORM,
                PostFormContext {
                    form,
                    is_edit: false,
                    post_id: None,
                },
            )
            .into_response());
        }
    };

    let image = store_image(&state, clean.image.as_ref()).await?;
    let created = PostService::new(state.db.clone())
        .create_post(
            auth.user_id,
            PostInput {
                text: clean.text,
                group_id: clean.group_id,
                image: image.clone(),
            },
        )
        .await;
    let post = match created {
        Ok(post) => post,
        Err(err) => {
            tracing::error!(error = ?err, author_id = auth.user_id, "failed to create post");
            discard_image(&state, image.as_deref()).await;
            return Err(AppError::internal("failed to create post"));
        }
    };

    Ok(found(profile_url(&post.author.username)))
}

pub async fn post_edit_form(
    Path(post_id): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let post_id = parse_id(&post_id)?;
    let post = fetch_post(&PostService::new(state.db.clone()), post_id).await?;
    if !post.is_authored_by(auth.user_id) {
        return Ok(found(post_detail_url(post.id)));
    }

    let submission = PostSubmission {
        text: Some(post.text.clone()),
        group: post.group.as_ref().map(|group| group.id.to_string()),
        image: None,
    };
    let form = post_form(&state, Some(&submission), FormErrors::default()).await?;

    Ok(render(
        page::POST_FORM,
        PostFormContext {
            form,
            is_edit: true,
            post_id: Some(post.id),
        },
    )
    .into_response())
}

pub async fn post_edit(
    Path(post_id): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let post_id = parse_id(&post_id)?;
    let posts = PostService::new(state.db.clone());
    let post = fetch_post(&posts, post_id).await?;
    if !post.is_authored_by(auth.user_id) {
        return Ok(found(post_detail_url(post.id)));
    }

    let submission = read_post_submission(multipart).await?;
    let groups = list_groups(&state).await?;

    let clean = match forms::validate_post(&submission, &groups, state.upload_max_bytes) {
        Ok(clean) => clean,
        Err(errors) => {
            let form = post_form(&state, Some(&submission), errors).await?;
            return Ok(render(
                page::POST_FORM,
                PostFormContext {
                    form,
                    is_edit: true,
                    post_id: Some(post.id),
                },
            )
            .into_response());
        }
    };

    let image = store_image(&state, clean.image.as_ref()).await?;
    let updated = posts
        .update_post(
            post.id,
            auth.user_id,
            PostInput {
                text: clean.text,
                group_id: clean.group_id,
                image: image.clone(),
            },
        )
        .await;
    let updated = match updated {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            discard_image(&state, image.as_deref()).await;
            return Err(AppError::not_found("post not found"));
        }
        Err(err) => {
            tracing::error!(error = ?err, post_id = post.id, "failed to update post");
            discard_image(&state, image.as_deref()).await;
            return Err(AppError::internal("failed to update post"));
        }
    };

    // a new upload replaces the old file
    if image.is_some() && updated.image != post.image {
        discard_image(&state, post.image.as_deref()).await;
    }

    Ok(found(post_detail_url(updated.id)))
}

pub async fn post_delete(
    Path(post_id): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let post_id = parse_id(&post_id)?;
    let posts = PostService::new(state.db.clone());
    let post = fetch_post(&posts, post_id).await?;
    if !post.is_authored_by(auth.user_id) {
        return Ok(found(post_detail_url(post.id)));
    }

    posts.delete_post(post.id, auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = post.id, "failed to delete post");
        AppError::internal("failed to delete post")
    })?;

    discard_image(&state, post.image.as_deref()).await;

    Ok(found(profile_url(&post.author.username)))
}

async fn fetch_post(posts: &PostService, post_id: i64) -> Result<Post, AppError> {
    posts
        .get_post(post_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to fetch post");
            AppError::internal("failed to fetch post")
        })?
        .ok_or_else(|| AppError::not_found("post not found"))
}

async fn list_groups(state: &AppState) -> Result<Vec<Group>, AppError> {
    GroupService::new(state.db.clone())
        .list_groups()
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to list groups");
            AppError::internal("failed to list groups")
        })
}

async fn post_form(
    state: &AppState,
    submission: Option<&PostSubmission>,
    errors: FormErrors,
) -> Result<FormView, AppError> {
    let groups = list_groups(state).await?;
    let mut form = POST_FORM
        .view()
        .with_choices("group", groups.iter().map(Choice::from).collect())
        .with_errors(errors);

    if let Some(submission) = submission {
        if let Some(text) = &submission.text {
            form = form.with_value("text", text.clone());
        }
        if let Some(group) = &submission.group {
            form = form.with_value("group", group.clone());
        }
    }

    Ok(form)
}

async fn read_post_submission(mut multipart: Multipart) -> Result<PostSubmission, AppError> {
    let mut submission = PostSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("invalid multipart body: {}", err)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" | "group" => {
                let value = field.text().await.map_err(|err| {
                    AppError::bad_request(format!("invalid {} field: {}", name, err))
                })?;
                if name == "text" {
                    submission.text = Some(value);
                } else {
                    submission.group = Some(value);
                }
            }
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::bad_request(format!("invalid image field: {}", err)))?;
                submission.image = Some(UploadedFile { filename, data });
            }
            _ => {}
        }
    }

    Ok(submission)
}

async fn store_image(
    state: &AppState,
    upload: Option<&UploadedFile>,
) -> Result<Option<String>, AppError> {
    let Some(upload) = upload else {
        return Ok(None);
    };

    let path = state
        .storage
        .save_post_image(&upload.filename, &upload.data)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, filename = %upload.filename, "failed to store image");
            AppError::internal("failed to store image")
        })?;

    Ok(Some(path))
}

/// Best-effort removal of a stored post image.
async fn discard_image(state: &AppState, image: Option<&str>) {
    let Some(image) = image else {
        return;
    };
    if let Err(err) = state.storage.delete(image).await {
        tracing::warn!(error = ?err, image = %image, "failed to remove post image");
    }
}

// ============================================================================
// Follows
// ============================================================================

pub async fn profile_follow(
    Path(username): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let author = fetch_author(&state, &username).await?;

    SocialService::new(state.db.clone())
        .follow(auth.user_id, author.id)
        .await
        .map_err(|err| {
            tracing::error!(
                error = ?err,
                user_id = auth.user_id,
                author_id = author.id,
                "failed to follow author"
            );
            AppError::internal("failed to follow author")
        })?;

    Ok(found(profile_url(&author.username)))
}

pub async fn profile_unfollow(
    Path(username): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let author = fetch_author(&state, &username).await?;

    SocialService::new(state.db.clone())
        .unfollow(auth.user_id, author.id)
        .await
        .map_err(|err| {
            tracing::error!(
                error = ?err,
                user_id = auth.user_id,
                author_id = author.id,
                "failed to unfollow author"
            );
            AppError::internal("failed to unfollow author")
        })?;

    Ok(found(profile_url(&author.username)))
}

async fn fetch_author(state: &AppState, username: &str) -> Result<User, AppError> {
    UserService::new(state.db.clone())
        .get_by_username(username)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %username, "failed to fetch user");
            AppError::internal("failed to fetch user")
        })?
        .ok_or_else(|| AppError::not_found("user not found"))
}

// ============================================================================
// Accounts
// ============================================================================

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Serialize)]
pub struct LoginContext {
    pub form: FormView,
    pub next: Option<String>,
}

pub async fn login_form(Query(query): Query<NextQuery>) -> Rendered<LoginContext> {
    render(
        page::LOGIN,
        LoginContext {
            form: LOGIN_FORM.view(),
            next: query.next.as_deref().and_then(safe_redirect),
        },
    )
}

#[derive(Deserialize)]
pub struct LoginSubmission {
    pub username: Option<String>,
    pub password: Option<String>,
    pub next: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    Form(payload): Form<LoginSubmission>,
) -> Result<Response, AppError> {
    let next = payload.next.as_deref().and_then(safe_redirect);
    let rerender = |errors: FormErrors| {
        let mut form = LOGIN_FORM.view().with_errors(errors);
        if let Some(username) = &payload.username {
            form = form.with_value("username", username.clone());
        }
        render(
            page::LOGIN,
            LoginContext {
                form,
                next: next.clone(),
            },
        )
        .into_response()
    };

    let (username, password) =
        match forms::validate_login(payload.username.as_deref(), payload.password.as_deref()) {
            Ok(credentials) => credentials,
            Err(errors) => return Ok(rerender(errors)),
        };

    let service = AuthService::new(
        state.db.clone(),
        state.session_key,
        state.session_ttl_minutes,
    );
    let session = service.login(&username, &password).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to login");
        AppError::internal("failed to login")
    })?;

    match session {
        Some(session) => {
            let location = next.clone().unwrap_or_else(|| "/".to_string());
            Ok(with_session(found(location), &session.token, state.session_ttl_minutes))
        }
        None => {
            let mut errors = FormErrors::default();
            errors.add("__all__", MSG_BAD_CREDENTIALS);
            Ok(rerender(errors))
        }
    }
}

#[derive(Serialize)]
pub struct SignupContext {
    pub form: FormView,
}

pub async fn signup_form() -> Rendered<SignupContext> {
    render(
        page::SIGNUP,
        SignupContext {
            form: SIGNUP_FORM.view(),
        },
    )
}

#[derive(Deserialize)]
pub struct SignupSubmission {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub async fn signup(
    State(state): State<AppState>,
    Form(payload): Form<SignupSubmission>,
) -> Result<Response, AppError> {
    let rerender = |errors: FormErrors| {
        let mut form = SIGNUP_FORM.view().with_errors(errors);
        if let Some(username) = &payload.username {
            form = form.with_value("username", username.clone());
        }
        if let Some(email) = &payload.email {
            form = form.with_value("email", email.clone());
        }
        render(page::SIGNUP, SignupContext { form }).into_response()
    };

    let clean = match forms::validate_signup(
        payload.username.as_deref(),
        payload.email.as_deref(),
        payload.password.as_deref(),
    ) {
        Ok(clean) => clean,
        Err(errors) => return Ok(rerender(errors)),
    };

    let taken = UserService::new(state.db.clone())
        .username_taken(&clean.username)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to check username");
            AppError::internal("failed to sign up")
        })?;
    if taken {
        let mut errors = FormErrors::default();
        errors.add("username", MSG_USERNAME_TAKEN);
        return Ok(rerender(errors));
    }

    let service = AuthService::new(
        state.db.clone(),
        state.session_key,
        state.session_ttl_minutes,
    );
    let user = match service
        .signup(&clean.username, &clean.email, &clean.password)
        .await
    {
        Ok(user) => user,
        Err(err) if crate::infra::db::is_unique_violation(&err) => {
            let mut errors = FormErrors::default();
            errors.add("username", MSG_USERNAME_TAKEN);
            return Ok(rerender(errors));
        }
        Err(err) => {
            tracing::error!(error = ?err, "failed to sign up");
            return Err(AppError::internal("failed to sign up"));
        }
    };

    let session = service.issue_session(user.id).map_err(|err| {
        tracing::error!(error = ?err, user_id = user.id, "failed to issue session");
        AppError::internal("failed to sign up")
    })?;

    Ok(with_session(found("/"), &session.token, state.session_ttl_minutes))
}

pub async fn logout() -> Response {
    let mut response = render(page::LOGGED_OUT, NoContext {}).into_response();
    if let Ok(value) = HeaderValue::from_str(&expired_session_cookie()) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

fn with_session(mut response: Response, token: &str, ttl_minutes: u64) -> Response {
    match HeaderValue::from_str(&session_cookie(token, ttl_minutes * 60)) {
        Ok(value) => {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        Err(err) => tracing::error!(error = ?err, "session cookie is not a valid header"),
    }
    response
}

/// The local path `next` points at, re-encoded for a `Location` header.
/// Anything that could leave this host yields `None`.
fn safe_redirect(next: &str) -> Option<String> {
    if !next.starts_with('/')
        || next.starts_with("//")
        || next.contains('\\')
        || next.chars().any(|ch| ch.is_control() || ch.is_whitespace())
    {
        return None;
    }

    let base = Url::parse(LOCAL_ORIGIN).ok()?;
    let target = base.join(next).ok()?;
    if target.scheme() != base.scheme()
        || target.host() != base.host()
        || target.port() != base.port()
    {
        return None;
    }
    Some(target[Position::BeforePath..].to_string())
}

// ============================================================================
// Admin
// ============================================================================

pub async fn clear_cache(
    _admin: AdminToken,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let removed = state.cache.clear_all().await.map_err(|err| {
        tracing::error!(error = ?err, "failed to clear page cache");
        AppError::internal("failed to clear page cache")
    })?;

    tracing::info!(removed, "page cache cleared");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct CreateGroupRequest {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

pub async fn create_group(
    _admin: AdminToken,
    State(state): State<AppState>,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<Json<Group>, AppError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("title cannot be empty"));
    }
    if title.chars().count() > group::MAX_TITLE_LEN {
        return Err(AppError::bad_request("title must be at most 200 characters"));
    }
    let slug = payload.slug.trim();
    if slug.is_empty()
        || !slug
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(AppError::bad_request(
            "slug must consist of letters, numbers, underscores or hyphens",
        ));
    }

    let group = GroupService::new(state.db.clone())
        .create_group(title, slug, payload.description.trim())
        .await
        .map_err(|err| {
            if crate::infra::db::is_unique_violation(&err) {
                return AppError::conflict("slug already taken");
            }
            tracing::error!(error = ?err, slug = %slug, "failed to create group");
            AppError::internal("failed to create group")
        })?;

    Ok(Json(group))
}

// ============================================================================
// Fallback
// ============================================================================

#[derive(Serialize)]
pub struct NotFoundContext {
    pub path: String,
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> Rendered<NotFoundContext> {
    render(
        page::NOT_FOUND,
        NotFoundContext {
            path: uri.path().to_string(),
        },
    )
    .with_status(StatusCode::NOT_FOUND)
}
