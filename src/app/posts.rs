use anyhow::{anyhow, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use time::OffsetDateTime;

use crate::app::paginator::{Page, PageWindow, POSTS_PER_PAGE};
use crate::domain::group::Group;
use crate::domain::post::Post;
use crate::domain::user::Author;
use crate::infra::db::Db;

const POST_COLUMNS: &str = "SELECT p.id, p.text, p.pub_date, p.image, \
            u.id AS author_id, u.username AS author_username, \
            g.id AS group_id, g.title AS group_title, g.slug AS group_slug, \
            g.description AS group_description \
     FROM posts p \
     JOIN users u ON u.id = p.author_id \
     LEFT JOIN post_groups g ON g.id = p.group_id";

/// Which posts a listing shows. Every listing is ordered newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by the authors this user follows.
    FollowedBy(i64),
}

#[derive(Debug, Clone)]
pub struct PostInput {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_post(&self, author_id: i64, input: PostInput) -> Result<Post> {
        let post_id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (text, pub_date, author_id, group_id, image) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             RETURNING id",
        )
        .bind(&input.text)
        .bind(OffsetDateTime::now_utc())
        .bind(author_id)
        .bind(input.group_id)
        .bind(&input.image)
        .fetch_one(self.db.pool())
        .await?;

        tracing::info!(post_id, author_id, group_id = ?input.group_id, "post created");

        self.get_post(post_id)
            .await?
            .ok_or_else(|| anyhow!("post {} vanished after insert", post_id))
    }

    pub async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("{} WHERE p.id = ?1", POST_COLUMNS))
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(|row| post_from_row(&row)))
    }

    /// Rewrites text and group of an author's post. A `None` image keeps the
    /// stored one. Returns `None` when the post does not exist or belongs to
    /// someone else.
    pub async fn update_post(
        &self,
        post_id: i64,
        author_id: i64,
        input: PostInput,
    ) -> Result<Option<Post>> {
        let result = sqlx::query(
            "UPDATE posts \
             SET text = ?3, group_id = ?4, image = COALESCE(?5, image) \
             WHERE id = ?1 AND author_id = ?2",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(&input.text)
        .bind(input.group_id)
        .bind(&input.image)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        tracing::info!(post_id, author_id, "post updated");
        self.get_post(post_id).await
    }

    pub async fn delete_post(&self, post_id: i64, author_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?1 AND author_id = ?2")
            .bind(post_id)
            .bind(author_id)
            .execute(self.db.pool())
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(post_id, author_id, "post deleted");
        }
        Ok(deleted)
    }

    pub async fn count_by_author(&self, author_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = ?1")
            .bind(author_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    pub async fn list_page(
        &self,
        filter: PostFilter,
        requested: Option<&str>,
    ) -> Result<Page<Post>> {
        self.list_page_sized(filter, POSTS_PER_PAGE, requested)
            .await
    }

    async fn list_page_sized(
        &self,
        filter: PostFilter,
        per_page: usize,
        requested: Option<&str>,
    ) -> Result<Page<Post>> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts p");
        push_filter(&mut count_query, filter);
        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.db.pool())
            .await?;

        let window = PageWindow::resolve(count.max(0) as usize, per_page, requested);

        let mut page_query = QueryBuilder::<Sqlite>::new(POST_COLUMNS);
        push_filter(&mut page_query, filter);
        page_query.push(" ORDER BY p.id DESC LIMIT ");
        page_query.push_bind(window.limit() as i64);
        page_query.push(" OFFSET ");
        page_query.push_bind(window.offset() as i64);

        let rows = page_query.build().fetch_all(self.db.pool()).await?;
        let posts = rows.iter().map(post_from_row).collect();

        Ok(Page::from_window(window, posts))
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: PostFilter) {
    match filter {
        PostFilter::All => {}
        PostFilter::Group(group_id) => {
            query.push(" WHERE p.group_id = ");
            query.push_bind(group_id);
        }
        PostFilter::Author(author_id) => {
            query.push(" WHERE p.author_id = ");
            query.push_bind(author_id);
        }
        PostFilter::FollowedBy(user_id) => {
            query.push(" WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id = ");
            query.push_bind(user_id);
            query.push(")");
        }
    }
}

fn post_from_row(row: &SqliteRow) -> Post {
    let group_id: Option<i64> = row.get("group_id");
    let group = group_id.map(|id| Group {
        id,
        title: row.get::<Option<String>, _>("group_title").unwrap_or_default(),
        slug: row.get::<Option<String>, _>("group_slug").unwrap_or_default(),
        description: row
            .get::<Option<String>, _>("group_description")
            .unwrap_or_default(),
    });

    Post {
        id: row.get("id"),
        text: row.get("text"),
        pub_date: row.get("pub_date"),
        author: Author {
            id: row.get("author_id"),
            username: row.get("author_username"),
        },
        group,
        image: row.get("image"),
    }
}
