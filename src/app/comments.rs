use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use time::OffsetDateTime;

use crate::domain::comment::Comment;
use crate::domain::user::Author;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct CommentService {
    db: Db,
}

impl CommentService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn add_comment(&self, post_id: i64, author_id: i64, text: &str) -> Result<Comment> {
        let row = sqlx::query(
            "INSERT INTO comments (post_id, author_id, text, created) \
             VALUES (?1, ?2, ?3, ?4) \
             RETURNING id, post_id, author_id, text, created",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.db.pool())
        .await?;

        let comment_id: i64 = row.get("id");
        let username: String = sqlx::query_scalar("SELECT username FROM users WHERE id = ?1")
            .bind(author_id)
            .fetch_one(self.db.pool())
            .await?;

        tracing::info!(comment_id, post_id, author_id, "comment added");

        Ok(Comment {
            id: comment_id,
            post_id: row.get("post_id"),
            author: Author {
                id: row.get("author_id"),
                username,
            },
            text: row.get("text"),
            created: row.get("created"),
        })
    }

    /// Comments of a post in the order they were written.
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT c.id, c.post_id, c.text, c.created, \
                    u.id AS author_id, u.username AS author_username \
             FROM comments c \
             JOIN users u ON u.id = c.author_id \
             WHERE c.post_id = ?1 \
             ORDER BY c.id",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(comment_from_row).collect())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}

fn comment_from_row(row: &SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author: Author {
            id: row.get("author_id"),
            username: row.get("author_username"),
        },
        text: row.get("text"),
        created: row.get("created"),
    }
}
