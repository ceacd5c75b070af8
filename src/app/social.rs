use anyhow::Result;
use sqlx::Row;
use time::OffsetDateTime;

use crate::domain::social_graph::Follow;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct SocialService {
    db: Db,
}

impl SocialService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Subscribes `user_id` to `author_id`. Returns `false` when the
    /// relation already existed or the user tried to follow themselves.
    pub async fn follow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        if user_id == author_id {
            return Ok(false);
        }

        let result = sqlx::query(
            "INSERT INTO follows (user_id, author_id, created_at) \
             VALUES (?1, ?2, ?3) \
             ON CONFLICT (user_id, author_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(author_id)
        .bind(OffsetDateTime::now_utc())
        .execute(self.db.pool())
        .await?;

        let followed = result.rows_affected() > 0;
        if followed {
            tracing::debug!(user_id, author_id, "follow created");
        }
        Ok(followed)
    }

    pub async fn unfollow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = ?1 AND author_id = ?2")
            .bind(user_id)
            .bind(author_id)
            .execute(self.db.pool())
            .await?;

        let unfollowed = result.rows_affected() > 0;
        if unfollowed {
            tracing::debug!(user_id, author_id, "follow removed");
        }
        Ok(unfollowed)
    }

    pub async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM follows WHERE user_id = ?1 AND author_id = ?2",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(count > 0)
    }

    /// Every follow relation, oldest first.
    pub async fn list_follows(&self) -> Result<Vec<Follow>> {
        let rows = sqlx::query("SELECT user_id, author_id, created_at FROM follows ORDER BY id")
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows
            .iter()
            .map(|row| Follow {
                user_id: row.get("user_id"),
                author_id: row.get("author_id"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}
