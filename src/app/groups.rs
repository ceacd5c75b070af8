use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::group::Group;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct GroupService {
    db: Db,
}

impl GroupService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_group(&self, title: &str, slug: &str, description: &str) -> Result<Group> {
        let row = sqlx::query(
            "INSERT INTO post_groups (title, slug, description) \
             VALUES (?1, ?2, ?3) \
             RETURNING id, title, slug, description",
        )
        .bind(title)
        .bind(slug)
        .bind(description)
        .fetch_one(self.db.pool())
        .await?;

        let group = group_from_row(&row);
        tracing::info!(group_id = group.id, slug = %group.slug, "group created");
        Ok(group)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let row = sqlx::query(
            "SELECT id, title, slug, description FROM post_groups WHERE slug = ?1",
        )
        .bind(slug)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| group_from_row(&row)))
    }

    /// All groups, alphabetically; these are the choices of the post form.
    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        let rows = sqlx::query(
            "SELECT id, title, slug, description FROM post_groups ORDER BY title, id",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(group_from_row).collect())
    }
}

fn group_from_row(row: &SqliteRow) -> Group {
    Group {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
    }
}
