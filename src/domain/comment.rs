use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::user::Author;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author: Author,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
}
