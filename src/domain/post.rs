use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::group::Group;
use crate::domain::user::Author;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub pub_date: OffsetDateTime,
    pub author: Author,
    pub group: Option<Group>,
    /// Path relative to the media root, e.g. `posts/small.gif`.
    pub image: Option<String>,
}

impl Post {
    pub fn is_authored_by(&self, user_id: i64) -> bool {
        self.author.id == user_id
    }
}
