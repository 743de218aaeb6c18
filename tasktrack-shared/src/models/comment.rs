/// Comment model
///
/// Comments belong to exactly one task and are removed with it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id BIGSERIAL PRIMARY KEY,
///     text TEXT NOT NULL,
///     date_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     commentator_id BIGINT NOT NULL REFERENCES users(id),
///     task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::User;

/// A comment on a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique comment identifier
    pub id: i64,

    /// Comment body (never blank)
    pub text: String,

    /// When the comment was posted
    pub date_time: DateTime<Utc>,

    /// User who posted the comment
    pub commentator: User,

    /// Task the comment is attached to
    pub task_id: i64,
}

impl Comment {
    /// Returns true if `user` posted this comment
    pub fn is_commentator(&self, user: &User) -> bool {
        self.commentator.id == user.id
    }
}

/// Input for creating a new comment
#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub text: String,
    pub commentator_id: i64,
    pub task_id: i64,
}
