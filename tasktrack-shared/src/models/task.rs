/// Task model
///
/// A task is an aggregate: the task row itself, its author, its set of
/// assignees and its ordered collection of comments. Repositories always
/// load and return the whole aggregate.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('PENDING', 'IN_PROGRESS', 'COMPLETED');
/// CREATE TYPE task_priority AS ENUM ('LOW', 'MEDIUM', 'HIGH');
///
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     title TEXT NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'PENDING',
///     priority task_priority NOT NULL DEFAULT 'LOW',
///     author_id BIGINT NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_assignees (
///     task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     assignee_id BIGINT NOT NULL REFERENCES users(id),
///     position BIGINT NOT NULL,
///     PRIMARY KEY (task_id, assignee_id)
/// );
/// ```
///
/// # Codes
///
/// Status and priority travel over the wire as integer codes:
///
/// | Code | Status        | Priority |
/// |------|---------------|----------|
/// | 1    | `PENDING`     | `LOW`    |
/// | 2    | `IN_PROGRESS` | `MEDIUM` |
/// | 3    | `COMPLETED`   | `HIGH`   |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::comment::Comment;
use super::user::User;

/// Error returned when an integer code does not name an enum member
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind} value: {code}")]
pub struct InvalidCode {
    pub kind: &'static str,
    pub code: i32,
}

/// Task progress status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// All members in code order
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// Integer code used on the wire
    pub const fn code(self) -> i32 {
        match self {
            TaskStatus::Pending => 1,
            TaskStatus::InProgress => 2,
            TaskStatus::Completed => 3,
        }
    }

    /// Looks up a status by its code
    pub fn from_code(code: i32) -> Result<Self, InvalidCode> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == code)
            .ok_or(InvalidCode {
                kind: "TaskStatus",
                code,
            })
    }

    /// Stable identifier, matches the database enum label
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }

    /// Human-readable label for presentation
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl TryFrom<i32> for TaskStatus {
    type Error = InvalidCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// All members in code order
    pub const ALL: [TaskPriority; 3] = [
        TaskPriority::Low,
        TaskPriority::Medium,
        TaskPriority::High,
    ];

    /// Integer code used on the wire
    pub const fn code(self) -> i32 {
        match self {
            TaskPriority::Low => 1,
            TaskPriority::Medium => 2,
            TaskPriority::High => 3,
        }
    }

    /// Looks up a priority by its code
    pub fn from_code(code: i32) -> Result<Self, InvalidCode> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.code() == code)
            .ok_or(InvalidCode {
                kind: "TaskPriority",
                code,
            })
    }

    /// Stable identifier, matches the database enum label
    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }

    /// Human-readable label for presentation
    pub fn label(self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Low
    }
}

impl TryFrom<i32> for TaskPriority {
    type Error = InvalidCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

/// A task aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier
    pub id: i64,

    /// Task title (never blank)
    pub title: String,

    /// Free-form description (may be empty)
    pub description: String,

    /// Current status
    pub status: TaskStatus,

    /// Current priority
    pub priority: TaskPriority,

    /// User who created the task
    pub author: User,

    /// Assigned users, no duplicates
    pub assignees: Vec<User>,

    /// Comments in creation order
    pub comments: Vec<Comment>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Returns true if `user` created this task
    pub fn is_author(&self, user: &User) -> bool {
        self.author.id == user.id
    }

    /// Returns true if `user` is currently assigned to this task
    pub fn is_assignee(&self, user: &User) -> bool {
        self.assignees.iter().any(|assignee| assignee.id == user.id)
    }

    /// Returns true if `user` created or is assigned to this task
    pub fn is_author_or_assignee(&self, user: &User) -> bool {
        self.is_author(user) || self.is_assignee(user)
    }

    /// Ids of the current assignees, in assignment order
    pub fn assignee_ids(&self) -> Vec<i64> {
        self.assignees.iter().map(|assignee| assignee.id).collect()
    }
}

/// A single-field change to a stored task
///
/// Repositories apply an edit to the current row while holding it, so two
/// edits of the same task never overwrite each other.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskChange {
    Title(String),
    Description(String),
    Status(TaskStatus),
    Priority(TaskPriority),
    AddAssignee(i64),
    RemoveAssignee(i64),
}

/// Why a [`TaskEdit`] was refused against the current task state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditRejected {
    #[error("Only the author can update the task")]
    NotAuthor,

    #[error("Only the author or an assignee can update the task status")]
    NotAuthorOrAssignee,

    #[error("User with id {0} is not assigned to the task")]
    NotAssigned(i64),
}

/// A change together with the user requesting it
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEdit {
    pub actor_id: i64,
    pub change: TaskChange,
}

impl TaskEdit {
    pub fn new(actor_id: i64, change: TaskChange) -> Self {
        Self { actor_id, change }
    }

    /// Checks the edit against the author and the current assignee ids
    ///
    /// Status may be changed by the author or any assignee, every other
    /// field by the author only. Removing a user who is not assigned is
    /// refused.
    pub fn authorize(&self, author_id: i64, assignee_ids: &[i64]) -> Result<(), EditRejected> {
        let is_author = self.actor_id == author_id;
        match self.change {
            TaskChange::Status(_) => {
                if is_author || assignee_ids.contains(&self.actor_id) {
                    Ok(())
                } else {
                    Err(EditRejected::NotAuthorOrAssignee)
                }
            }
            _ if !is_author => Err(EditRejected::NotAuthor),
            TaskChange::RemoveAssignee(user_id) if !assignee_ids.contains(&user_id) => {
                Err(EditRejected::NotAssigned(user_id))
            }
            _ => Ok(()),
        }
    }
}

/// Input for creating a new task
///
/// All values are already validated and defaulted; `assignee_ids` is
/// de-duplicated.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub author_id: i64,
    pub assignee_ids: Vec<i64>,
}
