/// Response-shaped views of the domain models
///
/// These are what the API serializes. Password hashes and timestamps other
/// than a comment's `date-time` never leave the server. Status and priority
/// are rendered as `{code, name, label}` objects:
///
/// ```json
/// {"code": 2, "name": "IN_PROGRESS", "label": "In progress"}
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Comment, Task, TaskPriority, TaskStatus, User};

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Presentation of a coded enum member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodeView {
    pub code: i32,
    pub name: &'static str,
    pub label: &'static str,
}

impl From<TaskStatus> for CodeView {
    fn from(status: TaskStatus) -> Self {
        Self {
            code: status.code(),
            name: status.as_str(),
            label: status.label(),
        }
    }
}

impl From<TaskPriority> for CodeView {
    fn from(priority: TaskPriority) -> Self {
        Self {
            code: priority.code(),
            name: priority.as_str(),
            label: priority.label(),
        }
    }
}

/// Public view of a comment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommentResponse {
    pub id: i64,
    pub text: String,
    pub date_time: DateTime<Utc>,
    pub commentator: UserResponse,
}

impl From<&Comment> for CommentResponse {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            text: comment.text.clone(),
            date_time: comment.date_time,
            commentator: UserResponse::from(&comment.commentator),
        }
    }
}

/// Public view of a task aggregate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: CodeView,
    pub priority: CodeView,
    pub author: UserResponse,
    pub assignees: Vec<UserResponse>,
    pub comments: Vec<CommentResponse>,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status.into(),
            priority: task.priority.into(),
            author: UserResponse::from(&task.author),
            assignees: task.assignees.iter().map(UserResponse::from).collect(),
            comments: task.comments.iter().map(CommentResponse::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(id: i64, name: &str) -> User {
        let now = Utc::now();
        User {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "secret-hash".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_task_response_shape() {
        let alice = user(1, "alice");
        let bob = user(2, "bob");
        let now = Utc::now();
        let task = Task {
            id: 10,
            title: "Ship".to_string(),
            description: String::new(),
            status: TaskStatus::InProgress,
            priority: TaskPriority::High,
            author: alice.clone(),
            assignees: vec![bob.clone()],
            comments: vec![Comment {
                id: 5,
                text: "On it".to_string(),
                date_time: now,
                commentator: bob,
                task_id: 10,
            }],
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(TaskResponse::from(&task)).unwrap();

        assert_eq!(
            json["status"],
            json!({"code": 2, "name": "IN_PROGRESS", "label": "In progress"})
        );
        assert_eq!(json["priority"]["code"], 3);
        assert_eq!(
            json["author"],
            json!({"id": 1, "name": "alice", "email": "alice@example.com"})
        );
        assert_eq!(json["assignees"][0]["id"], 2);
        assert_eq!(json["comments"][0]["text"], "On it");
        assert!(json["comments"][0].get("date-time").is_some());
        assert!(!json.to_string().contains("secret-hash"));
    }
}
