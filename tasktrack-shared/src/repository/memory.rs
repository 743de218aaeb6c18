//! In-memory repositories for tests and local runs.
//!
//! One [`InMemoryStore`] implements all three repository traits over a single
//! lock, so task aggregates are hydrated from the same user and comment
//! records the other traits write. Ids are assigned from per-table counters
//! starting at 1.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{
    CommentRepository, RepositoryError, RepositoryResult, TaskRepository, UserRepository,
};
use crate::models::{
    Comment, CreateUser, NewComment, NewTask, Task, TaskChange, TaskEdit, TaskPriority,
    TaskStatus, User,
};

/// Thread-safe in-memory store
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

#[derive(Debug, Default)]
struct StoreState {
    last_user_id: i64,
    last_task_id: i64,
    last_comment_id: i64,
    users: BTreeMap<i64, User>,
    tasks: BTreeMap<i64, TaskRecord>,
    comments: BTreeMap<i64, CommentRecord>,
}

#[derive(Debug, Clone)]
struct TaskRecord {
    title: String,
    description: String,
    status: TaskStatus,
    priority: TaskPriority,
    author_id: i64,
    assignee_ids: Vec<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CommentRecord {
    text: String,
    date_time: DateTime<Utc>,
    commentator_id: i64,
    task_id: i64,
}

impl InMemoryStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|err| RepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|err| RepositoryError::persistence(std::io::Error::other(err.to_string())))
    }
}

impl StoreState {
    fn user(&self, id: i64) -> RepositoryResult<User> {
        self.users
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("user {}", id)))
    }

    fn email_taken(&self, email: &str, except_id: Option<i64>) -> bool {
        self.users
            .values()
            .any(|user| user.email == email && Some(user.id) != except_id)
    }

    fn comment(&self, id: i64, record: &CommentRecord) -> RepositoryResult<Comment> {
        Ok(Comment {
            id,
            text: record.text.clone(),
            date_time: record.date_time,
            commentator: self.user(record.commentator_id)?,
            task_id: record.task_id,
        })
    }

    fn comments_of(&self, task_id: i64) -> RepositoryResult<Vec<Comment>> {
        self.comments
            .iter()
            .filter(|(_, record)| record.task_id == task_id)
            .map(|(id, record)| self.comment(*id, record))
            .collect()
    }

    fn task(&self, id: i64, record: &TaskRecord) -> RepositoryResult<Task> {
        let assignees = record
            .assignee_ids
            .iter()
            .map(|assignee_id| self.user(*assignee_id))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(Task {
            id,
            title: record.title.clone(),
            description: record.description.clone(),
            status: record.status,
            priority: record.priority,
            author: self.user(record.author_id)?,
            assignees,
            comments: self.comments_of(id)?,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    fn tasks_where(&self, keep: impl Fn(&TaskRecord) -> bool) -> RepositoryResult<Vec<Task>> {
        self.tasks
            .iter()
            .filter(|(_, record)| keep(record))
            .map(|(id, record)| self.task(*id, record))
            .collect()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, data: CreateUser) -> RepositoryResult<User> {
        let mut state = self.write()?;
        if state.email_taken(&data.email, None) {
            return Err(RepositoryError::Conflict("users_email_key".to_string()));
        }

        state.last_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: state.last_user_id,
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> RepositoryResult<User> {
        let mut state = self.write()?;
        if state.email_taken(&user.email, Some(user.id)) {
            return Err(RepositoryError::Conflict("users_email_key".to_string()));
        }

        let stored = state
            .users
            .get_mut(&user.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("user {}", user.id)))?;
        stored.name = user.name.clone();
        stored.email = user.email.clone();
        stored.password_hash = user.password_hash.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_all(&self) -> RepositoryResult<Vec<User>> {
        Ok(self.read()?.users.values().cloned().collect())
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn create(&self, data: NewTask) -> RepositoryResult<Task> {
        let mut state = self.write()?;
        state.user(data.author_id)?;
        for assignee_id in &data.assignee_ids {
            state.user(*assignee_id)?;
        }

        state.last_task_id += 1;
        let id = state.last_task_id;
        let now = Utc::now();
        let record = TaskRecord {
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            author_id: data.author_id,
            assignee_ids: data.assignee_ids,
            created_at: now,
            updated_at: now,
        };
        state.tasks.insert(id, record.clone());
        state.task(id, &record)
    }

    async fn update(&self, id: i64, edit: TaskEdit) -> RepositoryResult<Task> {
        let mut state = self.write()?;
        if let TaskChange::AddAssignee(user_id) = edit.change {
            state.user(user_id)?;
        }

        let record = state
            .tasks
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("task {}", id)))?;
        edit.authorize(record.author_id, &record.assignee_ids)?;

        let changed = match edit.change {
            TaskChange::Title(title) => {
                record.title = title;
                true
            }
            TaskChange::Description(description) => {
                record.description = description;
                true
            }
            TaskChange::Status(status) => {
                record.status = status;
                true
            }
            TaskChange::Priority(priority) => {
                record.priority = priority;
                true
            }
            TaskChange::AddAssignee(user_id) => {
                let absent = !record.assignee_ids.contains(&user_id);
                if absent {
                    record.assignee_ids.push(user_id);
                }
                absent
            }
            TaskChange::RemoveAssignee(user_id) => {
                record.assignee_ids.retain(|assignee_id| *assignee_id != user_id);
                true
            }
        };
        if changed {
            record.updated_at = Utc::now();
        }

        let record = record.clone();
        state.task(id, &record)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Task>> {
        let state = self.read()?;
        state
            .tasks
            .get(&id)
            .map(|record| state.task(id, record))
            .transpose()
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Task>> {
        self.read()?.tasks_where(|_| true)
    }

    async fn find_all_by_author(&self, author_id: i64) -> RepositoryResult<Vec<Task>> {
        self.read()?
            .tasks_where(|record| record.author_id == author_id)
    }

    async fn find_all_by_assignee(&self, assignee_id: i64) -> RepositoryResult<Vec<Task>> {
        self.read()?
            .tasks_where(|record| record.assignee_ids.contains(&assignee_id))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut state = self.write()?;
        let removed = state.tasks.remove(&id).is_some();
        if removed {
            state.comments.retain(|_, record| record.task_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(&self, data: NewComment) -> RepositoryResult<Comment> {
        let mut state = self.write()?;
        if !state.tasks.contains_key(&data.task_id) {
            return Err(RepositoryError::NotFound(format!("task {}", data.task_id)));
        }
        state.user(data.commentator_id)?;

        state.last_comment_id += 1;
        let id = state.last_comment_id;
        let record = CommentRecord {
            text: data.text,
            date_time: Utc::now(),
            commentator_id: data.commentator_id,
            task_id: data.task_id,
        };
        state.comments.insert(id, record.clone());
        state.comment(id, &record)
    }

    async fn save(&self, comment: &Comment) -> RepositoryResult<Comment> {
        let mut state = self.write()?;
        let record = state
            .comments
            .get_mut(&comment.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("comment {}", comment.id)))?;
        record.text = comment.text.clone();

        let record = record.clone();
        state.comment(comment.id, &record)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Comment>> {
        let state = self.read()?;
        state
            .comments
            .get(&id)
            .map(|record| state.comment(id, record))
            .transpose()
    }

    async fn find_all_by_task(&self, task_id: i64) -> RepositoryResult<Vec<Comment>> {
        self.read()?.comments_of(task_id)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        Ok(self.write()?.comments.remove(&id).is_some())
    }
}
