/// Repository ports and adapters
///
/// The services in [`crate::services`] only talk to the traits defined here.
/// Two adapters implement them:
///
/// - [`postgres`]: sqlx-backed storage used by the API server
/// - [`memory`]: a shared in-process store used by tests and local runs
///
/// Every task read returns the full aggregate (author, assignees, comments),
/// hydrated from the current user records.
///
/// # Example
///
/// ```
/// use tasktrack_shared::repository::Repositories;
///
/// let repos = Repositories::in_memory();
/// # let _ = repos;
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::models::{Comment, CreateUser, EditRejected, NewComment, NewTask, Task, TaskEdit, User};

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors returned by repository implementations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    /// A unique constraint was violated (e.g. duplicate email)
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// A row targeted by an update no longer exists
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A task edit was refused against the stored task
    #[error(transparent)]
    Rejected(#[from] EditRejected),

    /// Persistence-layer failure
    #[error("Persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    /// Wraps a persistence error
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                RepositoryError::Conflict(constraint)
            }
            sqlx::Error::RowNotFound => RepositoryError::NotFound("row".to_string()),
            _ => RepositoryError::persistence(err),
        }
    }
}

/// User persistence contract
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores a new user and assigns its id
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] when the email is already taken.
    async fn create(&self, data: CreateUser) -> RepositoryResult<User>;

    /// Persists name, email and password hash of an existing user
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] when the new email belongs to
    /// another user, [`RepositoryError::NotFound`] when the user is gone.
    async fn save(&self, user: &User) -> RepositoryResult<User>;

    /// Finds a user by id
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;

    /// Finds a user by exact email
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    /// Lists all users ordered by id
    async fn find_all(&self) -> RepositoryResult<Vec<User>>;
}

/// Task aggregate persistence contract
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task with its assignee set and assigns its id
    async fn create(&self, data: NewTask) -> RepositoryResult<Task>;

    /// Applies one edit to the stored task and returns the updated aggregate
    ///
    /// The edit is authorized against the task as stored at write time, and
    /// the read, the check and the write happen as one atomic step. Adding an
    /// assignee who is already assigned writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when the task is gone and
    /// [`RepositoryError::Rejected`] when the edit is not allowed.
    async fn update(&self, id: i64, edit: TaskEdit) -> RepositoryResult<Task>;

    /// Finds a task by id
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Task>>;

    /// Lists all tasks ordered by id
    async fn find_all(&self) -> RepositoryResult<Vec<Task>>;

    /// Lists tasks created by the given user
    async fn find_all_by_author(&self, author_id: i64) -> RepositoryResult<Vec<Task>>;

    /// Lists tasks the given user is assigned to
    async fn find_all_by_assignee(&self, assignee_id: i64) -> RepositoryResult<Vec<Task>>;

    /// Deletes a task together with its assignee links and comments
    ///
    /// Returns false if no task had that id.
    async fn delete(&self, id: i64) -> RepositoryResult<bool>;
}

/// Comment persistence contract
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Stores a new comment and assigns its id and timestamp
    async fn create(&self, data: NewComment) -> RepositoryResult<Comment>;

    /// Persists the text of an existing comment
    async fn save(&self, comment: &Comment) -> RepositoryResult<Comment>;

    /// Finds a comment by id
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Comment>>;

    /// Lists comments of a task in creation order
    async fn find_all_by_task(&self, task_id: i64) -> RepositoryResult<Vec<Comment>>;

    /// Deletes one comment, returns false if it did not exist
    async fn delete(&self, id: i64) -> RepositoryResult<bool>;
}

/// The set of repositories the services are wired with
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

impl Repositories {
    /// Postgres-backed repositories sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(postgres::PgUserRepository::new(pool.clone())),
            tasks: Arc::new(postgres::PgTaskRepository::new(pool.clone())),
            comments: Arc::new(postgres::PgCommentRepository::new(pool)),
        }
    }

    /// Repositories backed by a fresh, empty in-memory store
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::InMemoryStore::new());
        Self {
            users: store.clone(),
            tasks: store.clone(),
            comments: store,
        }
    }
}
