use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;

use super::comments::comments_for_tasks;
use super::{lookup_user, users_by_id};
use crate::models::{NewTask, Task, TaskChange, TaskEdit, TaskPriority, TaskStatus, User};
use crate::repository::{RepositoryError, RepositoryResult, TaskRepository};

/// Raw `tasks` row before author, assignees and comments are attached
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: String,
    status: TaskStatus,
    priority: TaskPriority,
    author_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct AssigneeRow {
    task_id: i64,
    #[sqlx(flatten)]
    user: User,
}

/// sqlx-backed [`TaskRepository`]
#[derive(Debug, Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Turns task rows into full aggregates, preserving row order
    async fn hydrate(&self, rows: Vec<TaskRow>) -> RepositoryResult<Vec<Task>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let task_ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let author_ids: Vec<i64> = rows.iter().map(|row| row.author_id).collect();

        let authors = users_by_id(&self.pool, &author_ids).await?;

        let assignee_rows = sqlx::query_as::<_, AssigneeRow>(
            r#"
            SELECT ta.task_id, u.id, u.name, u.email, u.password_hash, u.created_at, u.updated_at
            FROM task_assignees ta
            JOIN users u ON u.id = ta.assignee_id
            WHERE ta.task_id = ANY($1)
            ORDER BY ta.task_id, ta.position
            "#,
        )
        .bind(&task_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut assignees: HashMap<i64, Vec<User>> = HashMap::new();
        for row in assignee_rows {
            assignees.entry(row.task_id).or_default().push(row.user);
        }

        let mut comments = comments_for_tasks(&self.pool, &task_ids).await?;

        rows.into_iter()
            .map(|row| {
                Ok(Task {
                    id: row.id,
                    title: row.title,
                    description: row.description,
                    status: row.status,
                    priority: row.priority,
                    author: lookup_user(&authors, row.author_id)?,
                    assignees: assignees.remove(&row.id).unwrap_or_default(),
                    comments: comments.remove(&row.id).unwrap_or_default(),
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                })
            })
            .collect()
    }

    async fn load(&self, id: i64) -> RepositoryResult<Task> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("task {}", id)))
    }
}

/// Rewrites the assignee links of a task, keeping the given order
async fn replace_assignees(
    tx: &mut Transaction<'_, Postgres>,
    task_id: i64,
    assignee_ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM task_assignees WHERE task_id = $1")
        .bind(task_id)
        .execute(&mut **tx)
        .await?;

    if assignee_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO task_assignees (task_id, assignee_id, position)
        SELECT $1, a.assignee_id, a.position
        FROM UNNEST($2::BIGINT[]) WITH ORDINALITY AS a(assignee_id, position)
        "#,
    )
    .bind(task_id)
    .bind(assignee_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn create(&self, data: NewTask) -> RepositoryResult<Task> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tasks (title, description, status, priority, author_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.author_id)
        .fetch_one(&mut *tx)
        .await?;

        replace_assignees(&mut tx, id, &data.assignee_ids).await?;
        tx.commit().await?;

        self.load(id).await
    }

    async fn update(&self, id: i64, edit: TaskEdit) -> RepositoryResult<Task> {
        let mut tx = self.pool.begin().await?;

        let author_id: i64 =
            sqlx::query_scalar("SELECT author_id FROM tasks WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| RepositoryError::NotFound(format!("task {}", id)))?;

        let assignee_ids: Vec<i64> = sqlx::query_scalar(
            "SELECT assignee_id FROM task_assignees WHERE task_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        edit.authorize(author_id, &assignee_ids)?;

        let changed = match edit.change {
            TaskChange::Title(title) => {
                sqlx::query("UPDATE tasks SET title = $2 WHERE id = $1")
                    .bind(id)
                    .bind(title)
                    .execute(&mut *tx)
                    .await?;
                true
            }
            TaskChange::Description(description) => {
                sqlx::query("UPDATE tasks SET description = $2 WHERE id = $1")
                    .bind(id)
                    .bind(description)
                    .execute(&mut *tx)
                    .await?;
                true
            }
            TaskChange::Status(status) => {
                sqlx::query("UPDATE tasks SET status = $2 WHERE id = $1")
                    .bind(id)
                    .bind(status)
                    .execute(&mut *tx)
                    .await?;
                true
            }
            TaskChange::Priority(priority) => {
                sqlx::query("UPDATE tasks SET priority = $2 WHERE id = $1")
                    .bind(id)
                    .bind(priority)
                    .execute(&mut *tx)
                    .await?;
                true
            }
            TaskChange::AddAssignee(user_id) => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO task_assignees (task_id, assignee_id, position)
                    SELECT $1, $2, COALESCE(MAX(position), 0) + 1
                    FROM task_assignees
                    WHERE task_id = $1
                    ON CONFLICT (task_id, assignee_id) DO NOTHING
                    "#,
                )
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
                result.rows_affected() > 0
            }
            TaskChange::RemoveAssignee(user_id) => {
                sqlx::query("DELETE FROM task_assignees WHERE task_id = $1 AND assignee_id = $2")
                    .bind(id)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
                true
            }
        };

        if changed {
            sqlx::query("UPDATE tasks SET updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        self.load(id).await
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, title, description, status, priority, author_id, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, title, description, status, priority, author_id, created_at, updated_at
            FROM tasks
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn find_all_by_author(&self, author_id: i64) -> RepositoryResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, title, description, status, priority, author_id, created_at, updated_at
            FROM tasks
            WHERE author_id = $1
            ORDER BY id
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn find_all_by_assignee(&self, assignee_id: i64) -> RepositoryResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT t.id, t.title, t.description, t.status, t.priority, t.author_id,
                   t.created_at, t.updated_at
            FROM tasks t
            JOIN task_assignees ta ON ta.task_id = t.id
            WHERE ta.assignee_id = $1
            ORDER BY t.id
            "#,
        )
        .bind(assignee_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM comments WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM task_assignees WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
