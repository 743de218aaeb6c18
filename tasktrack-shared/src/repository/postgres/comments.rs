use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;

use super::{lookup_user, users_by_id};
use crate::models::{Comment, NewComment};
use crate::repository::{CommentRepository, RepositoryError, RepositoryResult};

/// Raw `comments` row before the commentator is attached
#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    text: String,
    date_time: DateTime<Utc>,
    commentator_id: i64,
    task_id: i64,
}

/// Attaches commentators to comment rows, preserving row order
async fn hydrate(pool: &PgPool, rows: Vec<CommentRow>) -> RepositoryResult<Vec<Comment>> {
    let commentator_ids: Vec<i64> = rows.iter().map(|row| row.commentator_id).collect();
    let commentators = users_by_id(pool, &commentator_ids).await?;

    rows.into_iter()
        .map(|row| {
            Ok(Comment {
                id: row.id,
                text: row.text,
                date_time: row.date_time,
                commentator: lookup_user(&commentators, row.commentator_id)?,
                task_id: row.task_id,
            })
        })
        .collect()
}

/// Loads the comments of several tasks, grouped by task id
pub(super) async fn comments_for_tasks(
    pool: &PgPool,
    task_ids: &[i64],
) -> RepositoryResult<HashMap<i64, Vec<Comment>>> {
    let rows = sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT id, text, date_time, commentator_id, task_id
        FROM comments
        WHERE task_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(task_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<Comment>> = HashMap::new();
    for comment in hydrate(pool, rows).await? {
        grouped.entry(comment.task_id).or_default().push(comment);
    }
    Ok(grouped)
}

/// sqlx-backed [`CommentRepository`]
#[derive(Debug, Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn hydrate_one(&self, row: Option<CommentRow>) -> RepositoryResult<Option<Comment>> {
        match row {
            Some(row) => Ok(hydrate(&self.pool, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn create(&self, data: NewComment) -> RepositoryResult<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO comments (text, commentator_id, task_id)
            VALUES ($1, $2, $3)
            RETURNING id, text, date_time, commentator_id, task_id
            "#,
        )
        .bind(data.text)
        .bind(data.commentator_id)
        .bind(data.task_id)
        .fetch_one(&self.pool)
        .await?;

        self.hydrate_one(Some(row))
            .await?
            .ok_or_else(|| RepositoryError::NotFound("comment".to_string()))
    }

    async fn save(&self, comment: &Comment) -> RepositoryResult<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            UPDATE comments
            SET text = $2
            WHERE id = $1
            RETURNING id, text, date_time, commentator_id, task_id
            "#,
        )
        .bind(comment.id)
        .bind(&comment.text)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate_one(row)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("comment {}", comment.id)))
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, text, date_time, commentator_id, task_id
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate_one(row).await
    }

    async fn find_all_by_task(&self, task_id: i64) -> RepositoryResult<Vec<Comment>> {
        let mut grouped = comments_for_tasks(&self.pool, &[task_id]).await?;
        Ok(grouped.remove(&task_id).unwrap_or_default())
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
