/// PostgreSQL repositories
///
/// Each repository wraps a cloned [`PgPool`]. Task writes (`create`,
/// `update`, `delete`) run inside a single transaction covering the task row,
/// its assignee links and, for deletes, its comments. `update` locks the task
/// row with `SELECT ... FOR UPDATE` before checking and applying the edit. Reads hydrate aggregates
/// with a fixed number of batched queries regardless of result size.
///
/// # Example
///
/// ```no_run
/// use tasktrack_shared::db::pool::{create_pool, DatabaseConfig};
/// use tasktrack_shared::repository::{postgres::PgUserRepository, UserRepository};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let users = PgUserRepository::new(pool);
/// let everyone = users.find_all().await?;
/// # Ok(())
/// # }
/// ```

mod comments;
mod tasks;
mod users;

pub use comments::PgCommentRepository;
pub use tasks::PgTaskRepository;
pub use users::PgUserRepository;

use sqlx::PgPool;
use std::collections::HashMap;

use super::{RepositoryError, RepositoryResult};
use crate::models::User;

/// Loads users by id into a lookup table
async fn users_by_id(pool: &PgPool, ids: &[i64]) -> RepositoryResult<HashMap<i64, User>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password_hash, created_at, updated_at
        FROM users
        WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(users.into_iter().map(|user| (user.id, user)).collect())
}

fn lookup_user(users: &HashMap<i64, User>, id: i64) -> RepositoryResult<User> {
    users
        .get(&id)
        .cloned()
        .ok_or_else(|| RepositoryError::NotFound(format!("user {}", id)))
}
