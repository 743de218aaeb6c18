/// Database layer for TaskTrack
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: embedded schema migrations
///
/// Queries live in the Postgres repositories under
/// [`crate::repository::postgres`].

pub mod migrations;
pub mod pool;
