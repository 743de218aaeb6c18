/// PostgreSQL connection pool
///
/// The pool is created once at startup and cloned into each Postgres
/// repository. Creation fails fast if the database does not answer a
/// `SELECT 1` probe.
///
/// # Example
///
/// ```no_run
/// use tasktrack_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut config = DatabaseConfig::with_url(std::env::var("DATABASE_URL")?);
///     config.max_connections = 20;
///
///     let pool = create_pool(config).await?;
///     # let _ = pool;
///     Ok(())
/// }
/// ```

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection pool settings
///
/// Timeouts are in seconds so they map directly onto environment variables.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Upper bound on open connections (default 10)
    pub max_connections: u32,

    /// Connections kept warm while idle (default 2)
    pub min_connections: u32,

    /// How long to wait for a free connection (default 30)
    pub connect_timeout_seconds: u64,

    /// Close connections idle for longer than this (default 10 minutes)
    pub idle_timeout_seconds: Option<u64>,

    /// Recycle connections older than this (default 30 minutes)
    pub max_lifetime_seconds: Option<u64>,

    /// Ping connections before handing them out (default true)
    pub test_before_acquire: bool,
}

impl DatabaseConfig {
    /// Default pool settings for the given URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
            test_before_acquire: true,
        }
    }
}

/// Creates the pool and verifies the database is reachable
///
/// # Errors
///
/// Returns an error if the URL is invalid, the server cannot be reached, or
/// the health probe fails.
pub async fn create_pool(config: DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Creating database connection pool"
    );

    let mut options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .test_before_acquire(config.test_before_acquire);

    if let Some(idle_timeout) = config.idle_timeout_seconds {
        options = options.idle_timeout(Duration::from_secs(idle_timeout));
    }

    if let Some(max_lifetime) = config.max_lifetime_seconds {
        options = options.max_lifetime(Duration::from_secs(max_lifetime));
    }

    let pool = options.connect(&config.url).await?;
    health_check(&pool).await?;

    info!("Database connection pool ready");
    Ok(pool)
}

/// Runs a trivial query to confirm the database answers
///
/// # Errors
///
/// Returns an error if the query fails or returns something unexpected.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let (value,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;

    if value == 1 {
        debug!("Database health check passed");
        Ok(())
    } else {
        warn!(value, "Database health check returned unexpected value");
        Err(sqlx::Error::Protocol(
            "Health check returned unexpected value".into(),
        ))
    }
}
