//! # TaskTrack API Server
//!
//! Serves the TaskTrack REST API over PostgreSQL.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/tasktrack \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p tasktrack-api
//! ```

use anyhow::Context;
use tasktrack_api::{
    app::{build_router, AppState},
    config::Config,
};
use tasktrack_shared::db::{migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let json_logs = config.logging.json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tasktrack_api=debug,tasktrack_shared=debug,tower_http=debug".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!(
        "TaskTrack API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    if config.database.run_migrations {
        migrations::ensure_database_exists(&config.database.url)
            .await
            .context("failed to create database")?;
    }

    let db = pool::create_pool(config.pool_config())
        .await
        .context("failed to connect to database")?;

    if config.database.run_migrations {
        migrations::run_migrations(&db)
            .await
            .context("failed to run migrations")?;
    }

    let status = migrations::get_migration_status(&db).await?;
    tracing::info!(latest_version = ?status.latest_version, "Database schema checked");
    if !status.is_up_to_date {
        tracing::warn!(
            applied = status.applied_migrations,
            known = status.known_migrations,
            "Database schema is behind; set RUN_MIGRATIONS=true to apply pending migrations"
        );
    }

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(db, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
