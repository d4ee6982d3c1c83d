//! Hookline webhook ingestion service.
//!
//! Main entry point. Initializes logging, configuration, and the database
//! pool, then serves the webhook endpoints until a shutdown signal arrives.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use hookline_api::{start_server, AppState, Config};
use hookline_core::{PostgresEventStore, RealClock};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting hookline webhook ingestion service");

    let config = Config::load()?;
    info!(
        database_url = %config.database_url_masked(),
        host = %config.host,
        port = config.port,
        poll_limit = config.poll_limit,
        "Configuration loaded"
    );

    let pool = create_database_pool(&config).await?;
    info!("Database connection pool established");

    run_migrations(&pool).await?;
    info!("Database migrations completed");

    let pool = Arc::new(pool);
    let state = AppState::new(Arc::new(PostgresEventStore::new(pool.clone())), Arc::new(RealClock))
        .with_static_dir(&config.static_dir)
        .with_poll_limit(config.poll_limit)
        .with_request_timeout(Duration::from_secs(config.request_timeout));

    let addr = config.parse_server_addr()?;
    start_server(state, addr).await.context("Server failed")?;

    pool.close().await;
    info!("Database connections closed");

    info!("Hookline shutdown complete");
    Ok(())
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,hookline=debug,tower_http=debug"))
        .expect("Invalid RUST_LOG environment variable");

    let fmt_layer = fmt::layer().with_target(true).with_file(true).with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

/// Creates the database connection pool with retry logic.
async fn create_database_pool(config: &Config) -> Result<sqlx::PgPool> {
    let mut retries = 0;
    const MAX_RETRIES: u32 = 5;
    const RETRY_DELAY: Duration = Duration::from_secs(2);

    loop {
        match PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => {
                sqlx::query("SELECT 1")
                    .fetch_one(&pool)
                    .await
                    .context("Failed to verify database connection")?;

                return Ok(pool);
            },
            Err(_e) if retries < MAX_RETRIES => {
                retries += 1;
                info!(
                    attempt = retries,
                    max_retries = MAX_RETRIES,
                    "Database connection failed, retrying..."
                );
                tokio::time::sleep(RETRY_DELAY).await;
            },
            Err(e) => {
                return Err(e).context("Failed to create database connection pool after retries");
            },
        }
    }
}

/// Ensures the event table and its polling index exist.
async fn run_migrations(pool: &sqlx::PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS canonical_events (
            id UUID PRIMARY KEY,
            request_id TEXT NOT NULL,
            author TEXT NOT NULL,
            action TEXT NOT NULL,
            from_branch TEXT NOT NULL DEFAULT '',
            to_branch TEXT NOT NULL DEFAULT '',
            pr_action TEXT NOT NULL DEFAULT '',
            event_timestamp TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create canonical_events table")?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_canonical_events_created_at
        ON canonical_events(created_at DESC)
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create canonical_events created_at index")?;

    Ok(())
}
