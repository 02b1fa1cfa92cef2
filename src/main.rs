//! Debit Ledger Service - Main Application Entry Point
//!
//! A REST API that debits user balances exactly once per idempotency key,
//! under client retries and concurrent submissions, without ever letting a
//! balance go negative.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx, SERIALIZABLE debit transactions
//! - **Amounts**: rust_decimal, exact NUMERIC end to end
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build HTTP router
//! 5. Start server on configured port

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;

use tracing_subscriber::EnvFilter;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG, defaults to "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/users/{id}/transactions",
            post(handlers::transactions::create_transaction),
        )
        .route("/users/{id}/balance", get(handlers::users::get_balance))
        // Request tracing for observability
        .layer(TraceLayer::new_for_http())
        // Share the pool with all handlers via State extraction
        .with_state(pool);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Handles requests concurrently, one tokio task per connection
    axum::serve(listener, app).await?;

    Ok(())
}
