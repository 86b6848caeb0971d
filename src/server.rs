//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, click pipeline startup, Axum server
//! lifecycle, and graceful shutdown ordering: the ingress stops first, then
//! the queue closes, then the worker pool gets a bounded window to drain.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;

use crate::application::services::LinkService;
use crate::config::Config;
use crate::domain::click_queue::click_queue;
use crate::domain::click_worker::{shutdown_worker_pool, spawn_click_workers};
use crate::infrastructure::persistence::{PgClickRepository, PgLinkRepository};
use crate::routes::app_router;
use crate::state::AppState;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations
/// - The bounded click event queue
/// - The click worker pool (before the listener accepts traffic)
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if the database connection, migration run, or server
/// bind fails.
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .connect(&config.database_url)
        .await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    let pool = Arc::new(pool);
    let link_repository = Arc::new(PgLinkRepository::new(pool.clone()));
    let click_repository = Arc::new(PgClickRepository::new(pool.clone()));

    let link_service = Arc::new(LinkService::new(
        link_repository,
        click_repository.clone(),
        config.short_code_length,
        config.code_retry_budget,
    ));

    let (click_sender, click_receiver) = click_queue(config.click_queue_capacity);

    // Workers come up before the listener so no accepted event waits without
    // a consumer.
    let worker_pool = spawn_click_workers(
        config.click_worker_count,
        click_receiver,
        click_repository,
    );

    let state = AppState {
        link_service,
        click_sender,
        base_url: config.base_url.clone(),
    };

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The serve future has dropped the router and with it every ClickSender
    // clone, so the queue is now closed; give the workers a bounded window
    // to drain what is still buffered.
    tracing::info!("Ingress stopped, draining click workers");
    shutdown_worker_pool(
        worker_pool,
        Duration::from_secs(config.shutdown_grace_seconds),
    )
    .await;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
