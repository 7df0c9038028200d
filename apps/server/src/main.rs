//! # Vastra Server
//!
//! REST backend for the Kalan Vastralya shop front.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  init_tracing ──► ServerConfig::load ──► Database::new (migrations)    │
//! │       ──► build_router ──► TcpListener::bind ──► axum::serve           │
//! │                                        (until Ctrl+C / SIGTERM)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vastra_db::Database;
use vastra_server::{build_router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Vastra POS server...");

    let config = ServerConfig::load()?;
    info!(
        bind = %config.bind,
        db_path = %config.db_path.display(),
        stock_policy = ?config.stock_policy(),
        utc_offset_minutes = config.timezone_offset_minutes,
        "Configuration loaded"
    );

    let db = Database::new(config.db_config()?).await?;
    info!("Database ready");

    let app = build_router(AppState::new(db.clone(), config.max_upload_bytes));

    let listener = TcpListener::bind(config.bind).await?;
    info!(addr = %config.bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=vastra_db=trace` - Trace the database layer only
/// - Default: `info,vastra=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vastra=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
