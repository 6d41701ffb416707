use tokio::net::TcpListener;
use tracing::{error, info};

use hwbind::config::AppConfig;
use hwbind::errors::{LicenseError, LicenseResult};
use hwbind::server::database::Database;
use hwbind::server::handlers::AppState;
use hwbind::server::logging::init_tracing;
use hwbind::server::routes::build_router;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("License server failed: {e}");
        eprintln!("License server failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> LicenseResult<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    let db = Database::connect(&config.database).await?;
    db.migrate().await?;

    let app = build_router(AppState { db: db.clone() });

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| LicenseError::Server(format!("failed to bind {addr}: {e}")))?;
    info!("License server running on {addr}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    db.close().await;
    info!("Database closed");

    served.map_err(|e| LicenseError::Server(e.to_string()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
