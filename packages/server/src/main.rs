use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::Storage;
use folio::config::AppConfig;
use folio::database::{init_db, prepare_sqlite_dir};
use folio::seed::seed_admin;
use folio::state::AppState;
use folio::{build_router, mail};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    prepare_sqlite_dir(&config.database.url).context("failed to create the database directory")?;
    let db = init_db(&config.database.url, config.database.max_connections)
        .await
        .context("failed to connect to the database")?;
    seed_admin(&db, &config.auth).await?;

    let storage = Storage::from_config(&config.storage)
        .await
        .context("failed to set up image storage")?;
    let mailer = mail::from_config(&config.mail);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_router(AppState::new(db, config, storage, mailer));

    let listener = TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
