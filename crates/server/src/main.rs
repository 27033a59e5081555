use std::sync::Arc;

use anyhow::Context;
use server::{
    AppState, app,
    config::Config,
    db::{Datastore, MemoryDatastore, PgDatastore},
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use utils::logging::{LogFormat, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,server=debug,tower_http=info", LogFormat::from_env());

    let config = Config::from_env().context("invalid configuration")?;

    let db: Arc<dyn Datastore> = match &config.database_url {
        Some(url) => {
            let db = PgDatastore::connect(url, config.max_db_connections)
                .await
                .context("failed to connect to database")?;
            db.migrate().await.context("failed to run migrations")?;
            Arc::new(db)
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory datastore");
            Arc::new(MemoryDatastore::new())
        }
    };

    let state = AppState::new(&config, db);
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    info!(addr = %listener.local_addr()?, "server listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
}
