//! Runs once after every deploy: clears stale socket sets and loads the
//! persisted query map. Failures are logged and never fail the deploy.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, error::ErrorKind};
use server::db::PgDatastore;
use toolbox::{flush_socket_connections, store_persisted_queries};
use tracing::{error, info};
use utils::logging::{LogFormat, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "post-deploy")]
#[command(about = "Flush socket connections and store persisted queries")]
struct Args {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// `{hash: query}` JSON document produced by the client build
    #[arg(long, env = "QUERY_MAP_PATH", default_value = "queryMap.json")]
    query_map: PathBuf,

    #[arg(long, env = "MAX_DB_CONNECTIONS", default_value_t = 2)]
    max_db_connections: u32,
}

#[tokio::main]
async fn main() {
    init_tracing("info,toolbox=debug", LogFormat::from_env());
    let Some(args) = parse_args(std::env::args_os()) else {
        return;
    };

    if let Err(err) = run(&args).await {
        error!(error = format!("{err:#}"), "post deploy failed");
    }
    info!("post deploy complete");
}

/// Bad arguments are logged rather than exiting with clap's usage status.
fn parse_args<I, T>(args: I) -> Option<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Args::try_parse_from(args) {
        Ok(args) => Some(args),
        Err(err) => {
            match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = err.print();
                }
                _ => error!(error = %err, "invalid post deploy arguments"),
            }
            None
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<()> {
    let db = PgDatastore::connect(&args.database_url, args.max_db_connections)
        .await
        .context("failed to connect to database")?;

    // Each step runs even when the other fails.
    if let Err(err) = flush_socket_connections(&db).await {
        error!(error = %err, "failed to flush socket connections");
    }
    if let Err(err) = store_persisted_queries(&db, &args.query_map).await {
        error!(error = %err, path = %args.query_map.display(), "failed to store persisted queries");
    }

    db.close().await;
    Ok(())
}
