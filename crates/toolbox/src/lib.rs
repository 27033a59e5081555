//! Operational tasks run around deployments.

use std::{collections::BTreeMap, path::Path};

use server::db::{Datastore, DatastoreError, PersistedQuery};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ToolboxError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid query map: {0}")]
    QueryMap(#[from] serde_json::Error),
    #[error(transparent)]
    Datastore(#[from] DatastoreError),
}

/// Empty every user's socket set. After a deploy no socket from the previous
/// process is alive.
pub async fn flush_socket_connections(db: &dyn Datastore) -> Result<u64, ToolboxError> {
    let flushed = db.flush_connected_sockets().await?;
    info!(users = flushed, "flushed socket connections");
    Ok(flushed)
}

/// Read a `{hash: query}` JSON document.
pub fn read_query_map(path: &Path) -> Result<Vec<PersistedQuery>, ToolboxError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ToolboxError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let map: BTreeMap<String, String> = serde_json::from_str(&raw)?;
    Ok(map
        .into_iter()
        .map(|(id, query)| PersistedQuery { id, query })
        .collect())
}

/// Upsert the persisted queries, replacing documents with the same hash.
pub async fn store_persisted_queries(
    db: &dyn Datastore,
    path: &Path,
) -> Result<u64, ToolboxError> {
    let queries = read_query_map(path)?;
    let inserted = db.upsert_persisted_queries(&queries).await?;
    info!(inserted, total = queries.len(), "stored persisted queries");
    Ok(inserted)
}
