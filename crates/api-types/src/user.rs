use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;

/// User account. `connected_sockets` is the live-socket set that drives
/// presence; `tms` lists the teams the user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub preferred_name: String,
    pub picture: Option<String>,
    pub connected_sockets: Vec<String>,
    pub tms: Vec<String>,
}

impl User {
    pub fn is_connected(&self) -> bool {
        !self.connected_sockets.is_empty()
    }
}
