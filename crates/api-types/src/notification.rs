use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;

use crate::{
    team::PayloadTeam,
    types::{NotificationStatus, NotificationType},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub notification_type: NotificationType,
    pub user_id: String,
    pub team_id: Option<String>,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
}

/// The notification a removed member receives, with enough of the team to
/// route them away from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct KickOutNotification {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub user_id: String,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    pub team: PayloadTeam,
}

impl KickOutNotification {
    pub fn to_notification(&self) -> Notification {
        Notification {
            id: self.id.clone(),
            notification_type: self.notification_type,
            user_id: self.user_id.clone(),
            team_id: Some(self.team.id.clone()),
            status: self.status,
            created_at: self.created_at,
        }
    }
}
