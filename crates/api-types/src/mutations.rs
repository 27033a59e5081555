//! Request and payload shapes for the mutation endpoints.
//!
//! Payloads never fail at the transport level for caller mistakes; they carry
//! `error.message` instead so the client can surface it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    notification::{KickOutNotification, Notification},
    task::Task,
    team::PayloadTeam,
    types::NotificationStatus,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StandardMutationError {
    pub message: String,
}

impl StandardMutationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RemoveTeamMemberRequest {
    pub team_member_id: String,
}

/// Identity of the member that was removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RemovedTeamMember {
    pub id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RemoveTeamMemberPayload {
    pub error: Option<StandardMutationError>,
    #[serde(default)]
    pub updated_tasks: Vec<Task>,
    pub kick_out_notification: Option<KickOutNotification>,
    pub team: Option<PayloadTeam>,
    pub team_member: Option<RemovedTeamMember>,
}

impl RemoveTeamMemberPayload {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(StandardMutationError::new(message)),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SetNotificationStatusRequest {
    pub notification_id: String,
    pub status: NotificationStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SetNotificationStatusPayload {
    pub error: Option<StandardMutationError>,
    pub notification: Option<Notification>,
}

impl SetNotificationStatusPayload {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(StandardMutationError::new(message)),
            notification: None,
        }
    }
}
