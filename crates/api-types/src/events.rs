//! Realtime events fanned out to subscribed sockets.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    mutations::{RemoveTeamMemberPayload, SetNotificationStatusPayload},
    types::{Channel, EventType},
};

/// Tokens that let the originating client drop its own echo and let any
/// client drop duplicates of one logical operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PublishOptions {
    pub mutator_id: Option<String>,
    pub operation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TeamMemberPresence {
    pub team_member_id: String,
    pub is_connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "__typename")]
#[ts(export)]
pub enum SubscriptionPayload {
    TeamMemberPresence(TeamMemberPresence),
    RemoveTeamMemberPayload(RemoveTeamMemberPayload),
    SetNotificationStatusPayload(SetNotificationStatusPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PublishEvent {
    pub channel: Channel,
    pub entity_id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub payload: SubscriptionPayload,
    pub options: PublishOptions,
}

impl PublishEvent {
    pub fn topic(&self) -> String {
        self.channel.topic(&self.entity_id)
    }

    /// Whether the socket identified by `socket_id` caused this event.
    pub fn is_echo_for(&self, socket_id: &str) -> bool {
        self.options.mutator_id.as_deref() == Some(socket_id)
    }
}
