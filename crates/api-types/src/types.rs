//! Shared enums used across the server and client crates.

use serde::{Deserialize, Serialize};
use sqlx::Type;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, TS)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum NotificationType {
    KickedOut,
    TeamArchived,
    TaskInvolves,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, TS)]
#[sqlx(type_name = "notification_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum NotificationStatus {
    Unread,
    Read,
    Clicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, TS)]
#[sqlx(type_name = "meeting_type", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum MeetingType {
    Retrospective,
    Poker,
    Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, TS)]
#[sqlx(type_name = "provider_service", rename_all = "snake_case")]
#[ts(export)]
pub enum ProviderService {
    GitHubIntegration,
    SlackIntegration,
}

/// Pub/sub channel an event is routed on. The wire name doubles as the topic
/// prefix, see [`Channel::topic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Channel {
    TeamMember,
    Team,
    Notification,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::TeamMember => "TEAM_MEMBER",
            Channel::Team => "TEAM",
            Channel::Notification => "NOTIFICATION",
        }
    }

    /// Topic name subscribers listen on, e.g. `TEAM_MEMBER.team1`.
    pub fn topic(&self, entity_id: &str) -> String {
        format!("{}.{}", self.as_str(), entity_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum EventType {
    Added,
    Updated,
    Removed,
}
