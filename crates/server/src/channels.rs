//! Channel definitions for realtime subscriptions.
//!
//! This module provides:
//! - `ChannelDefinition` describing what a channel carries and how it is scoped
//! - `define_channel!` for declaring channels as constants
//! - `topics_for` to compute the topics a connected socket listens on
//! - `topics_revoked_by` to find the topics an event takes away from a user

use api_types::{Channel, PublishEvent, SubscriptionPayload, from_team_member_id};

use crate::auth::{AuthToken, get_user_id};

/// What the entity id of a channel's topic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelScope {
    /// One topic per team in the caller's token.
    Team,
    /// One topic for the caller themself.
    User,
}

#[derive(Debug)]
pub struct ChannelDefinition {
    pub channel: Channel,
    pub ts_type_name: &'static str,
    pub scope: ChannelScope,
}

impl ChannelDefinition {
    pub fn channel(&self) -> Channel {
        self.channel
    }
    pub fn ts_type_name(&self) -> &'static str {
        self.ts_type_name
    }
    pub fn scope(&self) -> ChannelScope {
        self.scope
    }
}

/// Construct a `ChannelDefinition`.
///
/// Usage:
/// ```ignore
/// pub const TEAM_MEMBER_CHANNEL: ChannelDefinition = define_channel!(
///     channel: Channel::TeamMember,
///     ts_type_name: "TeamMemberSubscriptionPayload",
///     scope: ChannelScope::Team,
/// );
/// ```
#[macro_export]
macro_rules! define_channel {
    (
        channel: $channel:expr,
        ts_type_name: $ts_type_name:literal,
        scope: $scope:expr $(,)?
    ) => {
        $crate::channels::ChannelDefinition {
            channel: $channel,
            ts_type_name: $ts_type_name,
            scope: $scope,
        }
    };
}

pub const TEAM_MEMBER_CHANNEL: ChannelDefinition = define_channel!(
    channel: Channel::TeamMember,
    ts_type_name: "TeamMemberSubscriptionPayload",
    scope: ChannelScope::Team,
);

pub const TEAM_CHANNEL: ChannelDefinition = define_channel!(
    channel: Channel::Team,
    ts_type_name: "TeamSubscriptionPayload",
    scope: ChannelScope::Team,
);

pub const NOTIFICATION_CHANNEL: ChannelDefinition = define_channel!(
    channel: Channel::Notification,
    ts_type_name: "NotificationSubscriptionPayload",
    scope: ChannelScope::User,
);

/// All channel definitions for realtime streaming
pub fn all_channels() -> [&'static ChannelDefinition; 3] {
    [&TEAM_MEMBER_CHANNEL, &TEAM_CHANNEL, &NOTIFICATION_CHANNEL]
}

/// Topics a freshly connected socket subscribes to.
pub fn topics_for(auth_token: &AuthToken) -> Vec<String> {
    let mut topics = Vec::new();
    for definition in all_channels() {
        match definition.scope {
            ChannelScope::Team => topics.extend(
                auth_token
                    .tms
                    .iter()
                    .map(|team_id| definition.channel.topic(team_id)),
            ),
            ChannelScope::User => topics.push(definition.channel.topic(get_user_id(auth_token))),
        }
    }
    topics
}

/// Team topics `user_id` loses because `event` removed them from the team.
pub fn topics_revoked_by(event: &PublishEvent, user_id: &str) -> Vec<String> {
    let SubscriptionPayload::RemoveTeamMemberPayload(payload) = &event.payload else {
        return Vec::new();
    };
    let Some(team_member) = &payload.team_member else {
        return Vec::new();
    };
    if team_member.user_id != user_id {
        return Vec::new();
    }
    let Some((team_id, _)) = from_team_member_id(&team_member.id) else {
        return Vec::new();
    };
    all_channels()
        .into_iter()
        .filter(|definition| definition.scope == ChannelScope::Team)
        .map(|definition| definition.channel.topic(team_id))
        .collect()
}
