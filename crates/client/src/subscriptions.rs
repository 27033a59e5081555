//! Applies realtime events pushed over the socket to the local cache.

use std::collections::{HashSet, VecDeque};

use api_types::{PublishEvent, SubscriptionPayload};
use tracing::{debug, trace};

use crate::{
    atmosphere::Atmosphere,
    handlers::handle_team_member_presence,
    history::History,
    mutations::{
        OnNextContext, UpdaterContext,
        remove_team_member::{remove_team_member_team_on_next, remove_team_member_updater},
        set_notification_status::set_notification_status_updater,
    },
    store::RecordStore,
};

/// How many applied payload keys are remembered for duplicate detection.
const SEEN_CAPACITY: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Caused by this client's own socket; the mutation response already
    /// updated the cache.
    Echo,
    Duplicate,
}

#[derive(Debug, Default)]
pub struct SubscriptionHandler {
    seen: HashSet<String>,
    order: VecDeque<String>,
}

impl SubscriptionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(
        &mut self,
        event: &PublishEvent,
        atmosphere: &Atmosphere,
        store: &mut RecordStore,
        history: &mut dyn History,
    ) -> Outcome {
        if atmosphere
            .socket_id()
            .is_some_and(|socket_id| event.is_echo_for(socket_id))
        {
            trace!(topic = %event.topic(), "dropping echo");
            return Outcome::Echo;
        }
        if let Some(key) = dedupe_key(event) {
            if !self.remember(key) {
                debug!(topic = %event.topic(), "dropping duplicate");
                return Outcome::Duplicate;
            }
        }

        match &event.payload {
            SubscriptionPayload::TeamMemberPresence(presence) => {
                handle_team_member_presence(presence, store);
            }
            SubscriptionPayload::RemoveTeamMemberPayload(payload) => {
                remove_team_member_updater(payload, &mut UpdaterContext { atmosphere, store });
                remove_team_member_team_on_next(payload, &mut OnNextContext { atmosphere, history });
            }
            SubscriptionPayload::SetNotificationStatusPayload(payload) => {
                set_notification_status_updater(payload, store);
            }
        }
        Outcome::Applied
    }

    /// Returns `false` when the key was already seen.
    fn remember(&mut self, key: String) -> bool {
        if self.seen.contains(&key) {
            return false;
        }
        if self.order.len() == SEEN_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(key.clone());
        self.order.push_back(key);
        true
    }
}

/// One operation fans out per team and per user, so the subject is part of
/// the key. A removal sends different copies to the team and to the removed
/// user, so its subject names the channel.
fn dedupe_key(event: &PublishEvent) -> Option<String> {
    let operation_id = event.options.operation_id.as_deref()?;
    let subject = match &event.payload {
        SubscriptionPayload::TeamMemberPresence(presence) => presence.team_member_id.clone(),
        SubscriptionPayload::RemoveTeamMemberPayload(_) => {
            format!("removeTeamMember:{}", event.channel.as_str())
        }
        SubscriptionPayload::SetNotificationStatusPayload(_) => "setNotificationStatus".to_string(),
    };
    Some(format!("{operation_id}:{subject}"))
}
