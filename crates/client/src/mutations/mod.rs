//! Mutation commits, cache updaters and side channels.

pub mod remove_team_member;
pub mod set_notification_status;

use crate::{atmosphere::Atmosphere, history::History, store::RecordStore};

/// Everything an updater may touch while applying a payload.
pub struct UpdaterContext<'a> {
    pub atmosphere: &'a Atmosphere,
    pub store: &'a mut RecordStore,
}

/// Everything a side channel may touch after a payload was applied.
pub struct OnNextContext<'a> {
    pub atmosphere: &'a Atmosphere,
    pub history: &'a mut dyn History,
}
