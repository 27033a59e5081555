//! Reusable cache mutations shared by the mutation updaters and the
//! subscription handlers.

use api_types::{Notification, Task, TeamMemberPresence};
use tracing::debug;

use crate::store::RecordStore;

/// Merge tasks into the cache, creating missing rows.
pub fn handle_upsert_tasks(tasks: &[Task], store: &mut RecordStore) {
    for task in tasks {
        store.tasks.upsert(task.clone());
    }
}

pub fn handle_remove_tasks<'a>(task_ids: impl IntoIterator<Item = &'a str>, store: &mut RecordStore) {
    for task_id in task_ids {
        store.tasks.delete(task_id);
    }
}

pub fn handle_remove_team_members<'a>(
    team_member_ids: impl IntoIterator<Item = &'a str>,
    store: &mut RecordStore,
) {
    for team_member_id in team_member_ids {
        store.team_members.delete(team_member_id);
    }
}

/// Drop teams and unlink them from the viewer.
pub fn handle_remove_teams<'a>(team_ids: impl IntoIterator<Item = &'a str>, store: &mut RecordStore) {
    for team_id in team_ids {
        store.teams.delete(team_id);
        store.viewer.team_ids.retain(|id| id != team_id);
    }
}

/// Store notifications and put them at the head of the viewer's list.
pub fn handle_add_notifications(
    notifications: impl IntoIterator<Item = Notification>,
    store: &mut RecordStore,
) {
    for notification in notifications {
        if !store.viewer.notification_ids.contains(&notification.id) {
            store.viewer.notification_ids.insert(0, notification.id.clone());
        }
        store.notifications.upsert(notification);
    }
}

/// Returns `false` when the team member is not cached.
pub fn handle_team_member_presence(presence: &TeamMemberPresence, store: &mut RecordStore) -> bool {
    match store.team_members.get_mut(&presence.team_member_id) {
        Some(team_member) => {
            team_member.is_connected = presence.is_connected;
            true
        }
        None => {
            debug!(team_member_id = %presence.team_member_id, "presence for uncached team member");
            false
        }
    }
}
