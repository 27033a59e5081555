use api_types::{
    KickOutNotification, NotificationStatus, RemoveTeamMemberPayload, RemoveTeamMemberRequest,
    SetNotificationStatusRequest,
};
use tracing::{debug, instrument};

use super::{OnNextContext, UpdaterContext};
use crate::{
    api::{ClientError, REMOVE_TEAM_MEMBER_PATH},
    atmosphere::{Atmosphere, AtmosphereEvent, Snackbar, SnackbarAction, SnackbarCommand},
    handlers::{
        handle_add_notifications, handle_remove_tasks, handle_remove_team_members,
        handle_remove_teams, handle_upsert_tasks,
    },
    routes::{on_meeting_route, on_team_route},
    store::RecordStore,
};

const KICK_OUT_AUTO_DISMISS_SECS: u32 = 10;
const HOME_PATH: &str = "/me";

pub fn remove_team_member_tasks_updater(payload: &RemoveTeamMemberPayload, store: &mut RecordStore) {
    handle_upsert_tasks(&payload.updated_tasks, store);
}

/// Drop the removed member, or the whole team when the viewer is the one
/// removed.
pub fn remove_team_member_team_updater(
    payload: &RemoveTeamMemberPayload,
    ctx: &mut UpdaterContext<'_>,
) {
    let Some(team_member) = &payload.team_member else {
        return;
    };
    if team_member.user_id != ctx.atmosphere.viewer_id() {
        handle_remove_team_members([team_member.id.as_str()], ctx.store);
        return;
    }

    if let Some(team) = &payload.team {
        handle_remove_teams([team.id.as_str()], ctx.store);
    }
    handle_add_notifications(
        payload
            .kick_out_notification
            .iter()
            .map(KickOutNotification::to_notification),
        ctx.store,
    );
    handle_remove_tasks(
        payload.updated_tasks.iter().map(|task| task.id.as_str()),
        ctx.store,
    );
}

/// Apply a remove-team-member payload to the cache.
pub fn remove_team_member_updater(payload: &RemoveTeamMemberPayload, ctx: &mut UpdaterContext<'_>) {
    remove_team_member_tasks_updater(payload, ctx.store);
    remove_team_member_team_updater(payload, ctx);
}

/// Tell a removed user what happened and move them off the team's pages.
pub fn remove_team_member_team_on_next(
    payload: &RemoveTeamMemberPayload,
    ctx: &mut OnNextContext<'_>,
) {
    let Some(notification) = &payload.kick_out_notification else {
        return;
    };
    if notification.user_id != ctx.atmosphere.viewer_id() {
        return;
    }
    let team = &notification.team;
    if team.id.is_empty() {
        return;
    }

    ctx.atmosphere.emit(AtmosphereEvent::AddSnackbar(Snackbar {
        key: format!("removedFromTeam:{}", team.id),
        auto_dismiss: Some(KICK_OUT_AUTO_DISMISS_SECS),
        message: format!("You have been removed from {}", team.name),
        action: Some(SnackbarAction {
            label: "OK".to_string(),
            command: SnackbarCommand::SetNotificationStatus(SetNotificationStatusRequest {
                notification_id: notification.id.clone(),
                status: NotificationStatus::Clicked,
            }),
        }),
    }));

    let meeting_ids: Vec<&str> = team
        .active_meetings
        .iter()
        .map(|meeting| meeting.id.as_str())
        .collect();
    let pathname = ctx.history.pathname();
    if on_team_route(pathname, &team.id) || on_meeting_route(pathname, &meeting_ids) {
        debug!(team_id = %team.id, "leaving removed team's page");
        ctx.history.push(HOME_PATH);
    }
}

/// Send the mutation and apply the returned payload. Payload-level errors
/// are returned to the caller untouched and leave the cache as is.
#[instrument(skip(atmosphere, store))]
pub async fn commit_remove_team_member(
    atmosphere: &Atmosphere,
    store: &mut RecordStore,
    team_member_id: &str,
) -> Result<RemoveTeamMemberPayload, ClientError> {
    let request = RemoveTeamMemberRequest {
        team_member_id: team_member_id.to_string(),
    };
    let payload: RemoveTeamMemberPayload = atmosphere
        .api()?
        .mutate(REMOVE_TEAM_MEMBER_PATH, &request, atmosphere.socket_id())
        .await?;
    if payload.error.is_none() {
        remove_team_member_updater(
            &payload,
            &mut UpdaterContext {
                atmosphere,
                store,
            },
        );
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use api_types::{
        MeetingRef, NotificationType, PayloadTeam, RemovedTeamMember, Task, Team, TeamMember,
    };
    use chrono::Utc;

    use super::*;
    use crate::history::{History, MemoryHistory};

    fn task(id: &str, user_id: &str) -> Task {
        Task {
            id: id.to_string(),
            team_id: "t1".to_string(),
            user_id: Some(user_id.to_string()),
            content: format!("content of {id}"),
            tags: Vec::new(),
        }
    }

    /// Viewer `viewer` on team t1 with teammate `u2`, plus the two tasks u2
    /// owned before the removal.
    fn seeded_store(viewer: &str) -> RecordStore {
        let mut store = RecordStore::new(viewer);
        store.insert_team(Team {
            id: "t1".to_string(),
            name: "Team One".to_string(),
            org_id: "org1".to_string(),
            is_archived: false,
        });
        for user_id in [viewer, "u2"] {
            store.team_members.upsert(TeamMember {
                id: format!("{user_id}::t1"),
                team_id: "t1".to_string(),
                user_id: user_id.to_string(),
                preferred_name: user_id.to_string(),
                is_lead: false,
                is_not_removed: true,
                is_connected: false,
            });
        }
        store.tasks.upsert(task("task1", "u2"));
        store.tasks.upsert(task("task2", "u2"));
        store
    }

    fn payload(removed_user: &str) -> RemoveTeamMemberPayload {
        let team = PayloadTeam {
            id: "t1".to_string(),
            name: "Team One".to_string(),
            active_meetings: vec![MeetingRef {
                id: "m1".to_string(),
            }],
        };
        RemoveTeamMemberPayload {
            error: None,
            updated_tasks: vec![task("task1", "lead"), task("task2", "lead")],
            kick_out_notification: Some(KickOutNotification {
                id: "n1".to_string(),
                notification_type: NotificationType::KickedOut,
                user_id: removed_user.to_string(),
                status: NotificationStatus::Unread,
                created_at: Utc::now(),
                team: team.clone(),
            }),
            team: Some(team),
            team_member: Some(RemovedTeamMember {
                id: format!("{removed_user}::t1"),
                user_id: removed_user.to_string(),
            }),
        }
    }

    #[test]
    fn removing_someone_else_keeps_the_team() {
        let atmosphere = Atmosphere::new("u1");
        let mut store = seeded_store("u1");
        remove_team_member_updater(
            &payload("u2"),
            &mut UpdaterContext {
                atmosphere: &atmosphere,
                store: &mut store,
            },
        );

        assert!(store.teams.contains("t1"));
        assert_eq!(store.viewer.team_ids, ["t1"]);
        assert!(!store.team_members.contains("u2::t1"));
        assert!(store.team_members.contains("u1::t1"));
        assert!(store.notifications.is_empty());
        // Reassigned tasks are merged in.
        assert_eq!(
            store.tasks.get("task1").unwrap().user_id.as_deref(),
            Some("lead")
        );
        assert_eq!(store.tasks.len(), 2);
    }

    #[test]
    fn removing_the_viewer_drops_the_team_and_adds_one_notification() {
        let atmosphere = Atmosphere::new("u2");
        let mut store = seeded_store("u2");
        remove_team_member_updater(
            &payload("u2"),
            &mut UpdaterContext {
                atmosphere: &atmosphere,
                store: &mut store,
            },
        );

        assert!(!store.teams.contains("t1"));
        assert!(store.viewer.team_ids.is_empty());
        assert_eq!(store.notifications.len(), 1);
        assert_eq!(store.viewer.notification_ids, ["n1"]);
        assert_eq!(
            store.notifications.get("n1").unwrap().team_id.as_deref(),
            Some("t1")
        );
        assert!(store.tasks.is_empty());
    }

    #[test]
    fn tasks_unknown_to_the_cache_are_created() {
        let mut store = RecordStore::new("u1");
        remove_team_member_tasks_updater(&payload("u2"), &mut store);
        assert_eq!(store.tasks_for_team("t1").len(), 2);
    }

    #[test]
    fn error_payloads_change_nothing() {
        let atmosphere = Atmosphere::new("u1");
        let mut store = seeded_store("u1");
        remove_team_member_updater(
            &RemoveTeamMemberPayload::error("Not on team"),
            &mut UpdaterContext {
                atmosphere: &atmosphere,
                store: &mut store,
            },
        );
        assert!(store.team_members.contains("u2::t1"));
        assert_eq!(store.tasks.len(), 2);
    }

    #[test]
    fn on_next_shows_snackbar_and_leaves_team_route() {
        let atmosphere = Atmosphere::new("u2");
        let mut events = atmosphere.subscribe();
        let mut history = MemoryHistory::new("/team/t1/settings");
        remove_team_member_team_on_next(
            &payload("u2"),
            &mut OnNextContext {
                atmosphere: &atmosphere,
                history: &mut history,
            },
        );

        let AtmosphereEvent::AddSnackbar(snackbar) = events.try_recv().unwrap();
        assert_eq!(snackbar.key, "removedFromTeam:t1");
        assert_eq!(snackbar.auto_dismiss, Some(10));
        assert_eq!(snackbar.message, "You have been removed from Team One");
        let action = snackbar.action.unwrap();
        assert_eq!(action.label, "OK");
        assert_eq!(
            action.command,
            SnackbarCommand::SetNotificationStatus(SetNotificationStatusRequest {
                notification_id: "n1".to_string(),
                status: NotificationStatus::Clicked,
            })
        );
        assert_eq!(history.pathname(), "/me");
    }

    #[test]
    fn on_next_leaves_active_meeting_route() {
        let atmosphere = Atmosphere::new("u2");
        let mut history = MemoryHistory::new("/meet/m1");
        remove_team_member_team_on_next(
            &payload("u2"),
            &mut OnNextContext {
                atmosphere: &atmosphere,
                history: &mut history,
            },
        );
        assert_eq!(history.pathname(), "/me");
    }

    #[test]
    fn on_next_stays_on_unrelated_pages() {
        let atmosphere = Atmosphere::new("u2");
        let mut history = MemoryHistory::new("/team/t2");
        remove_team_member_team_on_next(
            &payload("u2"),
            &mut OnNextContext {
                atmosphere: &atmosphere,
                history: &mut history,
            },
        );
        assert_eq!(history.entries(), ["/team/t2"]);
    }

    #[test]
    fn on_next_without_notification_is_silent() {
        let atmosphere = Atmosphere::new("u1");
        let mut events = atmosphere.subscribe();
        let mut history = MemoryHistory::new("/team/t1");
        let mut payload = payload("u2");
        payload.kick_out_notification = None;
        remove_team_member_team_on_next(
            &payload,
            &mut OnNextContext {
                atmosphere: &atmosphere,
                history: &mut history,
            },
        );
        assert!(events.try_recv().is_err());
        assert_eq!(history.pathname(), "/team/t1");
    }

    #[test]
    fn on_next_ignores_someone_elses_notification() {
        let atmosphere = Atmosphere::new("u1");
        let mut events = atmosphere.subscribe();
        let mut history = MemoryHistory::new("/meet/m1");
        remove_team_member_team_on_next(
            &payload("u2"),
            &mut OnNextContext {
                atmosphere: &atmosphere,
                history: &mut history,
            },
        );
        assert!(events.try_recv().is_err());
        assert_eq!(history.entries(), ["/meet/m1"]);
    }
}
