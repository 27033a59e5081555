use api_types::{
    Channel, EventType, KickOutNotification, MeetingRef, Notification, NotificationStatus,
    NotificationType, PayloadTeam, PublishOptions, RemoveTeamMemberPayload, RemovedTeamMember,
    SubscriptionPayload, from_team_member_id,
};
use chrono::Utc;
use tracing::{info, instrument};
use utils::ids::new_operation_id;
use uuid::Uuid;

use super::MutationContext;
use crate::{
    auth::{get_user_id, is_team_member},
    db::{DatastoreError, TeamMemberRemoval},
    publish::publish,
};

/// Remove a member from their team.
///
/// The lead may remove anyone but themself; any member may remove
/// themself. The removed user's tasks on the team move to the lead, and a
/// member removed by someone else receives a kicked-out notification. The
/// payload goes to the team and to the removed user; only the removed
/// user's copy carries the notification.
#[instrument(skip(ctx), fields(user_id = %ctx.auth_token.user_id()))]
pub async fn remove_team_member(
    ctx: &MutationContext,
    team_member_id: &str,
) -> Result<RemoveTeamMemberPayload, DatastoreError> {
    let viewer_id = get_user_id(&ctx.auth_token);

    // AUTH
    let Some((team_id, user_id)) = from_team_member_id(team_member_id) else {
        return Ok(RemoveTeamMemberPayload::error("Invalid team member id"));
    };
    if !is_team_member(&ctx.auth_token, team_id) {
        return Ok(RemoveTeamMemberPayload::error("Not on team"));
    }
    let Some(lead) = ctx.db.team_lead(team_id).await? else {
        return Ok(RemoveTeamMemberPayload::error("Team has no lead"));
    };
    let removing_self = user_id == viewer_id;
    if !removing_self && lead.user_id != viewer_id {
        return Ok(RemoveTeamMemberPayload::error(
            "Only the team lead can remove other members",
        ));
    }
    if user_id == lead.user_id {
        return Ok(RemoveTeamMemberPayload::error(
            "The team lead cannot be removed",
        ));
    }
    let Some(team) = ctx.db.get_team(team_id).await? else {
        return Ok(RemoveTeamMemberPayload::error("Team not found"));
    };

    // RESOLUTION
    let active_meetings = ctx
        .db
        .active_meetings(team_id)
        .await?
        .iter()
        .map(MeetingRef::from)
        .collect();
    let payload_team = PayloadTeam {
        id: team.id.clone(),
        name: team.name.clone(),
        active_meetings,
    };
    let notification = (!removing_self).then(|| Notification {
        id: Uuid::new_v4().simple().to_string(),
        notification_type: NotificationType::KickedOut,
        user_id: user_id.to_string(),
        team_id: Some(team_id.to_string()),
        status: NotificationStatus::Unread,
        created_at: Utc::now(),
    });
    let removal = TeamMemberRemoval {
        team_member_id: team_member_id.to_string(),
        reassign_to: lead.user_id.clone(),
        notification,
    };
    let Some(removed) = ctx.db.remove_team_member(&removal).await? else {
        return Ok(RemoveTeamMemberPayload::error("Team member not found"));
    };

    let team_payload = RemoveTeamMemberPayload {
        error: None,
        updated_tasks: removed.updated_tasks,
        kick_out_notification: None,
        team: Some(payload_team.clone()),
        team_member: Some(RemovedTeamMember {
            id: removed.team_member.id,
            user_id: removed.team_member.user_id,
        }),
    };
    let removed_user_payload = RemoveTeamMemberPayload {
        kick_out_notification: removal.notification.map(|notification| KickOutNotification {
            id: notification.id,
            notification_type: notification.notification_type,
            user_id: notification.user_id,
            status: notification.status,
            created_at: notification.created_at,
            team: payload_team,
        }),
        ..team_payload.clone()
    };

    let options = PublishOptions {
        mutator_id: ctx.mutator_id.clone(),
        operation_id: Some(new_operation_id()),
    };
    publish(
        ctx.publisher.as_ref(),
        Channel::Team,
        team_id,
        EventType::Removed,
        SubscriptionPayload::RemoveTeamMemberPayload(team_payload.clone()),
        options.clone(),
    );
    publish(
        ctx.publisher.as_ref(),
        Channel::Notification,
        user_id,
        EventType::Added,
        SubscriptionPayload::RemoveTeamMemberPayload(removed_user_payload),
        options,
    );
    info!(
        %team_id,
        removed_user_id = %user_id,
        reassigned = team_payload.updated_tasks.len(),
        "team member removed"
    );
    // A self-removal has no notification, so the caller never receives one.
    Ok(team_payload)
}

#[cfg(test)]
mod tests {
    use api_types::to_team_member_id;

    use super::*;
    use crate::{
        db::Datastore,
        mutations::testing::{context, seeded_team},
    };

    #[tokio::test]
    async fn lead_removes_member_and_reassigns_tasks() {
        let db = seeded_team();
        let (ctx, publisher) = context(db.clone(), "lead", &["t1"], Some("ls1"));

        let payload = remove_team_member(&ctx, &to_team_member_id("t1", "u1"))
            .await
            .unwrap();
        assert_eq!(payload.error, None);

        let ids: Vec<_> = payload.updated_tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["task1", "task2"]);
        assert!(
            payload
                .updated_tasks
                .iter()
                .all(|t| t.user_id.as_deref() == Some("lead"))
        );
        assert_eq!(db.task("task3").unwrap().user_id.as_deref(), Some("lead"));

        let member = payload.team_member.clone().unwrap();
        assert_eq!(member.user_id, "u1");
        let team = payload.team.clone().unwrap();
        assert_eq!(team.active_meetings, [MeetingRef { id: "m1".into() }]);

        assert_eq!(payload.kick_out_notification, None);
        assert_eq!(db.notifications_for("u1").len(), 1);

        let user = db.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.tms, ["t2"]);
        let stored = db
            .get_team_member(&to_team_member_id("t1", "u1"))
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.is_not_removed);

        let events = publisher.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].topic(), "TEAM.t1");
        assert_eq!(events[1].topic(), "NOTIFICATION.u1");
        assert_eq!(events[0].options.mutator_id.as_deref(), Some("ls1"));
        assert_eq!(events[0].options.operation_id, events[1].options.operation_id);

        let SubscriptionPayload::RemoveTeamMemberPayload(to_user) = &events[1].payload else {
            panic!("expected a removal payload");
        };
        let notification = to_user.kick_out_notification.clone().unwrap();
        assert_eq!(notification.notification_type, NotificationType::KickedOut);
        assert_eq!(notification.user_id, "u1");
        assert_eq!(notification.team.name, "Team One");
        assert_eq!(to_user.updated_tasks, payload.updated_tasks);
    }

    #[tokio::test]
    async fn team_copy_carries_no_notification() {
        let db = seeded_team();
        let (ctx, publisher) = context(db, "lead", &["t1"], Some("ls1"));

        remove_team_member(&ctx, &to_team_member_id("t1", "u1"))
            .await
            .unwrap();

        let events = publisher.events();
        let SubscriptionPayload::RemoveTeamMemberPayload(to_team) = &events[0].payload else {
            panic!("expected a removal payload");
        };
        assert_eq!(events[0].channel, Channel::Team);
        assert_eq!(to_team.kick_out_notification, None);
        assert_eq!(to_team.team_member.as_ref().unwrap().user_id, "u1");
    }

    #[tokio::test]
    async fn members_may_leave_without_a_notification() {
        let db = seeded_team();
        let (ctx, _) = context(db.clone(), "u1", &["t1"], None);

        let payload = remove_team_member(&ctx, &to_team_member_id("t1", "u1"))
            .await
            .unwrap();
        assert_eq!(payload.error, None);
        assert_eq!(payload.kick_out_notification, None);
        assert!(db.notifications_for("u1").is_empty());
    }

    #[tokio::test]
    async fn non_leads_cannot_remove_others() {
        let db = seeded_team();
        let (ctx, publisher) = context(db.clone(), "u1", &["t1"], None);

        let payload = remove_team_member(&ctx, &to_team_member_id("t1", "lead"))
            .await
            .unwrap();
        assert!(payload.error.is_some());
        assert!(publisher.events().is_empty());
        assert_eq!(db.task("task3").unwrap().user_id.as_deref(), Some("lead"));
    }

    #[tokio::test]
    async fn callers_outside_the_team_are_rejected() {
        let db = seeded_team();
        let (ctx, publisher) = context(db, "lead", &["t9"], None);

        let payload = remove_team_member(&ctx, &to_team_member_id("t1", "u1"))
            .await
            .unwrap();
        assert_eq!(payload.error.unwrap().message, "Not on team");
        assert!(publisher.events().is_empty());
    }

    #[tokio::test]
    async fn removing_twice_reports_missing_member() {
        let db = seeded_team();
        let (ctx, _) = context(db, "lead", &["t1"], None);
        let id = to_team_member_id("t1", "u1");

        remove_team_member(&ctx, &id).await.unwrap();
        let second = remove_team_member(&ctx, &id).await.unwrap();
        assert_eq!(second.error.unwrap().message, "Team member not found");
    }
}
