use api_types::{
    Channel, EventType, PublishOptions, SubscriptionPayload, TeamMemberPresence,
    to_team_member_id,
};
use tracing::{debug, info, instrument};
use utils::ids::new_operation_id;

use super::MutationContext;
use crate::{
    auth::get_user_id,
    db::{DatastoreError, SocketUpdate},
    publish::publish,
};

/// Called when a client's socket closes.
///
/// Removes `socket_id` from the caller's socket set. When that empties the
/// set, every team the caller belongs to gets one presence event saying the
/// member went offline. Returns `false` when no socket id was given, the
/// user does not exist, or the socket was not in the set.
#[instrument(skip(ctx), fields(user_id = %ctx.auth_token.user_id()))]
pub async fn disconnect_socket(
    ctx: &MutationContext,
    socket_id: Option<&str>,
) -> Result<bool, DatastoreError> {
    let Some(socket_id) = socket_id.filter(|id| !id.is_empty()) else {
        return Ok(false);
    };
    let user_id = get_user_id(&ctx.auth_token);

    let user = match ctx.db.remove_connected_socket(user_id, socket_id).await? {
        SocketUpdate::UserNotFound => {
            debug!("disconnect for unknown user");
            return Ok(false);
        }
        SocketUpdate::Unchanged(_) => {
            debug!("socket was not connected");
            return Ok(false);
        }
        SocketUpdate::Changed(user) => user,
    };
    if !user.connected_sockets.is_empty() {
        return Ok(true);
    }

    let options = PublishOptions {
        mutator_id: Some(socket_id.to_string()),
        operation_id: Some(new_operation_id()),
    };
    for team_id in &user.tms {
        publish(
            ctx.publisher.as_ref(),
            Channel::TeamMember,
            team_id,
            EventType::Updated,
            SubscriptionPayload::TeamMemberPresence(TeamMemberPresence {
                team_member_id: to_team_member_id(team_id, user_id),
                is_connected: false,
            }),
            options.clone(),
        );
    }
    info!(teams = user.tms.len(), "user went offline");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc};

    use super::*;
    use crate::{
        db::{Datastore, MemoryDatastore},
        mutations::testing::{context, user},
    };

    fn store_with(sockets: &[&str]) -> Arc<MemoryDatastore> {
        let db = Arc::new(MemoryDatastore::new());
        db.insert_user(user("u1", sockets, &["t1", "t2", "t3"]));
        db
    }

    async fn sockets(db: &MemoryDatastore) -> Vec<String> {
        db.get_user("u1").await.unwrap().unwrap().connected_sockets
    }

    #[tokio::test]
    async fn missing_socket_id_changes_nothing() {
        let db = store_with(&["s1"]);
        let (ctx, publisher) = context(db.clone(), "u1", &[], None);

        assert!(!disconnect_socket(&ctx, None).await.unwrap());
        assert!(!disconnect_socket(&ctx, Some("")).await.unwrap());
        assert_eq!(sockets(&db).await, ["s1"]);
        assert!(publisher.events().is_empty());
    }

    #[tokio::test]
    async fn unknown_user_returns_false() {
        let db = Arc::new(MemoryDatastore::new());
        let (ctx, publisher) = context(db, "ghost", &[], None);

        assert!(!disconnect_socket(&ctx, Some("s1")).await.unwrap());
        assert!(publisher.events().is_empty());
    }

    #[tokio::test]
    async fn unknown_socket_leaves_the_set_alone() {
        let db = store_with(&["s1", "s2"]);
        let (ctx, publisher) = context(db.clone(), "u1", &[], None);

        assert!(!disconnect_socket(&ctx, Some("s9")).await.unwrap());
        assert_eq!(sockets(&db).await, ["s1", "s2"]);
        assert!(publisher.events().is_empty());
    }

    #[tokio::test]
    async fn unknown_socket_on_an_empty_set_emits_nothing() {
        let db = store_with(&[]);
        let (ctx, publisher) = context(db.clone(), "u1", &[], None);

        assert!(!disconnect_socket(&ctx, Some("s9")).await.unwrap());
        assert!(sockets(&db).await.is_empty());
        assert!(publisher.events().is_empty());
    }

    #[tokio::test]
    async fn last_socket_notifies_every_team_once() {
        let db = store_with(&["s1", "s2"]);
        let (ctx, publisher) = context(db.clone(), "u1", &[], None);

        assert!(disconnect_socket(&ctx, Some("s2")).await.unwrap());
        assert_eq!(sockets(&db).await, ["s1"]);
        assert!(publisher.events().is_empty());

        assert!(disconnect_socket(&ctx, Some("s1")).await.unwrap());
        assert!(sockets(&db).await.is_empty());

        let events = publisher.events();
        assert_eq!(events.len(), 3);
        let teams: HashSet<_> = events.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(teams, HashSet::from(["t1", "t2", "t3"]));

        let operation_ids: HashSet<_> = events
            .iter()
            .map(|e| e.options.operation_id.clone())
            .collect();
        assert_eq!(operation_ids.len(), 1);
        assert!(operation_ids.iter().all(Option::is_some));

        for event in &events {
            assert_eq!(event.channel, Channel::TeamMember);
            assert_eq!(event.event_type, EventType::Updated);
            assert_eq!(event.options.mutator_id.as_deref(), Some("s1"));
            let SubscriptionPayload::TeamMemberPresence(presence) = &event.payload else {
                panic!("unexpected payload {:?}", event.payload);
            };
            assert!(!presence.is_connected);
            assert_eq!(
                presence.team_member_id,
                to_team_member_id(&event.entity_id, "u1")
            );
        }
    }

    #[tokio::test]
    async fn disconnecting_the_same_socket_twice_reports_no_change() {
        let db = store_with(&["s1"]);
        let (ctx, publisher) = context(db.clone(), "u1", &[], None);

        assert!(disconnect_socket(&ctx, Some("s1")).await.unwrap());
        assert!(!disconnect_socket(&ctx, Some("s1")).await.unwrap());
        assert_eq!(publisher.events().len(), 3);
    }

    #[tokio::test]
    async fn concurrent_disconnects_broadcast_exactly_once() {
        let db = store_with(&["s1", "s2"]);
        let (ctx, publisher) = context(db.clone(), "u1", &[], None);

        let (a, b) = tokio::join!(
            disconnect_socket(&ctx, Some("s1")),
            disconnect_socket(&ctx, Some("s2"))
        );
        assert!(a.unwrap() && b.unwrap());
        assert!(sockets(&db).await.is_empty());
        assert_eq!(publisher.events().len(), 3);
    }
}
