use api_types::{
    Channel, EventType, NotificationStatus, PublishOptions, SetNotificationStatusPayload,
    SubscriptionPayload,
};
use tracing::instrument;
use utils::ids::new_operation_id;

use super::MutationContext;
use crate::{auth::get_user_id, db::DatastoreError, publish::publish};

/// Change the status of one of the caller's notifications.
///
/// Notifications that belong to someone else are reported as missing.
#[instrument(skip(ctx), fields(user_id = %ctx.auth_token.user_id()))]
pub async fn set_notification_status(
    ctx: &MutationContext,
    notification_id: &str,
    status: NotificationStatus,
) -> Result<SetNotificationStatusPayload, DatastoreError> {
    let viewer_id = get_user_id(&ctx.auth_token);

    // AUTH
    let owned = ctx
        .db
        .get_notification(notification_id)
        .await?
        .is_some_and(|notification| notification.user_id == viewer_id);
    if !owned {
        return Ok(SetNotificationStatusPayload::error("Notification not found"));
    }

    // RESOLUTION
    let Some(notification) = ctx
        .db
        .update_notification_status(notification_id, status)
        .await?
    else {
        return Ok(SetNotificationStatusPayload::error("Notification not found"));
    };
    let payload = SetNotificationStatusPayload {
        error: None,
        notification: Some(notification),
    };
    publish(
        ctx.publisher.as_ref(),
        Channel::Notification,
        viewer_id,
        EventType::Updated,
        SubscriptionPayload::SetNotificationStatusPayload(payload.clone()),
        PublishOptions {
            mutator_id: ctx.mutator_id.clone(),
            operation_id: Some(new_operation_id()),
        },
    );
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use api_types::{Notification, NotificationType};
    use chrono::Utc;

    use super::*;
    use crate::{
        db::{Datastore, MemoryDatastore},
        mutations::testing::context,
    };

    fn store_with_notification() -> Arc<MemoryDatastore> {
        let db = Arc::new(MemoryDatastore::new());
        db.insert_notification(Notification {
            id: "n1".to_string(),
            notification_type: NotificationType::KickedOut,
            user_id: "u1".to_string(),
            team_id: Some("t1".to_string()),
            status: NotificationStatus::Unread,
            created_at: Utc::now(),
        });
        db
    }

    #[tokio::test]
    async fn owner_can_mark_clicked() {
        let db = store_with_notification();
        let (ctx, publisher) = context(db.clone(), "u1", &[], Some("s1"));

        let payload = set_notification_status(&ctx, "n1", NotificationStatus::Clicked)
            .await
            .unwrap();
        assert_eq!(payload.error, None);
        assert_eq!(
            payload.notification.unwrap().status,
            NotificationStatus::Clicked
        );
        let events = publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].topic(), "NOTIFICATION.u1");
    }

    #[tokio::test]
    async fn other_users_see_not_found() {
        let db = store_with_notification();
        let (ctx, publisher) = context(db.clone(), "u2", &[], None);

        let payload = set_notification_status(&ctx, "n1", NotificationStatus::Read)
            .await
            .unwrap();
        assert_eq!(payload.error.unwrap().message, "Notification not found");
        assert!(publisher.events().is_empty());
        let stored = db.get_notification("n1").await.unwrap().unwrap();
        assert_eq!(stored.status, NotificationStatus::Unread);
    }
}
