use api_types::{SetNotificationStatusPayload, SetNotificationStatusRequest};
use tracing::instrument;

use crate::{
    api::{ClientError, SET_NOTIFICATION_STATUS_PATH},
    atmosphere::Atmosphere,
    store::RecordStore,
};

pub fn set_notification_status_updater(
    payload: &SetNotificationStatusPayload,
    store: &mut RecordStore,
) {
    if let Some(notification) = &payload.notification {
        store.notifications.upsert(notification.clone());
    }
}

#[instrument(skip(atmosphere, store), fields(notification_id = %request.notification_id))]
pub async fn commit_set_notification_status(
    atmosphere: &Atmosphere,
    store: &mut RecordStore,
    request: &SetNotificationStatusRequest,
) -> Result<SetNotificationStatusPayload, ClientError> {
    let payload: SetNotificationStatusPayload = atmosphere
        .api()?
        .mutate(SET_NOTIFICATION_STATUS_PATH, request, atmosphere.socket_id())
        .await?;
    set_notification_status_updater(&payload, store);
    Ok(payload)
}
