use api_types::{
    Channel, EventType, PublishOptions, SubscriptionPayload, TeamMemberPresence, User,
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

/// Called when a client's socket opens.
///
/// Adds `socket_id` to the caller's socket set. The first socket of an
/// offline user announces them as connected to each of their teams. Returns
/// the post-update user, or `None` if the user does not exist.
#[instrument(skip(ctx), fields(user_id = %ctx.auth_token.user_id()))]
pub async fn connect_socket(
    ctx: &MutationContext,
    socket_id: &str,
) -> Result<Option<User>, DatastoreError> {
    let user_id = get_user_id(&ctx.auth_token);
    let user = match ctx.db.add_connected_socket(user_id, socket_id).await? {
        SocketUpdate::UserNotFound => {
            debug!("connect for unknown user");
            return Ok(None);
        }
        SocketUpdate::Unchanged(user) => return Ok(Some(user)),
        SocketUpdate::Changed(user) => user,
    };
    if user.connected_sockets.len() != 1 {
        return Ok(Some(user));
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
                is_connected: true,
            }),
            options.clone(),
        );
    }
    info!(teams = user.tms.len(), "user came online");
    Ok(Some(user))
}
