use api_types::{
    RemoveTeamMemberPayload, RemoveTeamMemberRequest, SetNotificationStatusPayload,
    SetNotificationStatusRequest,
};
use axum::{Json, Router, extract::State};

use crate::{
    AppState,
    auth::{AuthToken, MutatorId},
    error::ApiError,
    mutation_def::{MutationDef, MutationMeta},
    mutations::{MutationContext, remove_team_member, set_notification_status},
};

pub fn remove_team_member_def() -> MutationDef<RemoveTeamMemberRequest> {
    MutationDef::new("removeTeamMember", "/v1/mutations/remove_team_member")
        .handler(remove_team_member_handler)
}

pub fn set_notification_status_def() -> MutationDef<SetNotificationStatusRequest> {
    MutationDef::new(
        "setNotificationStatus",
        "/v1/mutations/set_notification_status",
    )
    .handler(set_notification_status_handler)
}

pub fn router() -> Router<AppState> {
    remove_team_member_def()
        .router()
        .merge(set_notification_status_def().router())
}

/// Metadata for every mutation exposed over HTTP.
pub fn metadata() -> Vec<MutationMeta> {
    vec![
        remove_team_member_def().metadata(),
        set_notification_status_def().metadata(),
    ]
}

async fn remove_team_member_handler(
    State(state): State<AppState>,
    auth_token: AuthToken,
    MutatorId(mutator_id): MutatorId,
    Json(request): Json<RemoveTeamMemberRequest>,
) -> Result<Json<RemoveTeamMemberPayload>, ApiError> {
    let ctx = MutationContext::new(&state, auth_token, mutator_id);
    Ok(Json(
        remove_team_member(&ctx, &request.team_member_id).await?,
    ))
}

async fn set_notification_status_handler(
    State(state): State<AppState>,
    auth_token: AuthToken,
    MutatorId(mutator_id): MutatorId,
    Json(request): Json<SetNotificationStatusRequest>,
) -> Result<Json<SetNotificationStatusPayload>, ApiError> {
    let ctx = MutationContext::new(&state, auth_token, mutator_id);
    Ok(Json(
        set_notification_status(&ctx, &request.notification_id, request.status).await?,
    ))
}
