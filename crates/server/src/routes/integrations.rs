use api_types::TeamMemberIntegrations;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    AppState, auth::AuthToken, error::ApiError,
    integrations::resolve_team_member_integrations,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/v1/team_members/{team_member_id}/integrations",
        get(get_team_member_integrations),
    )
}

async fn get_team_member_integrations(
    State(state): State<AppState>,
    auth_token: AuthToken,
    Path(team_member_id): Path<String>,
) -> Result<Json<Option<TeamMemberIntegrations>>, ApiError> {
    let integrations = resolve_team_member_integrations(
        &auth_token,
        state.db.as_ref(),
        &state.loaders,
        &team_member_id,
    )
    .await?;
    Ok(Json(integrations))
}
