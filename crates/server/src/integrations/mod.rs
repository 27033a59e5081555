//! Team member integration resolvers.
//!
//! Each resolver checks team membership on its own and returns `None` for
//! callers outside the team, so existence of an integration never leaks.

use api_types::{
    AtlassianAuth, Provider, ProviderService, SlackAuth, TeamMemberIntegrations,
    from_team_member_id, to_integrations_id,
};

use crate::{
    auth::{AuthToken, is_team_member},
    db::Datastore,
    error::ApiError,
};

mod loaders;

pub use loaders::Loaders;

pub async fn resolve_atlassian(
    auth_token: &AuthToken,
    loaders: &Loaders,
    team_id: &str,
    user_id: &str,
) -> Result<Option<AtlassianAuth>, ApiError> {
    if !is_team_member(auth_token, team_id) {
        return Ok(None);
    }
    Ok(loaders.fresh_atlassian_auth(team_id, user_id).await?)
}

pub async fn resolve_github(
    auth_token: &AuthToken,
    db: &dyn Datastore,
    team_id: &str,
    user_id: &str,
) -> Result<Option<Provider>, ApiError> {
    if !is_team_member(auth_token, team_id) {
        return Ok(None);
    }
    let providers = db.providers_by_team(team_id).await?;
    Ok(providers.into_iter().find(|provider| {
        provider.service == ProviderService::GitHubIntegration
            && provider.is_active
            && provider.user_id == user_id
    }))
}

pub async fn resolve_slack(
    auth_token: &AuthToken,
    loaders: &Loaders,
    team_id: &str,
    user_id: &str,
) -> Result<Option<SlackAuth>, ApiError> {
    if !is_team_member(auth_token, team_id) {
        return Ok(None);
    }
    let auths = loaders.slack_auth_by_user_id(user_id).await?;
    Ok(auths.iter().find(|auth| auth.team_id == team_id).cloned())
}

/// Resolve every integration of a team member concurrently. Returns `None`
/// for a malformed team member id.
pub async fn resolve_team_member_integrations(
    auth_token: &AuthToken,
    db: &dyn Datastore,
    loaders: &Loaders,
    team_member_id: &str,
) -> Result<Option<TeamMemberIntegrations>, ApiError> {
    let Some((team_id, user_id)) = from_team_member_id(team_member_id) else {
        return Ok(None);
    };
    let (atlassian, github, slack) = tokio::try_join!(
        resolve_atlassian(auth_token, loaders, team_id, user_id),
        resolve_github(auth_token, db, team_id, user_id),
        resolve_slack(auth_token, loaders, team_id, user_id),
    )?;
    Ok(Some(TeamMemberIntegrations {
        id: to_integrations_id(team_id, user_id),
        atlassian,
        github,
        slack,
    }))
}
