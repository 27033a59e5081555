use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;

use crate::types::ProviderService;

/// OAuth grant a team member holds for Atlassian.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AtlassianAuth {
    pub team_id: String,
    pub user_id: String,
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub access_token: String,
    pub cloud_ids: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

impl AtlassianAuth {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Row in the provider table; GitHub integrations live here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Provider {
    pub id: String,
    pub service: ProviderService,
    pub team_id: String,
    pub user_id: String,
    pub is_active: bool,
    pub provider_user_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SlackAuth {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub slack_team_name: Option<String>,
    pub is_active: bool,
}

/// Every integration a team member has access to. Each field is `None` when
/// the integration is missing or the caller may not see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TeamMemberIntegrations {
    pub id: String,
    pub atlassian: Option<AtlassianAuth>,
    pub github: Option<Provider>,
    pub slack: Option<SlackAuth>,
}

/// Composite id of a team member's integrations bundle.
pub fn to_integrations_id(team_id: &str, user_id: &str) -> String {
    format!("integrations:{user_id}:{team_id}")
}
