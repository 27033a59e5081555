use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;

use crate::meeting::MeetingRef;

const TEAM_MEMBER_ID_SEPARATOR: &str = "::";

/// Build the composite team member id for a `(team, user)` pair.
pub fn to_team_member_id(team_id: &str, user_id: &str) -> String {
    format!("{user_id}{TEAM_MEMBER_ID_SEPARATOR}{team_id}")
}

/// Split a composite team member id into `(team_id, user_id)`.
///
/// Returns `None` when the id is not of the form `user::team` or either half
/// is empty.
pub fn from_team_member_id(team_member_id: &str) -> Option<(&str, &str)> {
    let (user_id, team_id) = team_member_id.split_once(TEAM_MEMBER_ID_SEPARATOR)?;
    if user_id.is_empty() || team_id.is_empty() {
        return None;
    }
    Some((team_id, user_id))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub org_id: String,
    pub is_archived: bool,
}

/// A user's membership in a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TeamMember {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub preferred_name: String,
    pub is_lead: bool,
    pub is_not_removed: bool,
    /// Derived from the user's socket set; never stored.
    #[sqlx(skip)]
    #[serde(default)]
    pub is_connected: bool,
}

/// Team as returned inside mutation payloads, with its live meetings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PayloadTeam {
    pub id: String,
    pub name: String,
    pub active_meetings: Vec<MeetingRef>,
}
