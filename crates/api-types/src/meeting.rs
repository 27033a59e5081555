use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;

use crate::types::MeetingType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Meeting {
    pub id: String,
    pub team_id: String,
    pub meeting_type: MeetingType,
    pub facilitator_user_id: String,
    pub facilitator_stage_id: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Meeting {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MeetingRef {
    pub id: String,
}

impl From<&Meeting> for MeetingRef {
    fn from(meeting: &Meeting) -> Self {
        Self {
            id: meeting.id.clone(),
        }
    }
}
