//! Server-side mutation handlers.
//!
//! Each handler authorizes the caller from an explicit [`AuthToken`], performs
//! its store update, and publishes the events other clients need. Caller
//! mistakes come back as an error payload; store failures propagate.

use std::sync::Arc;

use api_types::{
    RemoveTeamMemberPayload, RemoveTeamMemberRequest, SetNotificationStatusPayload,
    SetNotificationStatusRequest,
};

use crate::{
    AppState, auth::AuthToken, db::Datastore, mutation_def::MutationRequestFor,
    publish::Publisher,
};

mod connect_socket;
mod disconnect_socket;
mod remove_team_member;
mod set_notification_status;

pub use connect_socket::connect_socket;
pub use disconnect_socket::disconnect_socket;
pub use remove_team_member::remove_team_member;
pub use set_notification_status::set_notification_status;

/// Everything a mutation needs about its caller and collaborators.
#[derive(Clone)]
pub struct MutationContext {
    pub auth_token: AuthToken,
    /// Socket that issued the mutation, echoed as the events' `mutatorId`.
    pub mutator_id: Option<String>,
    pub db: Arc<dyn Datastore>,
    pub publisher: Arc<dyn Publisher>,
}

impl MutationContext {
    pub fn new(state: &AppState, auth_token: AuthToken, mutator_id: Option<String>) -> Self {
        Self {
            auth_token,
            mutator_id,
            db: state.db.clone(),
            publisher: state.pubsub.clone(),
        }
    }
}

impl MutationRequestFor for RemoveTeamMemberRequest {
    type Payload = RemoveTeamMemberPayload;
}

impl MutationRequestFor for SetNotificationStatusRequest {
    type Payload = SetNotificationStatusPayload;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use api_types::{Meeting, MeetingType, Task, Team, TeamMember, User, to_team_member_id};

    use super::MutationContext;
    use crate::{auth::AuthToken, db::MemoryDatastore, publish::testing::RecordingPublisher};

    pub fn user(id: &str, sockets: &[&str], tms: &[&str]) -> User {
        User {
            id: id.to_string(),
            preferred_name: id.to_uppercase(),
            picture: None,
            connected_sockets: sockets.iter().map(|s| s.to_string()).collect(),
            tms: tms.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn team_member(team_id: &str, user_id: &str, is_lead: bool) -> TeamMember {
        TeamMember {
            id: to_team_member_id(team_id, user_id),
            team_id: team_id.to_string(),
            user_id: user_id.to_string(),
            preferred_name: user_id.to_uppercase(),
            is_lead,
            is_not_removed: true,
            is_connected: false,
        }
    }

    pub fn task(id: &str, team_id: &str, user_id: &str) -> Task {
        Task {
            id: id.to_string(),
            team_id: team_id.to_string(),
            user_id: Some(user_id.to_string()),
            content: format!("do {id}"),
            tags: vec![],
        }
    }

    /// Team `t1` led by `lead`, with member `u1` owning two tasks and one
    /// running retrospective.
    pub fn seeded_team() -> Arc<MemoryDatastore> {
        let db = Arc::new(MemoryDatastore::new());
        db.insert_user(user("lead", &["ls1"], &["t1"]));
        db.insert_user(user("u1", &["s1"], &["t1", "t2"]));
        db.insert_team(Team {
            id: "t1".to_string(),
            name: "Team One".to_string(),
            org_id: "o1".to_string(),
            is_archived: false,
        });
        db.insert_team_member(team_member("t1", "lead", true));
        db.insert_team_member(team_member("t1", "u1", false));
        db.insert_task(task("task1", "t1", "u1"));
        db.insert_task(task("task2", "t1", "u1"));
        db.insert_task(task("task3", "t1", "lead"));
        db.insert_meeting(Meeting {
            id: "m1".to_string(),
            team_id: "t1".to_string(),
            meeting_type: MeetingType::Retrospective,
            facilitator_user_id: "lead".to_string(),
            facilitator_stage_id: None,
            ended_at: None,
        });
        db
    }

    pub fn context(
        db: Arc<MemoryDatastore>,
        user_id: &str,
        tms: &[&str],
        mutator_id: Option<&str>,
    ) -> (MutationContext, Arc<RecordingPublisher>) {
        let publisher = Arc::new(RecordingPublisher::default());
        let ctx = MutationContext {
            auth_token: AuthToken::new(
                user_id,
                tms.iter().map(|s| s.to_string()).collect(),
                chrono::Duration::hours(1),
            ),
            mutator_id: mutator_id.map(str::to_string),
            db,
            publisher: publisher.clone(),
        };
        (ctx, publisher)
    }
}
