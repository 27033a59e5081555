//! Wire and row types shared by the server, the client cache and the tools.

pub mod events;
pub mod integrations;
pub mod meeting;
pub mod mutations;
pub mod notification;
pub mod task;
pub mod team;
pub mod types;
pub mod user;

pub use events::{PublishEvent, PublishOptions, SubscriptionPayload, TeamMemberPresence};
pub use integrations::{
    AtlassianAuth, Provider, SlackAuth, TeamMemberIntegrations, to_integrations_id,
};
pub use meeting::{Meeting, MeetingRef};
pub use mutations::{
    RemoveTeamMemberPayload, RemoveTeamMemberRequest, RemovedTeamMember,
    SetNotificationStatusPayload, SetNotificationStatusRequest, StandardMutationError,
};
pub use notification::{KickOutNotification, Notification};
pub use task::Task;
pub use team::{PayloadTeam, Team, TeamMember, from_team_member_id, to_team_member_id};
pub use types::{
    Channel, EventType, MeetingType, NotificationStatus, NotificationType, ProviderService,
};
pub use user::User;
