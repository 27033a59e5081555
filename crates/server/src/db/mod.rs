//! Data store adapter.
//!
//! Every mutation and resolver talks to storage through [`Datastore`]. Two
//! implementations exist: [`PgDatastore`] for production and
//! [`MemoryDatastore`] for tests and local runs without a database.
//!
//! Socket-set updates must be atomic per user row: the post-update record is
//! returned by the same operation that changes it, so two concurrent
//! disconnects can never both observe a non-empty set.

use api_types::{
    AtlassianAuth, Meeting, Notification, NotificationStatus, Provider, SlackAuth, Task, Team,
    TeamMember, User,
};
use async_trait::async_trait;
use thiserror::Error;

mod memory;
mod postgres;

pub use memory::MemoryDatastore;
pub use postgres::PgDatastore;

#[derive(Debug, Error)]
pub enum DatastoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("{0} already exists")]
    Conflict(String),
}

/// Outcome of an atomic change to a user's socket set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketUpdate {
    UserNotFound,
    /// The set already had (connect) or lacked (disconnect) the socket.
    Unchanged(User),
    /// The set changed; carries the post-update record.
    Changed(User),
}

/// Every write one team member removal makes. Applied as a unit: either
/// all of it lands or none of it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMemberRemoval {
    pub team_member_id: String,
    /// Receives the removed member's tasks on the team.
    pub reassign_to: String,
    /// Kicked-out notice for the removed user, if someone else removed them.
    pub notification: Option<Notification>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedMember {
    pub team_member: TeamMember,
    /// Tasks moved to the new owner, ordered by id.
    pub updated_tasks: Vec<Task>,
}

/// A persisted GraphQL document, keyed by its hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedQuery {
    pub id: String,
    pub query: String,
}

#[async_trait]
pub trait Datastore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, DatastoreError>;

    async fn add_connected_socket(
        &self,
        user_id: &str,
        socket_id: &str,
    ) -> Result<SocketUpdate, DatastoreError>;

    async fn remove_connected_socket(
        &self,
        user_id: &str,
        socket_id: &str,
    ) -> Result<SocketUpdate, DatastoreError>;

    /// Empty every user's socket set. Returns the number of users touched.
    async fn flush_connected_sockets(&self) -> Result<u64, DatastoreError>;

    async fn get_team(&self, team_id: &str) -> Result<Option<Team>, DatastoreError>;

    async fn get_team_member(
        &self,
        team_member_id: &str,
    ) -> Result<Option<TeamMember>, DatastoreError>;

    async fn team_lead(&self, team_id: &str) -> Result<Option<TeamMember>, DatastoreError>;

    /// Mark the member removed, drop the team from the user's `tms`, move
    /// their tasks on the team to `reassign_to` and store the notification.
    /// Returns `None`, having changed nothing, if the member does not exist
    /// or is already removed.
    async fn remove_team_member(
        &self,
        removal: &TeamMemberRemoval,
    ) -> Result<Option<RemovedMember>, DatastoreError>;

    async fn active_meetings(&self, team_id: &str) -> Result<Vec<Meeting>, DatastoreError>;

    async fn get_notification(
        &self,
        notification_id: &str,
    ) -> Result<Option<Notification>, DatastoreError>;

    async fn update_notification_status(
        &self,
        notification_id: &str,
        status: NotificationStatus,
    ) -> Result<Option<Notification>, DatastoreError>;

    /// All providers on a team, read through the `team_id` index.
    async fn providers_by_team(&self, team_id: &str) -> Result<Vec<Provider>, DatastoreError>;

    async fn slack_auths_by_user(&self, user_id: &str) -> Result<Vec<SlackAuth>, DatastoreError>;

    async fn atlassian_auth(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> Result<Option<AtlassianAuth>, DatastoreError>;

    /// Insert persisted queries, replacing any existing document with the
    /// same id. Returns the number of rows written.
    async fn upsert_persisted_queries(
        &self,
        queries: &[PersistedQuery],
    ) -> Result<u64, DatastoreError>;
}
