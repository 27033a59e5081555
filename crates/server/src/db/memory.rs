use std::sync::atomic::{AtomicUsize, Ordering};

use api_types::{
    AtlassianAuth, Meeting, Notification, NotificationStatus, Provider, SlackAuth, Task, Team,
    TeamMember, User,
};
use async_trait::async_trait;
use dashmap::DashMap;

use super::{
    Datastore, DatastoreError, PersistedQuery, RemovedMember, SocketUpdate, TeamMemberRemoval,
};

/// In-process store backed by `DashMap`s.
///
/// Socket updates hold the user's shard lock for the whole read-modify-read,
/// which gives the same per-row atomicity the Postgres store gets from a
/// single `UPDATE ... RETURNING`.
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    users: DashMap<String, User>,
    teams: DashMap<String, Team>,
    team_members: DashMap<String, TeamMember>,
    tasks: DashMap<String, Task>,
    meetings: DashMap<String, Meeting>,
    notifications: DashMap<String, Notification>,
    providers: DashMap<String, Provider>,
    slack_auths: DashMap<String, SlackAuth>,
    atlassian_auths: DashMap<(String, String), AtlassianAuth>,
    query_map: DashMap<String, String>,
    slack_auth_loads: AtomicUsize,
    atlassian_auth_loads: AtomicUsize,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn insert_team(&self, team: Team) {
        self.teams.insert(team.id.clone(), team);
    }

    pub fn insert_team_member(&self, team_member: TeamMember) {
        self.team_members
            .insert(team_member.id.clone(), team_member);
    }

    pub fn insert_task(&self, task: Task) {
        self.tasks.insert(task.id.clone(), task);
    }

    pub fn insert_meeting(&self, meeting: Meeting) {
        self.meetings.insert(meeting.id.clone(), meeting);
    }

    pub fn insert_provider(&self, provider: Provider) {
        self.providers.insert(provider.id.clone(), provider);
    }

    pub fn insert_slack_auth(&self, auth: SlackAuth) {
        self.slack_auths.insert(auth.id.clone(), auth);
    }

    pub fn insert_atlassian_auth(&self, auth: AtlassianAuth) {
        self.atlassian_auths
            .insert((auth.team_id.clone(), auth.user_id.clone()), auth);
    }

    pub fn insert_notification(&self, notification: Notification) {
        self.notifications
            .insert(notification.id.clone(), notification);
    }

    pub fn team_member(&self, team_member_id: &str) -> Option<TeamMember> {
        self.team_members
            .get(team_member_id)
            .map(|member| member.clone())
    }

    pub fn task(&self, task_id: &str) -> Option<Task> {
        self.tasks.get(task_id).map(|task| task.clone())
    }

    pub fn notifications_for(&self, user_id: &str) -> Vec<Notification> {
        self.notifications
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.clone())
            .collect()
    }

    pub fn persisted_query(&self, id: &str) -> Option<String> {
        self.query_map.get(id).map(|query| query.clone())
    }

    /// Number of times the store served a Slack auth lookup.
    pub fn slack_auth_loads(&self) -> usize {
        self.slack_auth_loads.load(Ordering::SeqCst)
    }

    /// Number of times the store served an Atlassian auth lookup.
    pub fn atlassian_auth_loads(&self) -> usize {
        self.atlassian_auth_loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, DatastoreError> {
        Ok(self.users.get(user_id).map(|user| user.clone()))
    }

    async fn add_connected_socket(
        &self,
        user_id: &str,
        socket_id: &str,
    ) -> Result<SocketUpdate, DatastoreError> {
        let Some(mut user) = self.users.get_mut(user_id) else {
            return Ok(SocketUpdate::UserNotFound);
        };
        if user.connected_sockets.iter().any(|id| id == socket_id) {
            return Ok(SocketUpdate::Unchanged(user.clone()));
        }
        user.connected_sockets.push(socket_id.to_string());
        Ok(SocketUpdate::Changed(user.clone()))
    }

    async fn remove_connected_socket(
        &self,
        user_id: &str,
        socket_id: &str,
    ) -> Result<SocketUpdate, DatastoreError> {
        let Some(mut user) = self.users.get_mut(user_id) else {
            return Ok(SocketUpdate::UserNotFound);
        };
        let before = user.connected_sockets.len();
        user.connected_sockets.retain(|id| id != socket_id);
        if user.connected_sockets.len() == before {
            Ok(SocketUpdate::Unchanged(user.clone()))
        } else {
            Ok(SocketUpdate::Changed(user.clone()))
        }
    }

    async fn flush_connected_sockets(&self) -> Result<u64, DatastoreError> {
        let mut flushed = 0;
        for mut user in self.users.iter_mut() {
            if !user.connected_sockets.is_empty() {
                user.connected_sockets.clear();
                flushed += 1;
            }
        }
        Ok(flushed)
    }

    async fn get_team(&self, team_id: &str) -> Result<Option<Team>, DatastoreError> {
        Ok(self.teams.get(team_id).map(|team| team.clone()))
    }

    async fn get_team_member(
        &self,
        team_member_id: &str,
    ) -> Result<Option<TeamMember>, DatastoreError> {
        Ok(self
            .team_members
            .get(team_member_id)
            .map(|member| member.clone()))
    }

    async fn team_lead(&self, team_id: &str) -> Result<Option<TeamMember>, DatastoreError> {
        Ok(self
            .team_members
            .iter()
            .find(|member| member.team_id == team_id && member.is_lead && member.is_not_removed)
            .map(|member| member.clone()))
    }

    async fn remove_team_member(
        &self,
        removal: &TeamMemberRemoval,
    ) -> Result<Option<RemovedMember>, DatastoreError> {
        // The member guard is held until every write is done, so a second
        // removal of the same member waits and then sees it removed.
        let Some(mut member) = self.team_members.get_mut(&removal.team_member_id) else {
            return Ok(None);
        };
        if !member.is_not_removed {
            return Ok(None);
        }
        // Everything that can fail is checked before the first write.
        if let Some(notification) = &removal.notification {
            if self.notifications.contains_key(&notification.id) {
                return Err(DatastoreError::Conflict(format!(
                    "notification {}",
                    notification.id
                )));
            }
        }

        member.is_not_removed = false;
        if let Some(mut user) = self.users.get_mut(&member.user_id) {
            user.tms.retain(|team_id| team_id != &member.team_id);
        }
        let mut updated_tasks = Vec::new();
        for mut task in self.tasks.iter_mut() {
            if task.team_id == member.team_id && task.user_id.as_deref() == Some(&member.user_id) {
                task.user_id = Some(removal.reassign_to.clone());
                updated_tasks.push(task.clone());
            }
        }
        updated_tasks.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(notification) = &removal.notification {
            self.notifications
                .insert(notification.id.clone(), notification.clone());
        }

        Ok(Some(RemovedMember {
            team_member: member.clone(),
            updated_tasks,
        }))
    }

    async fn active_meetings(&self, team_id: &str) -> Result<Vec<Meeting>, DatastoreError> {
        let mut meetings: Vec<Meeting> = self
            .meetings
            .iter()
            .filter(|meeting| meeting.team_id == team_id && meeting.is_active())
            .map(|meeting| meeting.clone())
            .collect();
        meetings.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(meetings)
    }

    async fn get_notification(
        &self,
        notification_id: &str,
    ) -> Result<Option<Notification>, DatastoreError> {
        Ok(self
            .notifications
            .get(notification_id)
            .map(|notification| notification.clone()))
    }

    async fn update_notification_status(
        &self,
        notification_id: &str,
        status: NotificationStatus,
    ) -> Result<Option<Notification>, DatastoreError> {
        Ok(self
            .notifications
            .get_mut(notification_id)
            .map(|mut notification| {
                notification.status = status;
                notification.clone()
            }))
    }

    async fn providers_by_team(&self, team_id: &str) -> Result<Vec<Provider>, DatastoreError> {
        let mut providers: Vec<Provider> = self
            .providers
            .iter()
            .filter(|provider| provider.team_id == team_id)
            .map(|provider| provider.clone())
            .collect();
        providers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(providers)
    }

    async fn slack_auths_by_user(&self, user_id: &str) -> Result<Vec<SlackAuth>, DatastoreError> {
        self.slack_auth_loads.fetch_add(1, Ordering::SeqCst);
        let mut auths: Vec<SlackAuth> = self
            .slack_auths
            .iter()
            .filter(|auth| auth.user_id == user_id)
            .map(|auth| auth.clone())
            .collect();
        auths.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(auths)
    }

    async fn atlassian_auth(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> Result<Option<AtlassianAuth>, DatastoreError> {
        self.atlassian_auth_loads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .atlassian_auths
            .get(&(team_id.to_string(), user_id.to_string()))
            .map(|auth| auth.clone()))
    }

    async fn upsert_persisted_queries(
        &self,
        queries: &[PersistedQuery],
    ) -> Result<u64, DatastoreError> {
        for query in queries {
            self.query_map.insert(query.id.clone(), query.query.clone());
        }
        Ok(queries.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(sockets: &[&str]) -> User {
        User {
            id: "u1".to_string(),
            preferred_name: "Ada".to_string(),
            picture: None,
            connected_sockets: sockets.iter().map(|s| s.to_string()).collect(),
            tms: vec!["t1".to_string()],
        }
    }

    #[tokio::test]
    async fn socket_updates_report_whether_the_set_changed() {
        let db = MemoryDatastore::new();
        db.insert_user(user(&["s1"]));

        let added = db.add_connected_socket("u1", "s2").await.unwrap();
        assert!(matches!(added, SocketUpdate::Changed(ref u) if u.connected_sockets == ["s1", "s2"]));

        let again = db.add_connected_socket("u1", "s2").await.unwrap();
        assert!(matches!(again, SocketUpdate::Unchanged(_)));

        let missing = db.remove_connected_socket("u1", "nope").await.unwrap();
        assert!(matches!(missing, SocketUpdate::Unchanged(ref u) if u.connected_sockets.len() == 2));

        let removed = db.remove_connected_socket("u1", "s1").await.unwrap();
        assert!(matches!(removed, SocketUpdate::Changed(ref u) if u.connected_sockets == ["s2"]));

        assert_eq!(
            db.remove_connected_socket("ghost", "s1").await.unwrap(),
            SocketUpdate::UserNotFound
        );
    }

    #[tokio::test]
    async fn flush_only_counts_connected_users() {
        let db = MemoryDatastore::new();
        db.insert_user(user(&["s1", "s2"]));
        db.insert_user(User {
            id: "u2".to_string(),
            ..user(&[])
        });

        assert_eq!(db.flush_connected_sockets().await.unwrap(), 1);
        let u1 = db.get_user("u1").await.unwrap().unwrap();
        assert!(u1.connected_sockets.is_empty());
    }

    fn seed_team(db: &MemoryDatastore) {
        db.insert_user(User {
            id: "u2".to_string(),
            tms: vec!["t1".to_string(), "t2".to_string()],
            ..user(&[])
        });
        db.insert_team_member(TeamMember {
            id: "u2::t1".to_string(),
            team_id: "t1".to_string(),
            user_id: "u2".to_string(),
            preferred_name: "Two".to_string(),
            is_lead: false,
            is_not_removed: true,
            is_connected: false,
        });
        for (id, team_id) in [("task1", "t1"), ("task2", "t2")] {
            db.insert_task(Task {
                id: id.to_string(),
                team_id: team_id.to_string(),
                user_id: Some("u2".to_string()),
                content: String::new(),
                tags: Vec::new(),
            });
        }
    }

    fn kicked_out(id: &str) -> Notification {
        Notification {
            id: id.to_string(),
            notification_type: api_types::NotificationType::KickedOut,
            user_id: "u2".to_string(),
            team_id: Some("t1".to_string()),
            status: NotificationStatus::Unread,
            created_at: chrono::Utc::now(),
        }
    }

    fn removal(notification_id: &str) -> TeamMemberRemoval {
        TeamMemberRemoval {
            team_member_id: "u2::t1".to_string(),
            reassign_to: "u1".to_string(),
            notification: Some(kicked_out(notification_id)),
        }
    }

    #[tokio::test]
    async fn removal_applies_every_write() {
        let db = MemoryDatastore::new();
        seed_team(&db);

        let removed = db.remove_team_member(&removal("n1")).await.unwrap().unwrap();
        assert!(!removed.team_member.is_not_removed);
        assert_eq!(removed.updated_tasks.len(), 1);
        assert_eq!(removed.updated_tasks[0].id, "task1");
        assert_eq!(db.task("task1").unwrap().user_id.as_deref(), Some("u1"));
        assert_eq!(db.task("task2").unwrap().user_id.as_deref(), Some("u2"));
        assert_eq!(db.get_user("u2").await.unwrap().unwrap().tms, ["t2"]);
        assert_eq!(db.notifications_for("u2").len(), 1);

        assert_eq!(db.remove_team_member(&removal("n2")).await.unwrap(), None);
        assert_eq!(db.notifications_for("u2").len(), 1);
    }

    #[tokio::test]
    async fn failed_removal_leaves_no_partial_writes() {
        let db = MemoryDatastore::new();
        seed_team(&db);
        db.insert_notification(kicked_out("n1"));

        let result = db.remove_team_member(&removal("n1")).await;
        assert!(matches!(result, Err(DatastoreError::Conflict(_))));

        assert!(db.team_member("u2::t1").unwrap().is_not_removed);
        assert_eq!(db.task("task1").unwrap().user_id.as_deref(), Some("u2"));
        assert_eq!(db.get_user("u2").await.unwrap().unwrap().tms, ["t1", "t2"]);
        assert_eq!(db.notifications_for("u2").len(), 1);
    }
}
