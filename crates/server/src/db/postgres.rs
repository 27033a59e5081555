use std::time::Duration;

use api_types::{
    AtlassianAuth, Meeting, Notification, NotificationStatus, Provider, SlackAuth, Task, Team,
    TeamMember, User,
};
use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use super::{
    Datastore, DatastoreError, PersistedQuery, RemovedMember, SocketUpdate, TeamMemberRemoval,
};

const USER_COLUMNS: &str = "id, preferred_name, picture, connected_sockets, tms";
const TEAM_MEMBER_COLUMNS: &str = "id, team_id, user_id, preferred_name, is_lead, is_not_removed";
const TASK_COLUMNS: &str = "id, team_id, user_id, content, tags";
const MEETING_COLUMNS: &str =
    "id, team_id, meeting_type, facilitator_user_id, facilitator_stage_id, ended_at";
const NOTIFICATION_COLUMNS: &str = "id, type, user_id, team_id, status, created_at";

/// Postgres-backed store.
#[derive(Debug, Clone)]
pub struct PgDatastore {
    pool: PgPool,
}

impl PgDatastore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, DatastoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), DatastoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Drain the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Resolve an `UPDATE ... RETURNING` that matched no row into either a
    /// missing user or an unchanged socket set.
    async fn unchanged_or_missing(&self, user_id: &str) -> Result<SocketUpdate, DatastoreError> {
        Ok(match self.get_user(user_id).await? {
            Some(user) => SocketUpdate::Unchanged(user),
            None => SocketUpdate::UserNotFound,
        })
    }
}

#[async_trait]
impl Datastore for PgDatastore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, DatastoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn add_connected_socket(
        &self,
        user_id: &str,
        socket_id: &str,
    ) -> Result<SocketUpdate, DatastoreError> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users
               SET connected_sockets = array_append(connected_sockets, $2)
               WHERE id = $1 AND NOT ($2 = ANY(connected_sockets))
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(user_id)
        .bind(socket_id)
        .fetch_optional(&self.pool)
        .await?;
        match updated {
            Some(user) => Ok(SocketUpdate::Changed(user)),
            None => self.unchanged_or_missing(user_id).await,
        }
    }

    async fn remove_connected_socket(
        &self,
        user_id: &str,
        socket_id: &str,
    ) -> Result<SocketUpdate, DatastoreError> {
        // The guard in WHERE is re-checked against the latest row version when
        // a concurrent update holds the row, so only one disconnect can see
        // the set go empty.
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users
               SET connected_sockets = array_remove(connected_sockets, $2)
               WHERE id = $1 AND $2 = ANY(connected_sockets)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(user_id)
        .bind(socket_id)
        .fetch_optional(&self.pool)
        .await?;
        match updated {
            Some(user) => Ok(SocketUpdate::Changed(user)),
            None => self.unchanged_or_missing(user_id).await,
        }
    }

    async fn flush_connected_sockets(&self) -> Result<u64, DatastoreError> {
        let result = sqlx::query(
            "UPDATE users SET connected_sockets = '{}' WHERE cardinality(connected_sockets) > 0",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn get_team(&self, team_id: &str) -> Result<Option<Team>, DatastoreError> {
        let team = sqlx::query_as::<_, Team>(
            "SELECT id, name, org_id, is_archived FROM teams WHERE id = $1",
        )
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(team)
    }

    async fn get_team_member(
        &self,
        team_member_id: &str,
    ) -> Result<Option<TeamMember>, DatastoreError> {
        let member = sqlx::query_as::<_, TeamMember>(&format!(
            "SELECT {TEAM_MEMBER_COLUMNS} FROM team_members WHERE id = $1"
        ))
        .bind(team_member_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    async fn team_lead(&self, team_id: &str) -> Result<Option<TeamMember>, DatastoreError> {
        let lead = sqlx::query_as::<_, TeamMember>(&format!(
            r#"SELECT {TEAM_MEMBER_COLUMNS} FROM team_members
               WHERE team_id = $1 AND is_lead AND is_not_removed
               LIMIT 1"#
        ))
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lead)
    }

    async fn remove_team_member(
        &self,
        removal: &TeamMemberRemoval,
    ) -> Result<Option<RemovedMember>, DatastoreError> {
        // Any early return drops `tx`, which rolls back every write so far.
        let mut tx = self.pool.begin().await?;
        let team_member = sqlx::query_as::<_, TeamMember>(&format!(
            r#"UPDATE team_members SET is_not_removed = FALSE
               WHERE id = $1 AND is_not_removed
               RETURNING {TEAM_MEMBER_COLUMNS}"#
        ))
        .bind(&removal.team_member_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(team_member) = team_member else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE users SET tms = array_remove(tms, $2) WHERE id = $1")
            .bind(&team_member.user_id)
            .bind(&team_member.team_id)
            .execute(&mut *tx)
            .await?;

        let mut updated_tasks = sqlx::query_as::<_, Task>(&format!(
            r#"UPDATE tasks SET user_id = $3
               WHERE team_id = $1 AND user_id = $2
               RETURNING {TASK_COLUMNS}"#
        ))
        .bind(&team_member.team_id)
        .bind(&team_member.user_id)
        .bind(&removal.reassign_to)
        .fetch_all(&mut *tx)
        .await?;
        updated_tasks.sort_by(|a, b| a.id.cmp(&b.id));

        if let Some(notification) = &removal.notification {
            let inserted = sqlx::query(
                r#"INSERT INTO notifications (id, type, user_id, team_id, status, created_at)
                   VALUES ($1, $2, $3, $4, $5, $6)
                   ON CONFLICT (id) DO NOTHING"#,
            )
            .bind(&notification.id)
            .bind(notification.notification_type)
            .bind(&notification.user_id)
            .bind(&notification.team_id)
            .bind(notification.status)
            .bind(notification.created_at)
            .execute(&mut *tx)
            .await?;
            if inserted.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(DatastoreError::Conflict(format!(
                    "notification {}",
                    notification.id
                )));
            }
        }

        tx.commit().await?;
        Ok(Some(RemovedMember {
            team_member,
            updated_tasks,
        }))
    }

    async fn active_meetings(&self, team_id: &str) -> Result<Vec<Meeting>, DatastoreError> {
        let meetings = sqlx::query_as::<_, Meeting>(&format!(
            r#"SELECT {MEETING_COLUMNS} FROM meetings
               WHERE team_id = $1 AND ended_at IS NULL
               ORDER BY id"#
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(meetings)
    }

    async fn get_notification(
        &self,
        notification_id: &str,
    ) -> Result<Option<Notification>, DatastoreError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(notification)
    }

    async fn update_notification_status(
        &self,
        notification_id: &str,
        status: NotificationStatus,
    ) -> Result<Option<Notification>, DatastoreError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            "UPDATE notifications SET status = $2 WHERE id = $1 RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(notification_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(notification)
    }

    async fn providers_by_team(&self, team_id: &str) -> Result<Vec<Provider>, DatastoreError> {
        let providers = sqlx::query_as::<_, Provider>(
            r#"SELECT id, service, team_id, user_id, is_active, provider_user_name
               FROM providers WHERE team_id = $1 ORDER BY id"#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(providers)
    }

    async fn slack_auths_by_user(&self, user_id: &str) -> Result<Vec<SlackAuth>, DatastoreError> {
        let auths = sqlx::query_as::<_, SlackAuth>(
            r#"SELECT id, team_id, user_id, slack_team_name, is_active
               FROM slack_auths WHERE user_id = $1 ORDER BY id"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(auths)
    }

    async fn atlassian_auth(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> Result<Option<AtlassianAuth>, DatastoreError> {
        let auth = sqlx::query_as::<_, AtlassianAuth>(
            r#"SELECT team_id, user_id, access_token, cloud_ids, expires_at
               FROM atlassian_auths WHERE team_id = $1 AND user_id = $2"#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(auth)
    }

    async fn upsert_persisted_queries(
        &self,
        queries: &[PersistedQuery],
    ) -> Result<u64, DatastoreError> {
        if queries.is_empty() {
            return Ok(0);
        }
        let (ids, documents): (Vec<String>, Vec<String>) = queries
            .iter()
            .map(|query| (query.id.clone(), query.query.clone()))
            .unzip();
        let result = sqlx::query(
            r#"INSERT INTO query_map (id, query)
               SELECT * FROM UNNEST($1::text[], $2::text[])
               ON CONFLICT (id) DO UPDATE SET query = EXCLUDED.query"#,
        )
        .bind(&ids)
        .bind(&documents)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
