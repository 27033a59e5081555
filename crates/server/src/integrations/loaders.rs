//! Batched, cached lookups shared across concurrent requests.
//!
//! Concurrent loads for the same key are coalesced into one store call by
//! `moka`; results live for the configured TTL.

use std::{sync::Arc, time::Duration};

use api_types::{AtlassianAuth, SlackAuth};
use chrono::Utc;
use moka::future::Cache;

use crate::db::{Datastore, DatastoreError};

const MAX_ENTRIES: u64 = 10_000;

pub struct Loaders {
    db: Arc<dyn Datastore>,
    fresh_atlassian_auth: Cache<(String, String), Option<AtlassianAuth>>,
    slack_auth_by_user_id: Cache<String, Arc<Vec<SlackAuth>>>,
}

impl Loaders {
    pub fn new(db: Arc<dyn Datastore>, ttl: Duration) -> Self {
        Self {
            db,
            fresh_atlassian_auth: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
            slack_auth_by_user_id: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Atlassian grant for a team member. Expired grants load as `None`.
    pub async fn fresh_atlassian_auth(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> Result<Option<AtlassianAuth>, Arc<DatastoreError>> {
        let key = (team_id.to_string(), user_id.to_string());
        self.fresh_atlassian_auth
            .try_get_with(key, async {
                let auth = self.db.atlassian_auth(team_id, user_id).await?;
                Ok::<_, DatastoreError>(auth.filter(|auth| !auth.is_expired(Utc::now())))
            })
            .await
    }

    pub async fn slack_auth_by_user_id(
        &self,
        user_id: &str,
    ) -> Result<Arc<Vec<SlackAuth>>, Arc<DatastoreError>> {
        self.slack_auth_by_user_id
            .try_get_with(user_id.to_string(), async {
                Ok::<_, DatastoreError>(Arc::new(self.db.slack_auths_by_user(user_id).await?))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::db::MemoryDatastore;

    fn slack(id: &str, team_id: &str) -> SlackAuth {
        SlackAuth {
            id: id.to_string(),
            team_id: team_id.to_string(),
            user_id: "u1".to_string(),
            slack_team_name: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn concurrent_loads_hit_the_store_once() {
        let db = Arc::new(MemoryDatastore::new());
        db.insert_slack_auth(slack("a1", "t1"));
        let loaders = Loaders::new(db.clone(), Duration::from_secs(60));

        let (a, b) = tokio::join!(
            loaders.slack_auth_by_user_id("u1"),
            loaders.slack_auth_by_user_id("u1")
        );
        assert_eq!(a.unwrap().len(), 1);
        assert_eq!(b.unwrap().len(), 1);
        loaders.slack_auth_by_user_id("u1").await.unwrap();
        assert_eq!(db.slack_auth_loads(), 1);
    }

    #[tokio::test]
    async fn expired_atlassian_grants_are_not_fresh() {
        let db = Arc::new(MemoryDatastore::new());
        db.insert_atlassian_auth(AtlassianAuth {
            team_id: "t1".to_string(),
            user_id: "u1".to_string(),
            access_token: "secret".to_string(),
            cloud_ids: vec![],
            expires_at: Utc::now() - ChronoDuration::minutes(1),
        });
        let loaders = Loaders::new(db, Duration::from_secs(60));

        assert_eq!(loaders.fresh_atlassian_auth("t1", "u1").await.unwrap(), None);
    }
}
