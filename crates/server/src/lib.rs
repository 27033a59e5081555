//! Realtime meeting server: socket presence, team mutations and integration
//! resolvers over axum.

use std::sync::Arc;

use axum::Router;

pub mod auth;
pub mod channels;
pub mod config;
pub mod db;
pub mod error;
pub mod integrations;
pub mod mutation_def;
pub mod mutations;
pub mod publish;
pub mod routes;

use auth::AuthKeys;
use config::Config;
use db::Datastore;
use integrations::Loaders;
use publish::PubSub;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Datastore>,
    pub pubsub: Arc<PubSub>,
    pub auth: Arc<AuthKeys>,
    pub loaders: Arc<Loaders>,
}

impl AppState {
    pub fn new(config: &Config, db: Arc<dyn Datastore>) -> Self {
        Self {
            pubsub: Arc::new(PubSub::new(config.topic_capacity)),
            auth: Arc::new(AuthKeys::from_secret(&config.server_secret)),
            loaders: Arc::new(Loaders::new(db.clone(), config.loader_ttl)),
            db,
        }
    }
}

pub fn app(state: AppState) -> Router {
    routes::router(state)
}
