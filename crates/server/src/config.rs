use std::time::Duration;

use secrecy::SecretString;
use utils::env::{self, EnvError};

use crate::publish::DEFAULT_TOPIC_CAPACITY;

/// Server configuration, read from the environment at startup.
#[derive(Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// When unset the server runs against the in-memory datastore.
    pub database_url: Option<String>,
    pub max_db_connections: u32,
    pub server_secret: SecretString,
    /// How long loader results stay cached.
    pub loader_ttl: Duration,
    pub topic_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, EnvError> {
        Ok(Self {
            host: env::optional("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: env::parse_or("PORT", 3000)?,
            database_url: env::optional("DATABASE_URL"),
            max_db_connections: env::parse_or("MAX_DB_CONNECTIONS", 10)?,
            server_secret: SecretString::from(env::required("SERVER_SECRET")?),
            loader_ttl: Duration::from_secs(env::parse_or("LOADER_TTL_SECS", 5)?),
            topic_capacity: env::parse_or("TOPIC_CAPACITY", DEFAULT_TOPIC_CAPACITY)?,
        })
    }

    /// Configuration for tests: in-memory store, fixed secret.
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: None,
            max_db_connections: 1,
            server_secret: SecretString::from("test-secret".to_string()),
            loader_ttl: Duration::from_secs(5),
            topic_capacity: 16,
        }
    }
}
