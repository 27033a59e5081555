//! HTTP transport for mutations and integration lookups.

use std::{sync::Once, time::Duration};

use api_types::TeamMemberIntegrations;
use reqwest::{
    Client, StatusCode,
    header::{AUTHORIZATION, HeaderValue},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const REMOVE_TEAM_MEMBER_PATH: &str = "/v1/mutations/remove_team_member";
pub const SET_NOTIFICATION_STATUS_PATH: &str = "/v1/mutations/set_notification_status";
pub const MUTATOR_ID_HEADER: &str = "x-mutator-id";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static INSTALL_CRYPTO_PROVIDER: Once = Once::new();

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error("invalid auth token header")]
    InvalidToken,
    #[error("server responded {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("no API client configured")]
    NotConnected,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    auth_token: SecretString,
}

impl ApiClient {
    pub fn new(base_url: &str, auth_token: SecretString) -> Result<Self, ClientError> {
        INSTALL_CRYPTO_PROVIDER.call_once(|| {
            // Another component may have installed one already.
            let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        });
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("meeting-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            auth_token,
        })
    }

    fn bearer(&self) -> Result<HeaderValue, ClientError> {
        let mut value =
            HeaderValue::from_str(&format!("Bearer {}", self.auth_token.expose_secret()))
                .map_err(|_| ClientError::InvalidToken)?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// POST a mutation request. `mutator_id` is this client's socket id so the
    /// resulting broadcast can be recognised as an echo.
    pub async fn mutate<Req, Payload>(
        &self,
        path: &str,
        request: &Req,
        mutator_id: Option<&str>,
    ) -> Result<Payload, ClientError>
    where
        Req: Serialize + ?Sized,
        Payload: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;
        let mut builder = self
            .http
            .post(url)
            .header(AUTHORIZATION, self.bearer()?)
            .json(request);
        if let Some(mutator_id) = mutator_id {
            builder = builder.header(MUTATOR_ID_HEADER, mutator_id);
        }
        debug!(path, "sending mutation");
        let response = builder.send().await?;
        Self::decode(response).await
    }

    pub async fn team_member_integrations(
        &self,
        team_member_id: &str,
    ) -> Result<Option<TeamMemberIntegrations>, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .clear()
            .extend(["v1", "team_members", team_member_id, "integrations"]);
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, self.bearer()?)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error.message)
            .unwrap_or(text);
        warn!(%status, %message, "request failed");
        Err(ClientError::Api { status, message })
    }
}
