//! Client environment handed to updaters and side channels: the viewer,
//! this client's socket id, a UI event bus and the API transport.

use api_types::SetNotificationStatusRequest;
use tokio::sync::broadcast;
use tracing::trace;

use crate::{
    api::{ApiClient, ClientError},
    mutations::set_notification_status::commit_set_notification_status,
    store::RecordStore,
};

const EVENT_CAPACITY: usize = 64;

/// Work a snackbar button performs when clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnackbarCommand {
    SetNotificationStatus(SetNotificationStatusRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnackbarAction {
    pub label: String,
    pub command: SnackbarCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snackbar {
    /// Snackbars with the same key replace each other.
    pub key: String,
    /// Seconds before the snackbar hides itself.
    pub auto_dismiss: Option<u32>,
    pub message: String,
    pub action: Option<SnackbarAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtmosphereEvent {
    AddSnackbar(Snackbar),
}

#[derive(Debug)]
pub struct Atmosphere {
    viewer_id: String,
    socket_id: Option<String>,
    events: broadcast::Sender<AtmosphereEvent>,
    api: Option<ApiClient>,
}

impl Atmosphere {
    pub fn new(viewer_id: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            viewer_id: viewer_id.into(),
            socket_id: None,
            events,
            api: None,
        }
    }

    pub fn with_api(mut self, api: ApiClient) -> Self {
        self.api = Some(api);
        self
    }

    /// Record the id the server assigned to this client's socket.
    pub fn set_socket_id(&mut self, socket_id: impl Into<String>) {
        self.socket_id = Some(socket_id.into());
    }

    pub fn viewer_id(&self) -> &str {
        &self.viewer_id
    }

    pub fn socket_id(&self) -> Option<&str> {
        self.socket_id.as_deref()
    }

    pub fn api(&self) -> Result<&ApiClient, ClientError> {
        self.api.as_ref().ok_or(ClientError::NotConnected)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AtmosphereEvent> {
        self.events.subscribe()
    }

    pub fn emit(&self, event: AtmosphereEvent) {
        if self.events.send(event).is_err() {
            trace!("no atmosphere listeners");
        }
    }

    /// Run the command behind a clicked snackbar button.
    pub async fn activate(
        &self,
        action: &SnackbarAction,
        store: &mut RecordStore,
    ) -> Result<(), ClientError> {
        match &action.command {
            SnackbarCommand::SetNotificationStatus(request) => {
                commit_set_notification_status(self, store, request).await?;
            }
        }
        Ok(())
    }
}
