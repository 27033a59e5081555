//! Client side of the meeting app: a normalized record cache, the updaters
//! that reconcile mutation payloads into it, and the handlers for realtime
//! events.

pub mod api;
pub mod atmosphere;
pub mod handlers;
pub mod history;
pub mod mutations;
pub mod routes;
pub mod store;
pub mod subscriptions;

pub use api::{ApiClient, ClientError};
pub use atmosphere::{Atmosphere, AtmosphereEvent, Snackbar, SnackbarAction, SnackbarCommand};
pub use history::{History, MemoryHistory};
pub use store::{RecordStore, Table, Viewer};
pub use subscriptions::{Outcome, SubscriptionHandler};
