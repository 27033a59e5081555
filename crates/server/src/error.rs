use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{auth::AuthError, db::DatastoreError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Unauthorized(#[from] AuthError),
    #[error(transparent)]
    Datastore(#[from] DatastoreError),
    /// Failure shared by every caller coalesced onto one loader call.
    #[error(transparent)]
    Loader(#[from] Arc<DatastoreError>),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err.to_string()),
            ApiError::Datastore(_) | ApiError::Loader(_) => {
                error!(error = %self, "datastore failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": { "message": message } }))).into_response()
    }
}
