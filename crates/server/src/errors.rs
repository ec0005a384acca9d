use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::Envelope;
use service::directory::Reply;
use service::DirectoryError;
use thiserror::Error;
use tracing::{debug, error};

/// Directory failure rendered as `{ok:false, error}` with its status code.
#[derive(Debug)]
pub struct ApiError(pub DirectoryError);

impl From<DirectoryError> for ApiError {
    fn from(e: DirectoryError) -> Self { Self(e) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        // internal detail stays in the logs
        let msg = if self.0.is_internal() {
            error!(kind = self.0.kind(), error = %self.0, "directory request failed");
            match self.0 {
                DirectoryError::Storage(_) => "storage unavailable".to_string(),
                _ => "internal error".to_string(),
            }
        } else {
            debug!(kind = self.0.kind(), error = %self.0, "directory request rejected");
            self.0.to_string()
        };
        (status, Json(Envelope::<()>::failure(msg))).into_response()
    }
}

/// Successful directory reply rendered as `{ok:true, data}`.
#[derive(Debug)]
pub struct ApiReply(pub Reply);

impl IntoResponse for ApiReply {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::OK);
        (status, Json(Envelope::success(self.0.data))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("storage initialisation failed: {0}")]
    Storage(#[from] DirectoryError),
}
