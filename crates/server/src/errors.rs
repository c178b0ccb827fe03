use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by HTTP handlers and middleware.
///
/// Serialized as `{"type", "message", "details"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("{0}")]
    Unauthorized(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Service(e) => match e {
                ServiceError::Validation { .. } => StatusCode::BAD_REQUEST,
                ServiceError::NotAllowed(_) => StatusCode::FORBIDDEN,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Duplicate(_) | ServiceError::InvalidState { .. } => StatusCode::CONFLICT,
                ServiceError::Corrupt(_)
                | ServiceError::Db(_)
                | ServiceError::Migration(_)
                | ServiceError::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "NotAllowedError",
            ApiError::Service(e) => e.name(),
        }
    }

    fn details(&self, status: StatusCode) -> Value {
        let mut details = match self {
            ApiError::Service(ServiceError::Validation { validator, errors }) => {
                json!({"validator": validator, "errors": errors})
            }
            ApiError::Service(ServiceError::InvalidState { expected, actual, .. }) => {
                json!({"expected": expected, "actual": actual})
            }
            _ => json!({}),
        };
        details["httpStatusCode"] = json!(status.as_u16());
        details["public"] = json!(true);
        details
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            "An unexpected error occurred.".to_string()
        } else {
            self.to_string()
        };
        let body = json!({"type": self.name(), "message": message, "details": self.details(status)});
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
