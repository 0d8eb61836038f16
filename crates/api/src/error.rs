//! Error types for the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use gateway::GatewayError;
use pipeline::PipelineError;
use thiserror::Error;

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Sync or send failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Direct storage access failed.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// The requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request body or query is malformed.
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Pipeline(err) => pipeline_status(err),
            ApiError::Database(err) => database_status(err),
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

fn pipeline_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
        PipelineError::UnknownChat(_)
        | PipelineError::UnknownMessage(_)
        | PipelineError::UnknownWorkspace(_) => StatusCode::NOT_FOUND,
        PipelineError::UnboundAccount(_)
        | PipelineError::NoWorkspace(_)
        | PipelineError::AlreadyBound { .. }
        | PipelineError::Transition(_) => StatusCode::CONFLICT,
        PipelineError::Gateway(GatewayError::NotFound { .. }) => StatusCode::NOT_FOUND,
        PipelineError::Gateway(_) => StatusCode::BAD_GATEWAY,
        PipelineError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        PipelineError::Database(err) => database_status(err),
        PipelineError::Encoding(_) | PipelineError::Unrecorded { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn database_status(err: &DatabaseError) -> StatusCode {
    match err {
        DatabaseError::NotFound { .. } => StatusCode::NOT_FOUND,
        DatabaseError::AlreadyExists { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %message, "Request rejected");
        }

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use pipeline::ValidationError;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (
                PipelineError::Validation(ValidationError::EmptyMessage).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                PipelineError::UnknownChat("c1".into()).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                PipelineError::UnboundAccount("acct".into()).into(),
                StatusCode::CONFLICT,
            ),
            (
                PipelineError::NoWorkspace("acct".into()).into(),
                StatusCode::CONFLICT,
            ),
            (
                PipelineError::Gateway(GatewayError::Unreachable("down".into())).into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                PipelineError::Gateway(GatewayError::NotFound {
                    entity: "account",
                    id: "x".into(),
                })
                .into(),
                StatusCode::NOT_FOUND,
            ),
            (
                PipelineError::Timeout {
                    operation: "list_chats",
                    after: Duration::from_secs(1),
                }
                .into(),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                DatabaseError::AlreadyExists {
                    entity: "workspace",
                    id: "ws".into(),
                }
                .into(),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::BadRequest("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{}", err);
        }
    }
}
