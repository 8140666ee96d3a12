//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its mapping
//! onto HTTP responses.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;
use virality_core::{ports::PortError, service::AnalysisError};

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// A failure reported by the analysis service.
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure while running the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A malformed request the caller can fix.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Analysis(AnalysisError::Unauthorized)
            | ApiError::Port(PortError::Unauthorized) => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized - Please sign in".to_string(),
            ),
            ApiError::Analysis(AnalysisError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Analysis(AnalysisError::BackendUnavailable { endpoint }) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!(
                    "Scoring backend is unavailable. Please ensure it's running at {}",
                    endpoint
                ),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            error!("Request failed: {:?}", self);
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_one_status_each() {
        let cases = [
            (ApiError::Analysis(AnalysisError::Unauthorized), StatusCode::UNAUTHORIZED),
            (
                ApiError::Analysis(AnalysisError::InvalidInput("Content is required".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Analysis(AnalysisError::BackendUnavailable {
                    endpoint: "http://ml".into(),
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::Analysis(AnalysisError::Internal("db down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = ApiError::Analysis(AnalysisError::Internal("password=hunter2".into()));
        let (_, message) = err.status_and_message();
        assert!(!message.contains("hunter2"));
    }

    #[test]
    fn unavailable_message_names_the_endpoint() {
        let (_, message) = ApiError::Analysis(AnalysisError::BackendUnavailable {
            endpoint: "http://ml:8000".into(),
        })
        .status_and_message();
        assert!(message.contains("http://ml:8000"));
    }
}
