//! Error types for idrec-svc
//!
//! Two kinds of failure leave the reconciler: a caller mistake, surfaced
//! verbatim with 400, and a store failure, logged and reported as a generic
//! 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Message returned when neither identifier is supplied
pub const MISSING_IDENTIFIER: &str = "At least one of email or phoneNumber must be provided";

/// Reconciler error
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// User-correctable input problem
    #[error("{0}")]
    Validation(String),

    /// Contact store failure, passed through uninterpreted
    #[error("Store error: {0}")]
    Store(#[from] idrec_common::Error),
}

/// Convenience Result type using ReconcileError
pub type Result<T> = std::result::Result<T, ReconcileError>;

impl IntoResponse for ReconcileError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ReconcileError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ReconcileError::Store(e) => {
                error!("Identify request failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = ReconcileError::Validation(MISSING_IDENTIFIER.to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_error_maps_to_internal_error() {
        let err = ReconcileError::from(idrec_common::Error::Internal("disk on fire".into()));
        assert!(err.to_string().contains("disk on fire"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
