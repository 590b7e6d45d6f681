//! Error handling for REST API
//!
//! Provides the `AppError` type used across all REST endpoints.

use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::error::SyncError;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadGateway(String),
    GatewayTimeout(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            AppError::Internal(msg) => {
                // Log full details server-side, return generic message to client
                tracing::error!(details = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred".to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::RemoteListing { .. } | SyncError::UnexpectedShape { .. } => {
                AppError::BadGateway("Failed to load resources from remote storage".into())
            }
            SyncError::Timeout { .. } => {
                AppError::GatewayTimeout("Loading resources took too long".into())
            }
            // Credential problems are an operator issue; keep details in the logs
            SyncError::CredentialMalformed(_) | SyncError::ConfigurationAbsent => {
                AppError::Internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (SyncError::remote("x", "503"), StatusCode::BAD_GATEWAY),
            (SyncError::shape("x", "no files"), StatusCode::BAD_GATEWAY),
            (SyncError::Timeout { root_id: "x".into() }, StatusCode::GATEWAY_TIMEOUT),
            (SyncError::CredentialMalformed("bad".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }
}
