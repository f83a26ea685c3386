pub mod admin;
pub mod health;

use axum::{http::StatusCode, Json};
use safety_auth::SafetyError;
use safety_database::DatabaseError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(err: SafetyError) -> ApiError {
    let (status, code) = match &err {
        SafetyError::MissingSession | SafetyError::ValidationError(_) => {
            (StatusCode::BAD_REQUEST, "invalid_request")
        }
        SafetyError::SessionKeyConflict(_) => (StatusCode::CONFLICT, "session_key_conflict"),
        SafetyError::DatabaseError(DatabaseError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
        SafetyError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
        SafetyError::CacheError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "cache_error"),
        SafetyError::ConfigurationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
    };

    // Server-side details stay in the log
    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
        return (status, Json(ErrorResponse::new(code, "Internal server error")));
    }
    (status, Json(ErrorResponse::new(code, &err.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_hide_details() {
        let err = SafetyError::DatabaseError(DatabaseError::Internal(
            "relation \"safety_sessions\" does not exist".to_string(),
        ));
        let (status, Json(body)) = error_response(err);

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "database_error");
        assert_eq!(body.message, "Internal server error");
    }

    #[test]
    fn test_client_errors_keep_message() {
        let (status, Json(body)) = error_response(SafetyError::SessionKeyConflict("sk-abc".to_string()));
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.message.contains("sk-abc"));

        let (status, _) = error_response(SafetyError::DatabaseError(DatabaseError::not_found("Session", "7")));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
