use thiserror::Error;

pub type Result<T> = std::result::Result<T, SafetyError>;

#[derive(Debug, Error)]
pub enum SafetyError {
    #[error("Request has no session")]
    MissingSession,

    #[error("Session key {0} is recorded for another user")]
    SessionKeyConflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] safety_database::DatabaseError),

    #[error("Cache error: {0}")]
    CacheError(#[from] safety_cache::CacheError),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl From<validator::ValidationErrors> for SafetyError {
    fn from(err: validator::ValidationErrors) -> Self {
        SafetyError::ValidationError(err.to_string())
    }
}

impl From<config::ConfigError> for SafetyError {
    fn from(err: config::ConfigError) -> Self {
        SafetyError::ConfigurationError(err.to_string())
    }
}
