use std::error::Error;
use std::fmt;

/// Crate-wide error type, written out by hand without `thiserror`.
#[derive(Debug)]
pub enum AppError {
    /// A named template set or theme does not exist.
    NotFound(String),
    /// A mutation matched no rows.
    NoRowsAffected(String),
    /// The database could not be reached, even after retrying.
    ConnectionError(String),
    /// The cache refresh call failed or the forum reported a failure.
    RefreshError(String),
    /// The forum answered with something that is not the expected JSON.
    InvalidResponse(String),
    DatabaseError(String),
    FileError(String),
    ConfigError(String),
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::NoRowsAffected(msg) => write!(f, "No rows affected: {}", msg),
            AppError::ConnectionError(msg) => write!(f, "Database connection failed: {}", msg),
            AppError::RefreshError(msg) => write!(f, "Cache refresh failed: {}", msg),
            AppError::InvalidResponse(msg) => write!(f, "Invalid response from forum: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database operation failed: {}", msg),
            AppError::FileError(msg) => write!(f, "File operation failed: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl Error for AppError {}

/// Custom Result type that uses `AppError`.
pub type Result<T, E = AppError> = std::result::Result<T, E>;
