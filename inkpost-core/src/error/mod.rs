pub mod utilities;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Login outcomes expressed as errors, for callers that prefer `?`.
///
/// These are expected, user-facing results of a login attempt. They are never
/// logged as failures of the system itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials, {remaining_attempts} attempts remaining")]
    InvalidCredentials { remaining_attempts: u32 },

    #[error("Too many login attempts, try again in {retry_after_seconds} seconds")]
    LockedOut { retry_after_seconds: i64 },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    /// A write to durable storage did not complete. The operation that
    /// triggered it is indeterminate and should be retried by the user.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid client key: {0}")]
    InvalidClientKey(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl Error {
    /// Whether this is one of the expected login outcomes rather than a fault.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Error::Auth(AuthError::InvalidCredentials { .. }) | Error::Auth(AuthError::LockedOut { .. })
        )
    }

    pub fn is_persistence_error(&self) -> bool {
        matches!(self, Error::Storage(StorageError::Persistence(_)))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_session_error(&self) -> bool {
        matches!(self, Error::Session(_))
    }
}
