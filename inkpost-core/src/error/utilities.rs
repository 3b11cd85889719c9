use crate::{
    Error,
    error::{StorageError, ValidationError},
};

/// Extension trait for mapping backend errors into inkpost storage errors.
///
/// # Example
///
/// ```rust,ignore
/// use inkpost_core::error::utilities::StorageResultExt;
///
/// query.execute(&pool).await.map_persist_err("Failed to save auth state")?;
/// ```
pub trait StorageResultExt<T> {
    /// Map a failed read or query to [`StorageError::Database`]
    fn map_db_err(self) -> Result<T, Error>;

    /// Map a failed write to [`StorageError::Persistence`] with context
    fn map_persist_err(self, context: &str) -> Result<T, Error>;
}

impl<T, E: std::fmt::Display> StorageResultExt<T> for Result<T, E> {
    fn map_db_err(self) -> Result<T, Error> {
        self.map_err(|e| Error::Storage(StorageError::Database(e.to_string())))
    }

    fn map_persist_err(self, context: &str) -> Result<T, Error> {
        self.map_err(|e| Error::Storage(StorageError::Persistence(format!("{context}: {e}"))))
    }
}

/// Extension trait for Option types to simplify required field validation
///
/// # Example
///
/// ```rust
/// use inkpost_core::error::utilities::RequiredFieldExt;
///
/// let email: Option<String> = Some("admin@example.com".to_string());
/// let email = email.require_field("Admin email").unwrap();
/// assert_eq!(email, "admin@example.com");
/// ```
pub trait RequiredFieldExt<T> {
    /// Convert None to a ValidationError::MissingField
    fn require_field(self, field_name: &str) -> Result<T, ValidationError>;
}

impl<T> RequiredFieldExt<T> for Option<T> {
    fn require_field(self, field_name: &str) -> Result<T, ValidationError> {
        self.ok_or_else(|| ValidationError::MissingField(format!("{field_name} is required")))
    }
}
