use std::time::Duration;

use thiserror::Error;

/// Errors raised by storage backends. Every backend trait in this module reports failures with this type.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The storage call did not complete within {0:?}")]
    Timeout(Duration),
    #[error("The requested {0} does not exist")]
    NotFound(String),
    #[error("Cannot complete the request because it conflicts with existing data: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref de) if de.is_unique_violation() => StoreError::Conflict(de.to_string()),
            _ => StoreError::DatabaseError(e.to_string()),
        }
    }
}
