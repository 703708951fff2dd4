//! Database error types
//!
//! This module defines the error types that can occur during database operations,
//! providing meaningful error messages and proper error chaining.

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur during database operations
///
/// This enum captures all possible database-related errors, including
/// connection issues, query failures, and constraint violations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A concurrent writer invalidated this transaction
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored value could not be mapped to a domain value
    #[error("Invalid stored value: {0}")]
    InvalidData(String),

    /// Generic SQL error
    #[error("SQL error: {0}")]
    SqlError(sqlx::Error),
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    ///
    /// # Arguments
    ///
    /// * `entity` - The type of entity (e.g., "Vendor", "Invoice")
    /// * `id` - The identifier that was not found
    ///
    /// # Example
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("Vendor", "VND-123");
    /// assert!(error.to_string().contains("Vendor"));
    /// ```
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    /// Checks if a retry against fresh data may succeed
    pub fn is_conflict(&self) -> bool {
        matches!(self, DatabaseError::Conflict(_))
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }
}

/// Converts SQLx errors to more specific DatabaseError variants
///
/// The PostgreSQL error code decides the variant. Serialization failures
/// and deadlocks become `Conflict` so callers can re-read and retry.
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => {
                DatabaseError::NotFound("Record not found".to_string())
            }
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry(message),
                    Some("23503") => DatabaseError::ForeignKeyViolation(message),
                    Some("23514") => DatabaseError::ConstraintViolation(message),
                    Some("40001") | Some("40P01") => DatabaseError::Conflict(message),
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            _ => DatabaseError::SqlError(error),
        }
    }
}

impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound(message) => PortError::NotFound {
                entity_type: "Record".to_string(),
                id: message,
            },
            DatabaseError::Conflict(message) => PortError::conflict(message),
            DatabaseError::ConnectionFailed(message) => PortError::connection(message),
            DatabaseError::PoolExhausted => PortError::connection("Connection pool exhausted"),
            DatabaseError::InvalidData(message) => PortError::transformation(message),
            DatabaseError::DuplicateEntry(message)
            | DatabaseError::ForeignKeyViolation(message)
            | DatabaseError::ConstraintViolation(message) => PortError::validation(message),
            other => PortError::Internal {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let error = DatabaseError::not_found("Invoice", "INV-1");
        assert!(error.is_not_found());
        assert!(error.to_string().contains("INV-1"));
    }

    #[test]
    fn test_conflict_maps_to_port_conflict() {
        let port: PortError = DatabaseError::Conflict("remaining amount changed".to_string()).into();
        assert!(port.is_conflict());
    }

    #[test]
    fn test_pool_exhaustion_is_transient() {
        let port: PortError = DatabaseError::PoolExhausted.into();
        assert!(port.is_transient());
        assert!(DatabaseError::PoolExhausted.is_connection_error());
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error: DatabaseError = sqlx::Error::RowNotFound.into();
        assert!(error.is_not_found());
    }
}
