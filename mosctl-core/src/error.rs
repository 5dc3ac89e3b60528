//! Structured error types for mosctl-core.
//!
//! Uses `thiserror` so callers can match on the failure class.
//! The CLI wraps these in `anyhow` for reporting, but a form frontend
//! gets enough structure to tell "fix your input" apart from "try later".

use thiserror::Error;

use crate::models::ValidationError;

/// Main error type for mosctl-core operations
#[derive(Error, Debug)]
pub enum MosError {
    /// Store unreachable or authentication rejected
    #[error("could not connect to the evaluation database: {source}")]
    Connection {
        #[source]
        source: sqlx::Error,
    },

    /// DDL rejected while creating or migrating tables
    #[error("schema error during {operation}: {source}")]
    Schema {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Input failed validation; the caller can correct it and retry
    #[error("invalid input: {0}")]
    Constraint(#[from] ValidationError),

    /// Statement failed; the operation's transaction was rolled back
    #[error("{operation} failed: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Evaluation payload could not be encoded or decoded
    #[error("evaluation document error at {context}: {source}")]
    Document {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Legacy migration refused to continue; nothing was changed
    #[error("migration aborted: {reason}")]
    Migration { reason: String },

    /// Configuration could not be resolved
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for mosctl-core operations
pub type Result<T> = std::result::Result<T, MosError>;

impl MosError {
    /// Create a store error tagged with the failing operation
    pub fn store(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Store { operation, source }
    }

    /// Create a schema error tagged with the failing step
    pub fn schema(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Schema { operation, source }
    }

    /// Create a document error with context
    pub fn document(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Document {
            context: context.into(),
            source,
        }
    }

    /// Create a migration error
    pub fn migration(reason: impl Into<String>) -> Self {
        Self::Migration {
            reason: reason.into(),
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Whether retrying with corrected input can succeed.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }
}

/// Attach operation context to a sqlx error.
///
/// Driver-level I/O, TLS and authentication failures become
/// [`MosError::Connection`]; everything else is a statement failure.
pub(crate) trait StoreContext<T> {
    fn store_op(self, operation: &'static str) -> Result<T>;
    fn schema_op(self, operation: &'static str) -> Result<T>;
}

impl<T> StoreContext<T> for std::result::Result<T, sqlx::Error> {
    fn store_op(self, operation: &'static str) -> Result<T> {
        self.map_err(|source| {
            if is_connection_failure(&source) {
                MosError::Connection { source }
            } else {
                MosError::store(operation, source)
            }
        })
    }

    fn schema_op(self, operation: &'static str) -> Result<T> {
        self.map_err(|source| {
            if is_connection_failure(&source) {
                MosError::Connection { source }
            } else {
                MosError::schema(operation, source)
            }
        })
    }
}

fn is_connection_failure(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        // SQLSTATE classes 08 (connection exception) and 28 (invalid authorization),
        // plus 3D000 (database does not exist)
        sqlx::Error::Database(db) => db
            .code()
            .map(|code| code.starts_with("08") || code.starts_with("28") || code == "3D000")
            .unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MosError::store("insert participant", sqlx::Error::RowNotFound);
        assert!(err.to_string().starts_with("insert participant failed"));

        let err = MosError::config("DB_PORT must be a number");
        assert_eq!(
            err.to_string(),
            "configuration error: DB_PORT must be a number"
        );
    }

    #[test]
    fn test_validation_is_user_correctable() {
        let err: MosError = ValidationError::Empty { field: "name" }.into();
        assert!(err.is_user_correctable());
        assert!(!MosError::config("x").is_user_correctable());
    }

    #[test]
    fn test_io_failure_maps_to_connection() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let result: std::result::Result<(), sqlx::Error> = Err(sqlx::Error::Io(io_err));
        assert!(matches!(
            result.store_op("list participants"),
            Err(MosError::Connection { .. })
        ));
    }

    #[test]
    fn test_statement_failure_keeps_operation() {
        let result: std::result::Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        match result.schema_op("create participants table") {
            Err(MosError::Schema { operation, .. }) => {
                assert_eq!(operation, "create participants table")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
