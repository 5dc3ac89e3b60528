//! Connection provider
//!
//! Opens one PostgreSQL connection per operation. There is no pool and no
//! retry: a form submission is a single short read-then-write sequence, and
//! the caller decides whether to try again.

use sqlx::{ConnectOptions, Connection, PgConnection};
use tracing::debug;

use crate::config::DbConfig;
use crate::error::{MosError, Result};

/// Open a fresh connection to the evaluation database.
///
/// # Errors
///
/// Returns [`MosError::Config`] for an unusable configuration and
/// [`MosError::Connection`] when the server is unreachable or rejects the login.
pub async fn connect(config: &DbConfig) -> Result<PgConnection> {
    let options = config.connect_options()?;

    debug!(db = %config.describe(), "opening database connection");
    options
        .connect()
        .await
        .map_err(|source| MosError::Connection { source })
}

/// Close a connection, logging instead of failing when the goodbye is lost.
pub async fn close(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        debug!("error while closing connection: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p mosctl-core -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn connection_executes_query() {
        let config = DbConfig::load().expect("config");
        let mut conn = connect(&config).await.expect("connect failed");

        let result: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&mut conn)
            .await
            .expect("query failed");

        assert_eq!(result.0, 1);
        close(conn).await;
    }

    #[tokio::test]
    async fn unreachable_server_is_connection_error() {
        let config = DbConfig {
            host: "127.0.0.1".into(),
            // Reserved port, nothing listens here
            port: 1,
            ssl_mode: crate::config::SslMode::Disable,
            ..Default::default()
        };
        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, MosError::Connection { .. }));
    }
}
