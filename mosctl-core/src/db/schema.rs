//! Schema manager
//!
//! `ensure_schema` is idempotent and safe to run on every startup. It never
//! touches an existing `evaluations` table, so a database still on the legacy
//! one-row-per-rating layout is reported rather than altered; converting it is
//! the job of [`crate::db::migrate`].

use sqlx::{Connection, PgConnection};
use tracing::{debug, info, warn};

use crate::error::{Result, StoreContext};

pub(crate) const CREATE_PARTICIPANTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS participants (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
"#;

pub(crate) const CREATE_EVALUATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS evaluations (
        id SERIAL PRIMARY KEY,
        participant_id INTEGER REFERENCES participants(id),
        evaluation_data JSONB NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
"#;

pub(crate) const CREATE_EVALUATIONS_PARTICIPANT_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_evaluations_participant
    ON evaluations(participant_id)
"#;

const CREATE_PARTICIPANTS_EMAIL_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_participants_email
    ON participants(email)
"#;

/// Column that only the legacy per-rating `evaluations` table has
pub(crate) const LEGACY_MARKER_COLUMN: &str = "sample_type";

/// What `ensure_schema` found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaStatus {
    /// `evaluations` still uses the legacy one-row-per-rating layout
    pub legacy_detected: bool,
}

/// Create the participants and evaluations tables and their indexes if absent.
///
/// All statements run in one transaction, so a rejected statement leaves the
/// database as it was.
pub async fn ensure_schema(conn: &mut PgConnection) -> Result<SchemaStatus> {
    let mut tx = conn.begin().await.schema_op("begin schema transaction")?;

    for (step, ddl) in [
        ("create participants table", CREATE_PARTICIPANTS_TABLE),
        ("create evaluations table", CREATE_EVALUATIONS_TABLE),
        ("create evaluations participant index", CREATE_EVALUATIONS_PARTICIPANT_INDEX),
        ("create participants email index", CREATE_PARTICIPANTS_EMAIL_INDEX),
    ] {
        debug!(step, "applying schema statement");
        sqlx::query(ddl).execute(&mut *tx).await.schema_op(step)?;
    }

    let legacy_detected = legacy_schema_present(&mut *tx)
        .await
        .schema_op("inspect evaluations columns")?;

    tx.commit().await.schema_op("commit schema transaction")?;

    if legacy_detected {
        warn!("evaluations table uses the legacy per-rating layout; run `mosctl migrate`");
    } else {
        info!("database schema ready");
    }

    Ok(SchemaStatus { legacy_detected })
}

/// Whether `evaluations` in the current schema has the legacy marker column.
pub(crate) async fn legacy_schema_present(
    conn: &mut PgConnection,
) -> std::result::Result<bool, sqlx::Error> {
    let (present,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM information_schema.columns
            WHERE table_schema = current_schema()
              AND table_name = 'evaluations'
              AND column_name = $1
        )
        "#,
    )
    .bind(LEGACY_MARKER_COLUMN)
    .fetch_one(conn)
    .await?;

    Ok(present)
}

/// Whether a table with this name exists in the current schema.
pub(crate) async fn table_exists(
    conn: &mut PgConnection,
    table: &str,
) -> std::result::Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM information_schema.tables
            WHERE table_schema = current_schema()
              AND table_name = $1
        )
        "#,
    )
    .bind(table)
    .fetch_one(conn)
    .await?;

    Ok(exists)
}
