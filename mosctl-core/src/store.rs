//! Store facade
//!
//! Every operation opens its own connection, runs inside its own transaction,
//! commits or rolls back, and closes the connection. Nothing is shared between
//! calls except the database itself.

use sqlx::{Connection, PgConnection, Postgres, Transaction};
use tracing::{debug, info, instrument};

use crate::config::DbConfig;
use crate::db::connection::{close, connect};
use crate::db::repos::{
    EvaluationRepo, EvaluationWithParticipant, ParticipantMatch, ParticipantRepo,
    ParticipantWithCount,
};
use crate::db::{self, LegacyInspection, MigrationOutcome, SchemaStatus};
use crate::error::{Result, StoreContext};
use crate::models::{EvaluationDocument, ParticipantIdentity};
use crate::stats::{self, Statistics};

/// Ids assigned to a completed submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub participant_id: i32,
    pub evaluation_id: i32,
    pub rating_count: usize,
}

/// Evaluation persistence and aggregation over one configured database.
#[derive(Debug, Clone)]
pub struct Store {
    config: DbConfig,
}

impl Store {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Create tables and indexes if absent. Call once at process start;
    /// an error here means the application cannot proceed.
    #[instrument(skip_all)]
    pub async fn ensure_schema(&self) -> Result<SchemaStatus> {
        let mut conn = connect(&self.config).await?;
        let status = db::ensure_schema(&mut conn).await?;
        close(conn).await;
        Ok(status)
    }

    /// Describe what `migrate_legacy_schema` would convert.
    #[instrument(skip_all)]
    pub async fn inspect_legacy_schema(&self) -> Result<LegacyInspection> {
        let mut conn = connect(&self.config).await?;
        let inspection = db::inspect_legacy_schema(&mut conn).await?;
        close(conn).await;
        Ok(inspection)
    }

    /// Convert the legacy per-rating table into documents.
    ///
    /// Destructive apart from the backup table it creates. Only call after the
    /// operator confirmed, with no other writers running.
    #[instrument(skip_all)]
    pub async fn migrate_legacy_schema(&self) -> Result<MigrationOutcome> {
        let mut conn = connect(&self.config).await?;
        let outcome = db::migrate_legacy_schema(&mut conn).await?;
        close(conn).await;
        Ok(outcome)
    }

    /// Earlier participant with this contact, or `None`.
    ///
    /// Used to warn about repeat submissions, never to block them.
    #[instrument(skip_all)]
    pub async fn find_participant_by_contact(
        &self,
        contact: &str,
    ) -> Result<Option<ParticipantMatch>> {
        let mut conn = connect(&self.config).await?;
        let mut tx = begin_read_only(&mut conn).await?;
        let found = ParticipantRepo::new(&mut *tx)
            .find_by_contact(contact.trim())
            .await?;
        tx.commit().await.store_op("find participant by contact")?;
        close(conn).await;

        debug!(found = found.is_some(), "participant lookup");
        Ok(found)
    }

    /// Insert a participant row and return its id. Never upserts.
    #[instrument(skip_all)]
    pub async fn insert_participant(&self, identity: &ParticipantIdentity) -> Result<i32> {
        let mut conn = connect(&self.config).await?;
        let mut tx = conn.begin().await.store_op("insert participant")?;
        let id = ParticipantRepo::new(&mut *tx).insert(identity).await?;
        tx.commit().await.store_op("insert participant")?;
        close(conn).await;

        info!(participant_id = id, "participant saved");
        Ok(id)
    }

    /// Insert one evaluation document for an existing participant.
    ///
    /// The document is validated first; a failed write rolls back and leaves
    /// no row behind.
    #[instrument(skip_all)]
    pub async fn insert_evaluation_document(
        &self,
        participant_id: i32,
        document: &EvaluationDocument,
    ) -> Result<i32> {
        document.validate()?;

        let mut conn = connect(&self.config).await?;
        let mut tx = conn.begin().await.store_op("insert evaluation document")?;
        let id = EvaluationRepo::new(&mut *tx)
            .insert_document(participant_id, document)
            .await?;
        tx.commit().await.store_op("insert evaluation document")?;
        close(conn).await;

        info!(
            participant_id,
            evaluation_id = id,
            ratings = document.len(),
            "evaluation document saved"
        );
        Ok(id)
    }

    /// Save a participant and their document atomically.
    ///
    /// Both rows are written in one transaction: either the submission is
    /// fully stored or nothing is, so a participant can never be left
    /// without their document.
    #[instrument(skip_all)]
    pub async fn submit(
        &self,
        identity: &ParticipantIdentity,
        document: &EvaluationDocument,
    ) -> Result<SubmissionReceipt> {
        document.validate()?;

        let mut conn = connect(&self.config).await?;
        let mut tx = conn.begin().await.store_op("submit evaluation")?;
        let participant_id = ParticipantRepo::new(&mut *tx).insert(identity).await?;
        let evaluation_id = EvaluationRepo::new(&mut *tx)
            .insert_document(participant_id, document)
            .await?;
        tx.commit().await.store_op("submit evaluation")?;
        close(conn).await;

        info!(
            participant_id,
            evaluation_id,
            ratings = document.len(),
            "submission saved"
        );
        Ok(SubmissionReceipt {
            participant_id,
            evaluation_id,
            rating_count: document.len(),
        })
    }

    /// All documents with their owners, newest first.
    #[instrument(skip_all)]
    pub async fn list_evaluations_with_participant(
        &self,
    ) -> Result<Vec<EvaluationWithParticipant>> {
        let mut conn = connect(&self.config).await?;
        let mut tx = begin_read_only(&mut conn).await?;
        let rows = EvaluationRepo::new(&mut *tx).list_with_participant().await?;
        tx.commit().await.store_op("list evaluations")?;
        close(conn).await;
        Ok(rows)
    }

    /// All participants with document counts; zero-document participants included.
    #[instrument(skip_all)]
    pub async fn list_participants_with_counts(&self) -> Result<Vec<ParticipantWithCount>> {
        let mut conn = connect(&self.config).await?;
        let mut tx = begin_read_only(&mut conn).await?;
        let rows = ParticipantRepo::new(&mut *tx).list_with_counts().await?;
        tx.commit().await.store_op("list participants")?;
        close(conn).await;
        Ok(rows)
    }

    /// Per-model rating statistics and totals from one snapshot.
    #[instrument(skip_all)]
    pub async fn compute_statistics(&self) -> Result<Statistics> {
        let mut conn = connect(&self.config).await?;
        let mut tx = begin_read_only(&mut conn).await?;
        let statistics = stats::compute_statistics(&mut *tx).await?;
        tx.commit().await.store_op("compute statistics")?;
        close(conn).await;
        Ok(statistics)
    }
}

/// Begin a read-only repeatable-read transaction (one consistent snapshot).
async fn begin_read_only(conn: &mut PgConnection) -> Result<Transaction<'_, Postgres>> {
    let mut tx = conn.begin().await.store_op("begin read transaction")?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await
        .store_op("begin read transaction")?;
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn read_transactions_are_read_only_snapshots() {
        let config = DbConfig::load().expect("config");
        let mut conn = connect(&config).await.expect("connect failed");
        let mut tx = begin_read_only(&mut conn).await.expect("begin failed");

        let (isolation,): (String,) = sqlx::query_as("SHOW transaction_isolation")
            .fetch_one(&mut *tx)
            .await
            .unwrap();
        assert_eq!(isolation, "repeatable read");

        let err = sqlx::query("CREATE TABLE mos_read_only_check (id INTEGER)")
            .execute(&mut *tx)
            .await
            .unwrap_err();
        let code = err
            .as_database_error()
            .and_then(|db| db.code().map(|c| c.into_owned()));
        // 25006: read_only_sql_transaction
        assert_eq!(code.as_deref(), Some("25006"));

        tx.rollback().await.unwrap();
        close(conn).await;
    }
}
