//! Evaluation document repository
//!
//! One JSONB document per submission. Documents are validated before they
//! are written and decoded (not trusted) when read back.

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::types::{Json, JsonValue};
use sqlx::{FromRow, PgConnection};

use crate::error::{MosError, Result, StoreContext};
use crate::models::EvaluationDocument;

/// Evaluation document joined with its owner, for administrative review
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationWithParticipant {
    pub id: i32,
    pub participant_name: String,
    pub participant_email: String,
    pub document: EvaluationDocument,
    pub created_at: NaiveDateTime,
}

#[derive(FromRow)]
struct EvaluationRow {
    id: i32,
    participant_name: String,
    participant_email: String,
    evaluation_data: JsonValue,
    created_at: NaiveDateTime,
}

impl TryFrom<EvaluationRow> for EvaluationWithParticipant {
    type Error = MosError;

    fn try_from(row: EvaluationRow) -> Result<Self> {
        let document = serde_json::from_value(row.evaluation_data)
            .map_err(|e| MosError::document(format!("evaluation {}", row.id), e))?;

        Ok(Self {
            id: row.id,
            participant_name: row.participant_name,
            participant_email: row.participant_email,
            document,
            created_at: row.created_at,
        })
    }
}

/// Evaluation repository over a borrowed connection or transaction
pub struct EvaluationRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> EvaluationRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Insert one document owned by `participant_id`, returning its id.
    pub async fn insert_document(
        &mut self,
        participant_id: i32,
        document: &EvaluationDocument,
    ) -> Result<i32> {
        let (id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO evaluations (participant_id, evaluation_data)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(participant_id)
        .bind(Json(document))
        .fetch_one(&mut *self.conn)
        .await
        .store_op("insert evaluation document")?;

        Ok(id)
    }

    /// Every document with its owner's name and contact, newest first.
    ///
    /// Documents without an owner (possible only after migrating legacy rows
    /// that had none) are not listed.
    pub async fn list_with_participant(&mut self) -> Result<Vec<EvaluationWithParticipant>> {
        let rows: Vec<EvaluationRow> = sqlx::query_as(
            r#"
            SELECT
                e.id,
                p.name AS participant_name,
                p.email AS participant_email,
                e.evaluation_data,
                e.created_at
            FROM evaluations e
            JOIN participants p ON e.participant_id = p.id
            ORDER BY e.created_at DESC, e.id DESC
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await
        .store_op("list evaluations")?;

        rows.into_iter()
            .map(EvaluationWithParticipant::try_from)
            .collect()
    }

    pub async fn count(&mut self) -> Result<i64> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM evaluations")
            .fetch_one(&mut *self.conn)
            .await
            .store_op("count evaluations")?;
        Ok(total)
    }
}
