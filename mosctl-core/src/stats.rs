//! Aggregation queries
//!
//! Ratings live inside JSONB documents, so every statistics call expands each
//! document's `ratings` array with `jsonb_array_elements` and aggregates the
//! flattened entries. That re-reads every document per call, which is fine at
//! one document per human participant.

use serde::Serialize;
use sqlx::{FromRow, PgConnection};

use crate::db::repos::{EvaluationRepo, ParticipantRepo};
use crate::error::{Result, StoreContext};

/// Rating statistics for one (model id, model name) group
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ModelStatistics {
    pub model_id: String,
    pub model_name: String,
    pub count: i64,
    /// Mean rating rounded to two decimal places
    pub average: f64,
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    /// Ordered by model id ascending
    pub per_model: Vec<ModelStatistics>,
    pub total_participants: i64,
    pub total_evaluation_documents: i64,
}

impl Statistics {
    /// Mean of the per-model averages, rounded to two decimals.
    ///
    /// Each model counts once regardless of how many ratings it received.
    pub fn overall_average(&self) -> Option<f64> {
        if self.per_model.is_empty() {
            return None;
        }
        let sum: f64 = self.per_model.iter().map(|m| m.average).sum();
        Some(round2(sum / self.per_model.len() as f64))
    }

    /// Total number of rating entries across all documents.
    pub fn total_ratings(&self) -> i64 {
        self.per_model.iter().map(|m| m.count).sum()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-model statistics plus participant and document totals.
///
/// Run inside one transaction so the three reads see the same snapshot.
pub async fn compute_statistics(conn: &mut PgConnection) -> Result<Statistics> {
    let per_model: Vec<ModelStatistics> = sqlx::query_as(
        r#"
        SELECT
            entry->>'model_id' AS model_id,
            entry->>'model_name' AS model_name,
            COUNT(*) AS count,
            ROUND(AVG((entry->>'rating')::int)::numeric, 2)::float8 AS average,
            MIN((entry->>'rating')::int) AS min,
            MAX((entry->>'rating')::int) AS max
        FROM evaluations e
        CROSS JOIN LATERAL jsonb_array_elements(e.evaluation_data->'ratings') AS entry
        GROUP BY entry->>'model_id', entry->>'model_name'
        ORDER BY model_id, model_name
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .store_op("compute model statistics")?;

    let total_participants = ParticipantRepo::new(&mut *conn).count().await?;
    let total_evaluation_documents = EvaluationRepo::new(&mut *conn).count().await?;

    Ok(Statistics {
        per_model,
        total_participants,
        total_evaluation_documents,
    })
}
