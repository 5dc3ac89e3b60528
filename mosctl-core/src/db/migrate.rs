//! One-shot migration from the legacy per-rating table to evaluation documents
//!
//! The legacy `evaluations` table held one row per (participant, sample, model).
//! The current table holds one JSONB document per participant. Migration:
//!
//! 1. load legacy rows ordered by participant, then creation time
//! 2. group them into one ordered document per participant
//! 3. copy the legacy table to a backup table
//! 4. drop it, create the document table, bulk-insert the documents
//! 5. recreate the participant index
//!
//! PostgreSQL DDL is transactional, so every step runs in one transaction and
//! any failure leaves the legacy table exactly as it was. The caller must make
//! sure no writers are active and must get operator confirmation first.

use sqlx::types::Json;
use sqlx::{Connection, FromRow, PgConnection, Postgres, QueryBuilder};
use tracing::{debug, info};

use super::schema::{
    legacy_schema_present, table_exists, CREATE_EVALUATIONS_PARTICIPANT_INDEX,
    CREATE_EVALUATIONS_TABLE,
};
use crate::error::{MosError, Result, StoreContext};
use crate::models::{EvaluationDocument, Rating, RatingEntry, ValidationError};

const BACKUP_TABLE: &str = "evaluations_backup";

/// Rows per INSERT statement (two binds per row, well under the 65535 bind limit)
const INSERT_CHUNK: usize = 1000;

/// What a migration would do, shown to the operator before confirming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyInspection {
    pub legacy_detected: bool,
    /// Legacy rating rows that would be folded into documents
    pub rating_rows: i64,
    /// Documents that would be written (one per participant)
    pub documents: i64,
}

/// Result of [`migrate_legacy_schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// No legacy column found; nothing was touched
    AlreadyMigrated,
    Migrated {
        documents: usize,
        ratings: usize,
        backup_table: String,
    },
}

/// One row of the legacy `evaluations` table.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct LegacyRow {
    pub participant_id: Option<i32>,
    pub sample_type: String,
    pub sample_index: i32,
    pub model_id: String,
    pub model_name: String,
    pub rating: i32,
    pub audio_path: Option<String>,
    pub original_text: Option<String>,
}

impl LegacyRow {
    fn into_entry(self) -> std::result::Result<RatingEntry, ValidationError> {
        let sample_index =
            u32::try_from(self.sample_index).map_err(|_| ValidationError::OutOfRange {
                field: "sample_index",
                value: i64::from(self.sample_index),
                min: 0,
                max: i64::from(u32::MAX),
            })?;

        Ok(RatingEntry {
            sample_type: self.sample_type.parse()?,
            sample_index,
            model_id: self.model_id,
            model_name: self.model_name,
            rating: Rating::new(i64::from(self.rating))?,
            audio_path: self.audio_path,
            original_text: self.original_text,
        })
    }
}

/// Fold rows into one document per owner.
///
/// Rows must arrive sorted by owner; runs of equal owners become one document
/// and row order inside a run becomes entry order.
pub(crate) fn group_by_participant(
    rows: Vec<LegacyRow>,
) -> std::result::Result<Vec<(Option<i32>, EvaluationDocument)>, ValidationError> {
    let mut groups: Vec<(Option<i32>, EvaluationDocument)> = Vec::new();

    for row in rows {
        let owner = row.participant_id;
        let entry = row.into_entry()?;
        match groups.last_mut() {
            Some((current, doc)) if *current == owner => doc.ratings.push(entry),
            _ => groups.push((owner, EvaluationDocument::new(vec![entry]))),
        }
    }

    Ok(groups)
}

/// Report whether the legacy layout is present and how much it holds.
pub async fn inspect_legacy_schema(conn: &mut PgConnection) -> Result<LegacyInspection> {
    let legacy_detected = legacy_schema_present(conn)
        .await
        .store_op("inspect legacy schema")?;

    if !legacy_detected {
        return Ok(LegacyInspection {
            legacy_detected,
            rating_rows: 0,
            documents: 0,
        });
    }

    let (rating_rows, documents): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) AS rating_rows,
            COUNT(DISTINCT participant_id)
                + CASE WHEN BOOL_OR(participant_id IS NULL) THEN 1 ELSE 0 END AS documents
        FROM evaluations
        "#,
    )
    .fetch_one(conn)
    .await
    .store_op("count legacy rows")?;

    Ok(LegacyInspection {
        legacy_detected,
        rating_rows,
        documents,
    })
}

/// Convert the legacy per-rating table into evaluation documents.
///
/// Idempotent: when the legacy marker column is absent this is a no-op that
/// returns [`MigrationOutcome::AlreadyMigrated`].
pub async fn migrate_legacy_schema(conn: &mut PgConnection) -> Result<MigrationOutcome> {
    let mut tx = conn.begin().await.schema_op("begin migration transaction")?;

    if !legacy_schema_present(&mut *tx)
        .await
        .schema_op("detect legacy schema")?
    {
        info!("no legacy evaluations layout found; nothing to migrate");
        return Ok(MigrationOutcome::AlreadyMigrated);
    }

    info!("legacy evaluations layout detected, starting migration");

    let rows: Vec<LegacyRow> = sqlx::query_as(
        r#"
        SELECT
            participant_id,
            sample_type,
            sample_index,
            model_id,
            model_name,
            rating,
            audio_path,
            original_text
        FROM evaluations
        ORDER BY participant_id, created_at, id
        "#,
    )
    .fetch_all(&mut *tx)
    .await
    .schema_op("load legacy rows")?;

    let ratings = rows.len();
    let groups = group_by_participant(rows)?;
    debug!(ratings, documents = groups.len(), "grouped legacy rows");

    let backup_table = free_backup_name(&mut *tx).await?;
    info!(table = %backup_table, "creating backup table");
    let backed_up = sqlx::query(&format!(
        "CREATE TABLE {} AS SELECT * FROM evaluations",
        backup_table
    ))
    .execute(&mut *tx)
    .await
    .schema_op("create backup table")?
    .rows_affected();

    if backed_up != ratings as u64 {
        return Err(MosError::migration(format!(
            "backup copied {} rows but {} were loaded",
            backed_up, ratings
        )));
    }

    info!("dropping legacy evaluations table");
    sqlx::query("DROP TABLE evaluations")
        .execute(&mut *tx)
        .await
        .schema_op("drop legacy table")?;

    info!("creating document-shaped evaluations table");
    sqlx::query(CREATE_EVALUATIONS_TABLE)
        .execute(&mut *tx)
        .await
        .schema_op("create evaluations table")?;

    info!(documents = groups.len(), "inserting migrated documents");
    for chunk in groups.chunks(INSERT_CHUNK) {
        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO evaluations (participant_id, evaluation_data) ");
        builder.push_values(chunk, |mut row, (participant_id, doc)| {
            row.push_bind(*participant_id).push_bind(Json(doc));
        });
        builder
            .build()
            .execute(&mut *tx)
            .await
            .schema_op("insert migrated documents")?;
    }

    sqlx::query(CREATE_EVALUATIONS_PARTICIPANT_INDEX)
        .execute(&mut *tx)
        .await
        .schema_op("create evaluations participant index")?;

    tx.commit().await.schema_op("commit migration")?;

    info!(
        documents = groups.len(),
        ratings,
        backup = %backup_table,
        "migration completed"
    );

    Ok(MigrationOutcome::Migrated {
        documents: groups.len(),
        ratings,
        backup_table,
    })
}

/// First of `evaluations_backup`, `evaluations_backup_2`, ... not yet taken.
async fn free_backup_name(conn: &mut PgConnection) -> Result<String> {
    let mut suffix = 1u32;
    loop {
        let candidate = match suffix {
            1 => BACKUP_TABLE.to_string(),
            n => format!("{}_{}", BACKUP_TABLE, n),
        };
        if !table_exists(conn, &candidate)
            .await
            .schema_op("look up backup table")?
        {
            return Ok(candidate);
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SampleCategory;

    fn row(participant_id: Option<i32>, model_id: &str, rating: i32) -> LegacyRow {
        LegacyRow {
            participant_id,
            sample_type: "sunda".into(),
            sample_index: 0,
            model_id: model_id.into(),
            model_name: format!("Model {}", model_id),
            rating,
            audio_path: Some(format!("audio/{}.wav", model_id)),
            original_text: Some("seniman nuju ngalukis sirkuit valencia".into()),
        }
    }

    #[test]
    fn groups_preserve_row_order() {
        let groups = group_by_participant(vec![
            row(Some(1), "A", 3),
            row(Some(1), "B", 5),
            row(Some(2), "A", 4),
        ])
        .unwrap();

        assert_eq!(groups.len(), 2);
        let (owner, doc) = &groups[0];
        assert_eq!(*owner, Some(1));
        let models: Vec<_> = doc.ratings.iter().map(|e| e.model_id.as_str()).collect();
        assert_eq!(models, ["A", "B"]);
        assert_eq!(doc.ratings[0].rating.value(), 3);
        assert_eq!(doc.ratings[1].rating.value(), 5);
        assert_eq!(groups[1].0, Some(2));
    }

    #[test]
    fn unowned_rows_form_their_own_document() {
        let groups =
            group_by_participant(vec![row(Some(7), "C", 2), row(None, "D", 1), row(None, "E", 4)])
                .unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].0, None);
        assert_eq!(groups[1].1.len(), 2);
    }

    #[test]
    fn empty_table_yields_no_documents() {
        assert!(group_by_participant(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn entry_fields_carry_over() {
        let mut legacy = row(Some(1), "E", 4);
        legacy.sample_type = "indonesian".into();
        legacy.sample_index = 3;
        legacy.audio_path = None;

        let entry = legacy.into_entry().unwrap();
        assert_eq!(entry.sample_type, SampleCategory::Indonesian);
        assert_eq!(entry.sample_index, 3);
        assert_eq!(entry.audio_path, None);
        assert_eq!(entry.model_name, "Model E");
    }

    #[test]
    fn unknown_category_aborts_grouping() {
        let mut legacy = row(Some(1), "A", 3);
        legacy.sample_type = "javanese".into();
        assert!(matches!(
            group_by_participant(vec![legacy]).unwrap_err(),
            ValidationError::InvalidVariant { .. }
        ));
    }
}
