//! Participant repository
//!
//! - find_by_contact: lookup used to warn about repeat submissions
//! - insert: always a new row, contact is not unique by design
//! - list_with_counts: LEFT JOIN so participants without documents show 0

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::{FromRow, PgConnection};

use crate::error::{Result, StoreContext};
use crate::models::ParticipantIdentity;

/// Earlier participant found for a contact identifier
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ParticipantMatch {
    pub id: i32,
    pub name: String,
}

/// Participant row with the number of evaluation documents it owns
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParticipantWithCount {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
    pub evaluation_count: i64,
}

/// Participant repository over a borrowed connection or transaction
pub struct ParticipantRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> ParticipantRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Earliest participant registered with this contact, if any.
    pub async fn find_by_contact(&mut self, contact: &str) -> Result<Option<ParticipantMatch>> {
        sqlx::query_as(
            r#"
            SELECT id, name
            FROM participants
            WHERE email = $1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(contact)
        .fetch_optional(&mut *self.conn)
        .await
        .store_op("find participant by contact")
    }

    /// Insert a participant and return the assigned id.
    pub async fn insert(&mut self, identity: &ParticipantIdentity) -> Result<i32> {
        let (id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO participants (name, email)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(identity.name())
        .bind(identity.contact())
        .fetch_one(&mut *self.conn)
        .await
        .store_op("insert participant")?;

        Ok(id)
    }

    /// All participants, newest first, with their document counts.
    ///
    /// Single query with LEFT JOIN (no N+1).
    pub async fn list_with_counts(&mut self) -> Result<Vec<ParticipantWithCount>> {
        sqlx::query_as(
            r#"
            SELECT
                p.id,
                p.name,
                p.email,
                p.created_at,
                COUNT(e.id) AS evaluation_count
            FROM participants p
            LEFT JOIN evaluations e ON e.participant_id = p.id
            GROUP BY p.id, p.name, p.email, p.created_at
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await
        .store_op("list participants")
    }

    pub async fn count(&mut self) -> Result<i64> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM participants")
            .fetch_one(&mut *self.conn)
            .await
            .store_op("count participants")?;
        Ok(total)
    }
}
