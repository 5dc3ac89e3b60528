//! mosctl-core: evaluation persistence and aggregation for MOS listening tests
//!
//! Stores each participant's Mean Opinion Score ratings as one JSONB document
//! in PostgreSQL, answers the review and statistics queries, and migrates the
//! legacy one-row-per-rating layout to documents.
//!
//! A form frontend is expected to:
//! 1. call [`Store::ensure_schema`] once at startup
//! 2. collect ratings in a [`RatingSession`]
//! 3. call [`Store::find_participant_by_contact`] to warn about repeat submissions
//! 4. call [`Store::submit`] once per completed form

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod session;
pub mod stats;
pub mod store;

pub use config::{DbConfig, SslMode};
pub use db::{
    EvaluationWithParticipant, LegacyInspection, MigrationOutcome, ParticipantMatch,
    ParticipantWithCount, SchemaStatus,
};
pub use error::{MosError, Result};
pub use models::{
    EvaluationDocument, ParticipantIdentity, Rating, RatingEntry, SampleCategory, ValidationError,
};
pub use session::{RatingKey, RatingSession};
pub use stats::{ModelStatistics, Statistics};
pub use store::{Store, SubmissionReceipt};
