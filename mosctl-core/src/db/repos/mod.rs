//! Repository implementations for database access
//!
//! Each repository borrows a connection (usually a transaction) for its
//! lifetime, so the caller decides the transaction boundary:
//! - Uses JOINs for list operations (no N+1)
//! - Tags every failure with the operation that failed

pub mod evaluations;
pub mod participants;

pub use evaluations::{EvaluationRepo, EvaluationWithParticipant};
pub use participants::{ParticipantMatch, ParticipantRepo, ParticipantWithCount};
