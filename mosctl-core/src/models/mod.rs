//! Domain models with validation at construction
//!
//! All participant input is validated before it reaches the store.
//! Invalid input returns ValidationError, not panic.

pub mod participant;
pub mod rating;
pub mod validation;

pub use participant::ParticipantIdentity;
pub use rating::{EvaluationDocument, Rating, RatingEntry, SampleCategory};
pub use validation::ValidationError;
