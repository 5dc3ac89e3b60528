//! Database layer - connection provider, schema, migration, repositories
//!
//! # Design Principles
//!
//! - One connection per operation, no pool
//! - Every operation runs in its own transaction and never partially commits
//! - All list operations use JOINs - no N+1 queries

pub mod connection;
pub mod migrate;
pub mod repos;
pub mod schema;

pub use connection::connect;
pub use migrate::{inspect_legacy_schema, migrate_legacy_schema, LegacyInspection, MigrationOutcome};
pub use repos::*;
pub use schema::{ensure_schema, SchemaStatus};
