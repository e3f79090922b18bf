//! Core data models for the file vault.
//!
//! `StorageObject` maps to the metadata table via `sqlx::FromRow`; the usage
//! and response types only ever travel as JSON via `serde`.

pub mod object;
pub mod responses;
pub mod usage;
