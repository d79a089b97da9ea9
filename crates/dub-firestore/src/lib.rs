//! Firestore REST API client and job ledger.
//!
//! This crate provides:
//! - A Firestore REST client (documents, merge updates, commits with field
//!   transforms, structured queries) with token caching and retry
//! - The [`JobLedger`] contract the pipeline reports through
//! - A Firestore-backed ledger over the `jobs` and `videos` collections
//! - Emulator support via `FIRESTORE_EMULATOR_HOST`

pub mod client;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod repos;
pub mod retry;
pub mod token_cache;
pub mod types;

pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use ledger::{FirestoreLedger, JobLedger};
pub use repos::{JobRepository, VideoRepository};
pub use retry::RetryConfig;
pub use types::{Document, FromFirestoreValue, ToFirestoreValue, Value};
