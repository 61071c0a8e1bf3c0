//! Access to the Taxonomic Information Registry store.
//!
//! The registry is a remote SQL-over-HTTP store holding one row per
//! registration with one column per cache bucket plus the denormalized
//! canonical fields. The pipeline only ever needs "next unresolved
//! record for a step" and "write this value back by id", expressed by
//! [`RegistryStore`] so tests can swap in an in-memory store.

mod gc2;
mod types;

pub use gc2::{Gc2Registry, RegistryConfig};
pub use types::{LookupProperty, TirRecord};

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::bucket::BucketColumn;
use crate::pipeline::PipelineStep;
use crate::reconcile::CanonicalFields;

/// Errors from registry reads and writes.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("registry API error: HTTP {status}")]
    Api { status: u16 },

    /// The API response was missing expected structure.
    #[error("malformed registry response: {0}")]
    Malformed(String),

    /// The update was rejected by the store, e.g. the payload exceeded a
    /// field constraint. Recoverable once by shrinking the payload.
    #[error("registry rejected write for record {id}: {message}")]
    WriteConflict { id: i64, message: String },

    /// The optimistic claim guard matched no rows: another pipeline
    /// instance already wrote this bucket.
    #[error("record {id} was already claimed")]
    ClaimLost { id: i64 },
}

/// The registry surface the pipeline depends on.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Fetch zero or one record still unresolved for the given step.
    async fn next_unresolved(&self, step: PipelineStep)
        -> Result<Option<TirRecord>, RegistryError>;

    /// Write a serialized bucket payload into a record's bucket column.
    /// Guarded: the update only applies while the column is still unset,
    /// surfacing [`RegistryError::ClaimLost`] when a concurrent instance
    /// got there first.
    async fn write_bucket(
        &self,
        id: i64,
        column: BucketColumn,
        payload: &str,
    ) -> Result<(), RegistryError>;

    /// Overwrite a record's denormalized canonical fields.
    async fn write_common(&self, id: i64, fields: &CanonicalFields) -> Result<(), RegistryError>;

    /// Cross-reference: common name recorded by the SGCN source for a
    /// submitted name.
    async fn sgcn_common_name(&self, name: &str) -> Result<Option<String>, RegistryError>;

    /// Cross-reference: taxonomic group the SGCN source submitted for a
    /// name.
    async fn sgcn_taxonomic_group(&self, name: &str) -> Result<Option<String>, RegistryError>;

    /// Cross-reference: states listing a name, keyed by reporting year.
    async fn sgcn_state_lists(
        &self,
        name: &str,
    ) -> Result<BTreeMap<String, Vec<String>>, RegistryError>;
}
