//! Clients for the external taxonomic authorities.
//!
//! Four services feed the registry: the ITIS Solr service (hierarchical
//! names and TSNs), the WoRMS REST service (marine species and AphiaIDs),
//! the NatureServe species service (conservation status) and the TESS
//! service (federal listing status). The first two expose the common
//! [`TaxonAuthority`] search shape driven by the match resolver; the
//! latter two are identifier-driven lookups with their own contracts.

mod itis;
mod natureserve;
mod tess;
mod types;
mod worms;

pub use itis::{ItisClient, ItisConfig};
pub use natureserve::{NatureServeClient, NatureServeConfig};
pub use tess::{TessClient, TessConfig};
pub use types::*;
pub use worms::{WormsClient, WormsConfig};

use async_trait::async_trait;
use thiserror::Error;

use crate::names::LookupField;

/// Errors that can occur when querying an external authority.
///
/// A transport or service failure is never conflated with "zero matches":
/// empty result sets come back as `Ok` values on the trait methods.
#[derive(Debug, Error)]
pub enum AuthorityError {
    /// HTTP request failed (connection, timeout, protocol).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status.
    #[error("{authority} service unavailable: HTTP {status}")]
    Service { authority: &'static str, status: u16 },

    /// Service answered but the document is missing expected structure.
    #[error("failed to parse {authority} response: {message}")]
    Malformed {
        authority: &'static str,
        message: String,
    },
}

/// What the match resolver needs to know about a matched record in order
/// to drive the follow-accepted step, independent of the authority.
pub trait MatchCandidate {
    /// The authority's identifier for this record.
    fn record_id(&self) -> String;

    /// Whether this record is the accepted/valid form of the taxon.
    fn is_accepted(&self) -> bool;

    /// The identifier of the accepted/valid counterpart, when the
    /// authority designates one.
    fn accepted_id(&self) -> Option<String>;
}

/// Name-search shape shared by the hierarchy and marine authorities.
///
/// A result set is a finite, ordered, one-shot sequence of matches.
#[async_trait]
pub trait TaxonAuthority: Send + Sync {
    type Record: MatchCandidate + Clone + Send + Sync;

    /// Short name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Exact-match name search.
    async fn search_exact(
        &self,
        term: &str,
        field: LookupField,
    ) -> Result<Vec<Self::Record>, AuthorityError>;

    /// Edit-distance-tolerant name search.
    async fn search_fuzzy(
        &self,
        term: &str,
        field: LookupField,
    ) -> Result<Vec<Self::Record>, AuthorityError>;

    /// Direct identifier lookup.
    async fn search_by_id(&self, id: &str) -> Result<Option<Self::Record>, AuthorityError>;
}

/// Conservation-status registry: two-step lookup, name to element global
/// ID, then ID to status document.
#[async_trait]
pub trait ConservationAuthority: Send + Sync {
    /// Resolve a scientific name to an element global identifier.
    async fn find_global_id(&self, name: &str) -> Result<Option<String>, AuthorityError>;

    /// Fetch the status document for an element global identifier.
    /// A missing or empty document is a negative outcome, not an error.
    async fn get_species(&self, element_id: &str)
        -> Result<SpeciesDocResult, AuthorityError>;
}

/// Endangered-species listing registry: identifier-driven lookup.
#[async_trait]
pub trait ListingAuthority: Send + Sync {
    /// Look up the listing detail for a TSN. "No results" and "malformed
    /// response" are distinct negative outcomes carried in [`TessOutcome`].
    async fn query_by_tsn(&self, tsn: &str) -> Result<TessOutcome, AuthorityError>;
}
