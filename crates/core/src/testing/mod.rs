//! Mock implementations and fixtures for testing.
//!
//! Mirrors the seams the pipeline depends on: scripted authority
//! clients with error injection and recorded lookups, plus an in-memory
//! registry store.

pub mod fixtures;
mod mock_authority;
mod mock_registry;

pub use mock_authority::{
    LookupKind, MockAuthority, MockConservationAuthority, MockListingAuthority, RecordedLookup,
};
pub use mock_registry::{MockRecord, MockRegistry};
