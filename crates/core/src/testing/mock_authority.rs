//! Mock authority clients.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::authority::{
    AuthorityError, ConservationAuthority, ConservationStatus, ListingAuthority, MatchCandidate,
    SpeciesDocResult, TaxonAuthority, TessOutcome,
};
use crate::names::LookupField;

/// Which trait method a recorded lookup came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Exact,
    Fuzzy,
    ById,
}

/// A recorded lookup for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedLookup {
    pub kind: LookupKind,
    pub term: String,
}

/// Mock implementation of the [`TaxonAuthority`] search shape.
///
/// Scripted behavior per method: fixed result lists for the name
/// searches, an id-to-record table for identifier lookups, and one-shot
/// error injection per method (consumed by the next call, like the next
/// real request failing).
pub struct MockAuthority<R> {
    exact: RwLock<Vec<R>>,
    fuzzy: RwLock<Vec<R>>,
    by_id: RwLock<HashMap<String, R>>,
    next_exact_error: RwLock<Option<AuthorityError>>,
    next_fuzzy_error: RwLock<Option<AuthorityError>>,
    next_id_error: RwLock<Option<AuthorityError>>,
    lookups: RwLock<Vec<RecordedLookup>>,
}

impl<R> Default for MockAuthority<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> MockAuthority<R> {
    pub fn new() -> Self {
        Self {
            exact: RwLock::new(Vec::new()),
            fuzzy: RwLock::new(Vec::new()),
            by_id: RwLock::new(HashMap::new()),
            next_exact_error: RwLock::new(None),
            next_fuzzy_error: RwLock::new(None),
            next_id_error: RwLock::new(None),
            lookups: RwLock::new(Vec::new()),
        }
    }

    /// Set the result list for exact searches.
    pub async fn set_exact_results(&self, results: Vec<R>) {
        *self.exact.write().await = results;
    }

    /// Set the result list for fuzzy searches.
    pub async fn set_fuzzy_results(&self, results: Vec<R>) {
        *self.fuzzy.write().await = results;
    }

    /// Register a record for identifier lookups.
    pub async fn insert_record(&self, id: &str, record: R) {
        self.by_id.write().await.insert(id.to_string(), record);
    }

    /// Fail the next exact search with the given error.
    pub async fn set_next_exact_error(&self, error: AuthorityError) {
        *self.next_exact_error.write().await = Some(error);
    }

    /// Fail the next fuzzy search with the given error.
    pub async fn set_next_fuzzy_error(&self, error: AuthorityError) {
        *self.next_fuzzy_error.write().await = Some(error);
    }

    /// Fail the next identifier lookup with the given error.
    pub async fn set_next_id_error(&self, error: AuthorityError) {
        *self.next_id_error.write().await = Some(error);
    }

    /// All lookups made so far.
    pub async fn recorded_lookups(&self) -> Vec<RecordedLookup> {
        self.lookups.read().await.clone()
    }

    /// Number of lookups made so far.
    pub async fn lookup_count(&self) -> usize {
        self.lookups.read().await.len()
    }

    async fn record(&self, kind: LookupKind, term: &str) {
        self.lookups.write().await.push(RecordedLookup {
            kind,
            term: term.to_string(),
        });
    }
}

#[async_trait]
impl<R> TaxonAuthority for MockAuthority<R>
where
    R: MatchCandidate + Clone + Send + Sync,
{
    type Record = R;

    fn name(&self) -> &'static str {
        "mock"
    }

    async fn search_exact(
        &self,
        term: &str,
        _field: LookupField,
    ) -> Result<Vec<R>, AuthorityError> {
        self.record(LookupKind::Exact, term).await;
        if let Some(error) = self.next_exact_error.write().await.take() {
            return Err(error);
        }
        Ok(self.exact.read().await.clone())
    }

    async fn search_fuzzy(
        &self,
        term: &str,
        _field: LookupField,
    ) -> Result<Vec<R>, AuthorityError> {
        self.record(LookupKind::Fuzzy, term).await;
        if let Some(error) = self.next_fuzzy_error.write().await.take() {
            return Err(error);
        }
        Ok(self.fuzzy.read().await.clone())
    }

    async fn search_by_id(&self, id: &str) -> Result<Option<R>, AuthorityError> {
        self.record(LookupKind::ById, id).await;
        if let Some(error) = self.next_id_error.write().await.take() {
            return Err(error);
        }
        Ok(self.by_id.read().await.get(id).cloned())
    }
}

/// Mock conservation-status authority.
#[derive(Default)]
pub struct MockConservationAuthority {
    ids: RwLock<HashMap<String, String>>,
    docs: RwLock<HashMap<String, SpeciesDocResult>>,
    next_error: RwLock<Option<AuthorityError>>,
}

impl MockConservationAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a name to an element global ID.
    pub async fn map_name(&self, name: &str, element_id: &str) {
        self.ids
            .write()
            .await
            .insert(name.to_string(), element_id.to_string());
    }

    /// Script a populated status document for an element ID.
    pub async fn set_species(&self, element_id: &str, status: ConservationStatus) {
        self.docs.write().await.insert(
            element_id.to_string(),
            SpeciesDocResult::Found(Box::new(status)),
        );
    }

    /// Script an empty document for an element ID.
    pub async fn set_species_empty(&self, element_id: &str) {
        self.docs
            .write()
            .await
            .insert(element_id.to_string(), SpeciesDocResult::Empty);
    }

    /// Fail the next call with the given error.
    pub async fn set_next_error(&self, error: AuthorityError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl ConservationAuthority for MockConservationAuthority {
    async fn find_global_id(&self, name: &str) -> Result<Option<String>, AuthorityError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(self.ids.read().await.get(name).cloned())
    }

    async fn get_species(&self, element_id: &str) -> Result<SpeciesDocResult, AuthorityError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(self
            .docs
            .read()
            .await
            .get(element_id)
            .cloned()
            .unwrap_or(SpeciesDocResult::Empty))
    }
}

/// Mock listing authority.
#[derive(Default)]
pub struct MockListingAuthority {
    outcomes: RwLock<HashMap<String, TessOutcome>>,
    next_error: RwLock<Option<AuthorityError>>,
}

impl MockListingAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome for a TSN.
    pub async fn set_outcome(&self, tsn: &str, outcome: TessOutcome) {
        self.outcomes.write().await.insert(tsn.to_string(), outcome);
    }

    /// Fail the next call with the given error.
    pub async fn set_next_error(&self, error: AuthorityError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl ListingAuthority for MockListingAuthority {
    async fn query_by_tsn(&self, tsn: &str) -> Result<TessOutcome, AuthorityError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(self
            .outcomes
            .read()
            .await
            .get(tsn)
            .cloned()
            .unwrap_or(TessOutcome::None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_scripted_exact_results() {
        let authority = MockAuthority::new();
        authority
            .set_exact_results(vec![fixtures::itis_doc("1", "Testus testus", "valid")])
            .await;

        let results = authority
            .search_exact("Testus testus", LookupField::NameWithoutIndicator)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(authority.lookup_count().await, 1);
        assert_eq!(
            authority.recorded_lookups().await[0].kind,
            LookupKind::Exact
        );
    }

    #[tokio::test]
    async fn test_error_is_consumed() {
        let authority = MockAuthority::<crate::authority::ItisDoc>::new();
        authority
            .set_next_exact_error(AuthorityError::Service {
                authority: "mock",
                status: 503,
            })
            .await;

        let first = authority
            .search_exact("x", LookupField::NameWithoutIndicator)
            .await;
        assert!(first.is_err());

        let second = authority
            .search_exact("x", LookupField::NameWithoutIndicator)
            .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_conservation_mock_defaults_to_empty_doc() {
        let mock = MockConservationAuthority::new();
        assert!(mock.find_global_id("Ursus arctos").await.unwrap().is_none());
        assert!(matches!(
            mock.get_species("ELEMENT_GLOBAL.2.1").await.unwrap(),
            SpeciesDocResult::Empty
        ));
    }

    #[tokio::test]
    async fn test_listing_mock_defaults_to_none() {
        let mock = MockListingAuthority::new();
        assert!(matches!(
            mock.query_by_tsn("1").await.unwrap(),
            TessOutcome::None
        ));
    }
}
