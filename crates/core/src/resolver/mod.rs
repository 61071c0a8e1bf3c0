//! Match resolution against a taxonomic authority.
//!
//! One decision sequence per record: exact search, fuzzy fallback when
//! the exact search finds nothing, and a single follow-up lookup of the
//! accepted identifier when the matched record is not the accepted form.
//! Ambiguity is never silently resolved by picking a result, and an
//! unavailable authority degrades to the next step rather than failing
//! the record.

mod types;

pub use types::{AuthorityFailure, MatchMethod, MatchOutcome, SearchStage};

use tracing::{debug, warn};

use crate::authority::{AuthorityError, MatchCandidate, TaxonAuthority};
use crate::names::{LookupField, SearchTerm};

/// Drives the exact/fuzzy/follow-accepted decision sequence for one
/// authority.
pub struct MatchResolver<'a, A: TaxonAuthority + ?Sized> {
    authority: &'a A,
}

impl<'a, A: TaxonAuthority + ?Sized> MatchResolver<'a, A> {
    pub fn new(authority: &'a A) -> Self {
        Self { authority }
    }

    /// Resolve a classified search term.
    ///
    /// Empty terms short-circuit to `NotMatched` without touching the
    /// authority; numeric terms become direct identifier lookups.
    pub async fn resolve(
        &self,
        term: &SearchTerm,
        follow_taxonomy: bool,
    ) -> MatchOutcome<A::Record> {
        match term {
            SearchTerm::Empty => MatchOutcome::not_matched(""),
            SearchTerm::Identifier(id) => self.resolve_identifier(id).await,
            SearchTerm::Name { value, field } => {
                self.resolve_name(value, *field, follow_taxonomy).await
            }
        }
    }

    /// Direct identifier lookup, used when the registration carries an
    /// explicit identifier instead of a name. Never follows taxonomy:
    /// an identifier registration pins the record the submitter meant.
    pub async fn resolve_identifier(&self, id: &str) -> MatchOutcome<A::Record> {
        let mut outcome = MatchOutcome::not_matched(id);
        match self.authority.search_by_id(id).await {
            Ok(Some(record)) => {
                outcome.method = MatchMethod::TsnQuery;
                outcome.discovered_id = Some(record.record_id());
                outcome.record = Some(record);
            }
            Ok(None) => {
                debug!("{}: no record for identifier {}", self.authority.name(), id);
            }
            Err(e) => self.degrade(&mut outcome, SearchStage::Identifier, e),
        }
        outcome
    }

    async fn resolve_name(
        &self,
        value: &str,
        field: LookupField,
        follow_taxonomy: bool,
    ) -> MatchOutcome<A::Record> {
        let mut outcome = MatchOutcome::not_matched(value);

        let mut try_fuzzy = false;
        match self.authority.search_exact(value, field).await {
            Ok(records) => match records.len() {
                1 => {
                    outcome.method = MatchMethod::ExactMatch;
                    outcome.record = records.into_iter().next();
                }
                0 => try_fuzzy = true,
                n => {
                    // Multiple exact hits: ambiguity is treated as no
                    // actionable match, and fuzzy results are not examined.
                    debug!(
                        "{}: {} exact matches for '{}', not matched",
                        self.authority.name(),
                        n,
                        value
                    );
                    return outcome;
                }
            },
            Err(e) => {
                self.degrade(&mut outcome, SearchStage::Exact, e);
                try_fuzzy = true;
            }
        }

        if try_fuzzy {
            match self.authority.search_fuzzy(value, field).await {
                Ok(records) => {
                    if records.len() == 1 {
                        outcome.method = MatchMethod::FuzzyMatch;
                        outcome.record = records.into_iter().next();
                    } else if !records.is_empty() {
                        debug!(
                            "{}: {} fuzzy matches for '{}', not matched",
                            self.authority.name(),
                            records.len(),
                            value
                        );
                    }
                }
                Err(e) => self.degrade(&mut outcome, SearchStage::Fuzzy, e),
            }
        }

        if let Some(discovered) = outcome.record.as_ref().map(MatchCandidate::record_id) {
            outcome.discovered_id = Some(discovered);
            let accepted = outcome
                .record
                .as_ref()
                .map(MatchCandidate::is_accepted)
                .unwrap_or(true);
            if follow_taxonomy && !accepted {
                self.follow_accepted(&mut outcome).await;
            }
        }

        outcome
    }

    /// Chase the accepted/valid counterpart of a non-accepted match.
    /// At most one hop; the originally discovered identifier is retained
    /// on the outcome.
    async fn follow_accepted(&self, outcome: &mut MatchOutcome<A::Record>) {
        let Some(accepted_id) = outcome.record.as_ref().and_then(|r| r.accepted_id()) else {
            return;
        };

        match self.authority.search_by_id(&accepted_id).await {
            Ok(Some(accepted)) => {
                outcome.method = MatchMethod::FollowedAccepted;
                outcome.record = Some(accepted);
            }
            Ok(None) => {
                debug!(
                    "{}: accepted id {} resolved to nothing, keeping original match",
                    self.authority.name(),
                    accepted_id
                );
            }
            Err(e) => self.degrade(outcome, SearchStage::FollowAccepted, e),
        }
    }

    fn degrade(
        &self,
        outcome: &mut MatchOutcome<A::Record>,
        stage: SearchStage,
        error: AuthorityError,
    ) {
        warn!(
            "{}: {} search failed, degrading: {}",
            self.authority.name(),
            stage,
            error
        );
        outcome.failures.push(AuthorityFailure {
            stage,
            message: error.to_string(),
        });
    }
}
