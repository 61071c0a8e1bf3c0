use std::fmt;

use serde::{Deserialize, Serialize};

/// How a record was (or was not) matched to an authority.
///
/// The serialized forms are the strings stored in cache buckets and the
/// registry's denormalized columns, so renames here are load-bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMethod {
    #[serde(rename = "Not Matched")]
    NotMatched,
    #[serde(rename = "Exact Match")]
    ExactMatch,
    #[serde(rename = "Fuzzy Match")]
    FuzzyMatch,
    #[serde(rename = "Followed Accepted TSN")]
    FollowedAccepted,
    #[serde(rename = "TSN Query")]
    TsnQuery,
    #[serde(rename = "Legacy Match")]
    LegacyMatch,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::NotMatched => "Not Matched",
            MatchMethod::ExactMatch => "Exact Match",
            MatchMethod::FuzzyMatch => "Fuzzy Match",
            MatchMethod::FollowedAccepted => "Followed Accepted TSN",
            MatchMethod::TsnQuery => "TSN Query",
            MatchMethod::LegacyMatch => "Legacy Match",
        }
    }

    /// Anything but `NotMatched` counts as a match for precedence checks.
    pub fn is_matched(&self) -> bool {
        !matches!(self, MatchMethod::NotMatched)
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which resolver step a degraded authority call belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    Exact,
    Fuzzy,
    FollowAccepted,
    Identifier,
}

impl fmt::Display for SearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchStage::Exact => "exact",
            SearchStage::Fuzzy => "fuzzy",
            SearchStage::FollowAccepted => "follow-accepted",
            SearchStage::Identifier => "identifier",
        };
        f.write_str(s)
    }
}

/// An authority failure the resolver degraded into a fallback step.
/// Reported upward for the caller to decide on retry; never thrown.
#[derive(Debug, Clone)]
pub struct AuthorityFailure {
    pub stage: SearchStage,
    pub message: String,
}

/// The resolver's terminal result for one record.
///
/// There is no error terminal state: authority failures degrade to
/// `NotMatched` and are carried in `failures`.
#[derive(Debug, Clone)]
pub struct MatchOutcome<R> {
    pub method: MatchMethod,
    pub record: Option<R>,
    /// The search string that was actually sent to the authority.
    pub search_term: String,
    /// The identifier of the record as originally discovered, before any
    /// follow-accepted replacement.
    pub discovered_id: Option<String>,
    pub failures: Vec<AuthorityFailure>,
}

impl<R> MatchOutcome<R> {
    /// A terminal negative outcome.
    pub fn not_matched(search_term: impl Into<String>) -> Self {
        Self {
            method: MatchMethod::NotMatched,
            record: None,
            search_term: search_term.into(),
            discovered_id: None,
            failures: Vec::new(),
        }
    }

    /// Whether any authority call failed and was degraded along the way.
    pub fn degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_method_storage_strings() {
        assert_eq!(MatchMethod::NotMatched.as_str(), "Not Matched");
        assert_eq!(MatchMethod::ExactMatch.as_str(), "Exact Match");
        assert_eq!(MatchMethod::FuzzyMatch.as_str(), "Fuzzy Match");
        assert_eq!(
            MatchMethod::FollowedAccepted.as_str(),
            "Followed Accepted TSN"
        );
        assert_eq!(MatchMethod::TsnQuery.as_str(), "TSN Query");
        assert_eq!(MatchMethod::LegacyMatch.as_str(), "Legacy Match");
    }

    #[test]
    fn test_match_method_serde_round_trip() {
        let json = serde_json::to_string(&MatchMethod::FollowedAccepted).unwrap();
        assert_eq!(json, "\"Followed Accepted TSN\"");
        let parsed: MatchMethod = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, MatchMethod::FollowedAccepted);
    }

    #[test]
    fn test_is_matched() {
        assert!(!MatchMethod::NotMatched.is_matched());
        assert!(MatchMethod::ExactMatch.is_matched());
        assert!(MatchMethod::LegacyMatch.is_matched());
    }

    #[test]
    fn test_not_matched_outcome() {
        let outcome: MatchOutcome<()> = MatchOutcome::not_matched("Ursus arctos");
        assert_eq!(outcome.method, MatchMethod::NotMatched);
        assert!(outcome.record.is_none());
        assert!(!outcome.degraded());
    }
}
