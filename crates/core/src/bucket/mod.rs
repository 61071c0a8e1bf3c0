//! Cache bucket packaging and serialization.
//!
//! Each authority's raw result is mapped into a typed, timestamped
//! bucket and written back to the registry as one column value. Two
//! write encodings exist for the same contract: JSON documents and the
//! legacy hstore-style pair lists.

mod hierarchy;
mod pairs;
mod types;

pub use hierarchy::{parse_hierarchy, parse_vernaculars, HierarchyLevel, VernacularName};
pub use pairs::{sanitize_value, PairsBuilder};
pub use types::{ItisBucket, NatureServeBucket, SgcnBucket, TessBucket, WormsBucket};

use serde::{Deserialize, Serialize};

/// The registry column a bucket is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketColumn {
    Itis,
    Worms,
    NatureServe,
    Tess,
    Sgcn,
}

impl BucketColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketColumn::Itis => "itis",
            BucketColumn::Worms => "worms",
            BucketColumn::NatureServe => "natureserve",
            BucketColumn::Tess => "tess",
            BucketColumn::Sgcn => "sgcn",
        }
    }
}

impl std::fmt::Display for BucketColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which serialization a bucket is written with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketEncoding {
    #[default]
    Json,
    HstorePairs,
}

/// Shared shape of all cache buckets.
pub trait CacheBucket: Serialize {
    /// The registry column this bucket belongs to.
    fn column(&self) -> BucketColumn;

    /// Encode as an hstore-style pair list.
    fn to_pairs(&self) -> String;

    /// Drop the bucket's known-oversized optional collection, if it has
    /// one and it is still populated. Returns whether anything was
    /// removed; used for the single write-conflict retry.
    fn strip_oversized(&mut self) -> bool;

    /// Encode with the requested serialization.
    fn encode(&self, encoding: BucketEncoding) -> Result<String, serde_json::Error> {
        match encoding {
            BucketEncoding::Json => serde_json::to_string(self),
            BucketEncoding::HstorePairs => Ok(self.to_pairs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{MatchMethod, MatchOutcome};

    #[test]
    fn test_column_names() {
        assert_eq!(BucketColumn::Itis.as_str(), "itis");
        assert_eq!(BucketColumn::NatureServe.as_str(), "natureserve");
    }

    #[test]
    fn test_encoding_default_is_json() {
        assert_eq!(BucketEncoding::default(), BucketEncoding::Json);
    }

    #[test]
    fn test_encoding_deserializes_from_config_strings() {
        let json: BucketEncoding = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(json, BucketEncoding::Json);
        let pairs: BucketEncoding = serde_json::from_str("\"hstore_pairs\"").unwrap();
        assert_eq!(pairs, BucketEncoding::HstorePairs);
    }

    #[test]
    fn test_encode_selects_serialization() {
        let outcome: MatchOutcome<crate::authority::ItisDoc> =
            MatchOutcome::not_matched("x");
        let bucket = ItisBucket::package(&outcome);

        let json = bucket.encode(BucketEncoding::Json).unwrap();
        assert!(json.starts_with('{'));

        let pairs = bucket.encode(BucketEncoding::HstorePairs).unwrap();
        assert!(pairs.starts_with("\"cacheDate\"=>"));
        assert!(pairs.contains(r#""itisMatchMethod"=>"Not Matched""#));
    }

    #[test]
    fn test_negative_outcome_uses_method_from_resolver() {
        let outcome: MatchOutcome<crate::authority::ItisDoc> =
            MatchOutcome::not_matched("anything");
        let bucket = ItisBucket::package(&outcome);
        assert_eq!(bucket.match_method, MatchMethod::NotMatched);
    }
}
