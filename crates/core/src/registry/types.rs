use serde::{Deserialize, Serialize};

use crate::bucket::{ItisBucket, SgcnBucket, WormsBucket};

/// Which registration field drives the taxonomic lookup for a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupProperty {
    #[default]
    #[serde(rename = "scientificname")]
    ScientificName,
    Tsn,
}

impl LookupProperty {
    /// Parse the registration's stored value; anything unrecognized
    /// falls back to a name lookup.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("tsn") => LookupProperty::Tsn,
            _ => LookupProperty::ScientificName,
        }
    }
}

/// One taxon registration as read from the registry, carrying whatever
/// fields the current pipeline step's query selected. Registrations are
/// created externally and never mutated here; only bucket columns and
/// the denormalized canonical fields are written back.
#[derive(Debug, Clone, Default)]
pub struct TirRecord {
    pub id: i64,
    pub source: Option<String>,
    /// Whether to chase the accepted/valid counterpart when the matched
    /// entry is not the accepted form.
    pub follow_taxonomy: bool,
    pub lookup_property: LookupProperty,
    /// The submitted scientific name.
    pub scientificname: Option<String>,
    /// The registered TSN, for identifier-driven registrations.
    pub tsn: Option<String>,
    /// Pre-registered conservation-authority element identifier (GAP
    /// registrations carry one, skipping the name search).
    pub egtid: Option<String>,
    /// Cross-reference: name-with-indicator from the cached ITIS bucket.
    pub name_itis: Option<String>,
    /// Cross-reference: valid name from the cached WoRMS bucket.
    pub name_worms: Option<String>,
    pub itis: Option<ItisBucket>,
    pub worms: Option<WormsBucket>,
    pub sgcn: Option<SgcnBucket>,
}

impl TirRecord {
    /// Every name this record is known by, submitted name first,
    /// deduplicated, for multi-name lookups.
    pub fn known_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for candidate in [
            self.scientificname.as_deref(),
            self.name_itis.as_deref(),
            self.name_worms.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            if !candidate.is_empty() && !names.iter().any(|n| n == candidate) {
                names.push(candidate.to_string());
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_property_parse() {
        assert_eq!(LookupProperty::parse(Some("tsn")), LookupProperty::Tsn);
        assert_eq!(
            LookupProperty::parse(Some("scientificname")),
            LookupProperty::ScientificName
        );
        assert_eq!(LookupProperty::parse(None), LookupProperty::ScientificName);
    }

    #[test]
    fn test_known_names_deduplicates_in_order() {
        let record = TirRecord {
            scientificname: Some("Phoca vitulina".to_string()),
            name_itis: Some("Phoca vitulina".to_string()),
            name_worms: Some("Phoca vitulina vitulina".to_string()),
            ..Default::default()
        };
        assert_eq!(
            record.known_names(),
            vec![
                "Phoca vitulina".to_string(),
                "Phoca vitulina vitulina".to_string()
            ]
        );
    }

    #[test]
    fn test_known_names_skips_missing() {
        let record = TirRecord::default();
        assert!(record.known_names().is_empty());
    }
}
