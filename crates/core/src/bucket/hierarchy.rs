//! Parsing of the ITIS hierarchy and vernacular wire formats.
//!
//! The Solr service packs the ranked hierarchy into one delimited string,
//! "tsn:$Rank:Name$Rank:Name$...$", and vernacular names into
//! "$name$language$" entries. Both get unpacked into ordered, typed
//! structures before caching.

use serde::{Deserialize, Serialize};

/// One level of a ranked taxonomic hierarchy, top-down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyLevel {
    pub rank: String,
    pub name: String,
}

/// A language-tagged common name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VernacularName {
    pub name: String,
    pub language: String,
}

/// Split a raw ranked-hierarchy string into ordered (rank, name) pairs,
/// discarding the leading TSN sentinel segment and the trailing
/// delimiter.
pub fn parse_hierarchy(raw: &str) -> Vec<HierarchyLevel> {
    let body = match raw.find(":$") {
        Some(idx) => &raw[idx + 2..],
        None => raw,
    };
    let body = body.strip_suffix('$').unwrap_or(body);

    body.split('$')
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| segment.split_once(':'))
        .map(|(rank, name)| HierarchyLevel {
            rank: rank.to_string(),
            name: name.to_string(),
        })
        .collect()
}

/// Unpack "$name$language$" vernacular entries. Every language variant
/// is preserved; filtering to English happens at reconciliation, not
/// here.
pub fn parse_vernaculars(entries: &[String]) -> Vec<VernacularName> {
    entries
        .iter()
        .filter_map(|entry| {
            let parts: Vec<&str> = entry.split('$').collect();
            if parts.len() < 3 || parts[1].is_empty() {
                return None;
            }
            Some(VernacularName {
                name: parts[1].to_string(),
                language: parts[2].to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hierarchy_drops_sentinel_and_preserves_order() {
        let raw = "180543:$Kingdom:Animalia$Phylum:Chordata$Class:Mammalia$Species:Ursus arctos$";
        let levels = parse_hierarchy(raw);
        assert_eq!(levels.len(), 4);
        assert_eq!(levels[0].rank, "Kingdom");
        assert_eq!(levels[0].name, "Animalia");
        assert_eq!(levels[3].rank, "Species");
        assert_eq!(levels[3].name, "Ursus arctos");
    }

    #[test]
    fn test_parse_hierarchy_without_sentinel() {
        let levels = parse_hierarchy("Kingdom:Animalia$Phylum:Chordata$");
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[1].rank, "Phylum");
    }

    #[test]
    fn test_parse_hierarchy_empty() {
        assert!(parse_hierarchy("").is_empty());
    }

    #[test]
    fn test_parse_vernaculars_all_languages_kept() {
        let entries = vec![
            "$brown bear$English$".to_string(),
            "$oso pardo$Spanish$".to_string(),
            "$ours brun$French$".to_string(),
        ];
        let names = parse_vernaculars(&entries);
        assert_eq!(names.len(), 3);
        assert_eq!(names[0].name, "brown bear");
        assert_eq!(names[0].language, "English");
        assert_eq!(names[1].language, "Spanish");
    }

    #[test]
    fn test_parse_vernaculars_skips_malformed_entries() {
        let entries = vec!["no delimiters".to_string(), "$only name".to_string()];
        assert!(parse_vernaculars(&entries).is_empty());
    }
}
