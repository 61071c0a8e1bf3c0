//! Reconciliation of authority buckets into canonical record fields.
//!
//! Several authorities may have cached data for one record; downstream
//! consumers want one scientific name, one common name, one rank, one
//! group and one authority identifier. The precedence is fixed: the
//! hierarchy authority wins, the marine authority is second, and a
//! record matched by neither falls back to its cleaned submitted name
//! with explicit sentinels. Reconciliation is pure: no clock, no
//! network, same inputs, same output.

use serde::{Deserialize, Serialize};

use crate::bucket::{ItisBucket, SgcnBucket, WormsBucket};
use crate::names::clean_text;
use crate::resolver::MatchMethod;

/// Authority ID prefix for ITIS-matched records.
const ITIS_AUTHORITY_BASE: &str = "https://services.itis.gov/?q=tsn:";
/// Authority ID prefix for WoRMS-matched records.
const WORMS_AUTHORITY_BASE: &str = "http://www.marinespecies.org/rest/AphiaRecordByAphiaID/";
/// Sentinel authority ID for records no authority recognized.
const NOT_MATCHED_AUTHORITY_ID: &str = "Not Matched to Taxonomic Authority";
/// Sentinel rank for records no authority recognized.
const UNKNOWN_RANK: &str = "Unknown Taxonomic Rank";
/// Reference item documenting the 2005 SWAP national list.
const SWAP_2005_REFERENCE_URI: &str =
    "https://www.sciencebase.gov/catalog/item/56d720ece4b015c306f442d5";
/// Placeholder common name; the field is never left empty.
const NO_COMMON_NAME: &str = "no common name";
/// Placeholder taxonomic group for records without a group annotation.
const UNKNOWN_GROUP: &str = "unknown";

/// The canonical denormalized fields written onto a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalFields {
    pub scientificname: String,
    pub commonname: String,
    pub rank: String,
    pub taxonomicgroup: String,
    pub matchmethod: MatchMethod,
    pub authorityid: String,
    pub source: String,
    /// Newest `cacheDate` among the contributing buckets; lets callers
    /// decide whether a later bucket refresh requires recanonicalizing.
    #[serde(rename = "cacheDate")]
    pub cache_date: String,
}

/// Everything reconciliation reads. The source common name, when the
/// source keeps its own, is fetched by the caller beforehand so this
/// stays free of I/O.
#[derive(Debug, Clone, Default)]
pub struct ReconcileInput<'a> {
    pub submitted_name: &'a str,
    pub source: &'a str,
    pub itis: Option<&'a ItisBucket>,
    pub worms: Option<&'a WormsBucket>,
    pub sgcn: Option<&'a SgcnBucket>,
    pub source_common_name: Option<&'a str>,
}

/// Reconcile a record's buckets into one set of canonical fields.
pub fn reconcile(input: &ReconcileInput<'_>) -> CanonicalFields {
    let (scientificname, matchmethod, authorityid, rank) = pick_authority(input);

    let mut matchmethod = matchmethod;
    let mut authorityid = authorityid;

    // Records absent from current authorities but present in the 2005
    // SWAP snapshot are flagged rather than left looking never-checked.
    if input.source == "SGCN"
        && !matchmethod.is_matched()
        && input.sgcn.map(|s| s.swap2005).unwrap_or(false)
    {
        matchmethod = MatchMethod::LegacyMatch;
        authorityid = SWAP_2005_REFERENCE_URI.to_string();
    }

    CanonicalFields {
        scientificname,
        commonname: pick_common_name(input),
        rank,
        taxonomicgroup: pick_taxonomic_group(input),
        matchmethod,
        authorityid,
        source: input.source.to_string(),
        cache_date: newest_cache_date(input),
    }
}

fn pick_authority(input: &ReconcileInput<'_>) -> (String, MatchMethod, String, String) {
    if let Some(itis) = input.itis.filter(|b| b.match_method.is_matched()) {
        let tsn = itis.tsn.as_deref().unwrap_or_default();
        return (
            itis.name_w_ind.clone().unwrap_or_default(),
            itis.match_method,
            format!("{}{}", ITIS_AUTHORITY_BASE, tsn),
            itis.rank.clone().unwrap_or_default(),
        );
    }

    if let Some(worms) = input.worms.filter(|b| b.match_method.is_matched()) {
        let name = worms
            .valid_name
            .clone()
            .or_else(|| worms.scientificname.clone())
            .unwrap_or_default();
        let aphia = worms.aphia_id.map(|id| id.to_string()).unwrap_or_default();
        return (
            name,
            worms.match_method,
            format!("{}{}", WORMS_AUTHORITY_BASE, aphia),
            worms.rank.clone().unwrap_or_else(|| UNKNOWN_RANK.to_string()),
        );
    }

    (
        clean_text(input.submitted_name),
        MatchMethod::NotMatched,
        NOT_MATCHED_AUTHORITY_ID.to_string(),
        UNKNOWN_RANK.to_string(),
    )
}

/// English (or unspecified-language) vernacular from the hierarchy
/// bucket, then the source's own common name, then the placeholder.
/// Never empty, so consumers can treat the field as always present.
fn pick_common_name(input: &ReconcileInput<'_>) -> String {
    if let Some(name) = input.itis.and_then(|b| b.english_common_name()) {
        return clean_text(name);
    }
    if let Some(name) = input.source_common_name.filter(|n| !n.trim().is_empty()) {
        return clean_text(name);
    }
    NO_COMMON_NAME.to_string()
}

fn pick_taxonomic_group(input: &ReconcileInput<'_>) -> String {
    if input.source == "SGCN" {
        if let Some(sgcn) = input.sgcn {
            return sgcn.taxonomicgroup.clone();
        }
    }
    UNKNOWN_GROUP.to_string()
}

fn newest_cache_date(input: &ReconcileInput<'_>) -> String {
    let mut dates: Vec<&str> = Vec::new();
    if let Some(itis) = input.itis {
        dates.push(&itis.cache_date);
    }
    if let Some(worms) = input.worms {
        dates.push(&worms.cache_date);
    }
    if let Some(sgcn) = input.sgcn {
        dates.push(&sgcn.date_cached);
    }
    // ISO-8601 timestamps order lexicographically.
    dates.into_iter().max().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::VernacularName;
    use crate::resolver::MatchMethod;

    fn itis_bucket(method: MatchMethod) -> ItisBucket {
        let mut bucket = ItisBucket::negative(method);
        bucket.cache_date = "2017-05-01T12:00:00+00:00".to_string();
        if method.is_matched() {
            bucket.tsn = Some("180543".to_string());
            bucket.name_w_ind = Some("Ursus arctos".to_string());
            bucket.rank = Some("Species".to_string());
        }
        bucket
    }

    fn worms_bucket(method: MatchMethod) -> WormsBucket {
        let mut bucket = WormsBucket::negative(method);
        bucket.cache_date = "2017-05-02T12:00:00+00:00".to_string();
        if method.is_matched() {
            bucket.aphia_id = Some(231749);
            bucket.valid_name = Some("Ursus maritimus".to_string());
            bucket.rank = Some("Species".to_string());
        }
        bucket
    }

    #[test]
    fn test_itis_wins_over_worms() {
        let itis = itis_bucket(MatchMethod::ExactMatch);
        let worms = worms_bucket(MatchMethod::ExactMatch);
        let fields = reconcile(&ReconcileInput {
            submitted_name: "URSUS ARCTOS",
            source: "GAP Species",
            itis: Some(&itis),
            worms: Some(&worms),
            ..Default::default()
        });

        assert_eq!(fields.scientificname, "Ursus arctos");
        assert_eq!(fields.matchmethod, MatchMethod::ExactMatch);
        assert_eq!(
            fields.authorityid,
            "https://services.itis.gov/?q=tsn:180543"
        );
        assert_eq!(fields.rank, "Species");
    }

    #[test]
    fn test_worms_used_when_itis_not_matched() {
        let itis = itis_bucket(MatchMethod::NotMatched);
        let worms = worms_bucket(MatchMethod::FuzzyMatch);
        let fields = reconcile(&ReconcileInput {
            submitted_name: "Ursus maritimus",
            source: "SGCN",
            itis: Some(&itis),
            worms: Some(&worms),
            ..Default::default()
        });

        assert_eq!(fields.scientificname, "Ursus maritimus");
        assert_eq!(fields.matchmethod, MatchMethod::FuzzyMatch);
        assert_eq!(
            fields.authorityid,
            "http://www.marinespecies.org/rest/AphiaRecordByAphiaID/231749"
        );
    }

    #[test]
    fn test_fallback_to_cleaned_submitted_name() {
        let itis = itis_bucket(MatchMethod::NotMatched);
        let worms = worms_bucket(MatchMethod::NotMatched);
        let fields = reconcile(&ReconcileInput {
            submitted_name: "  Incognitus   maximus ",
            source: "SGCN",
            itis: Some(&itis),
            worms: Some(&worms),
            ..Default::default()
        });

        assert_eq!(fields.scientificname, "Incognitus maximus");
        assert_eq!(fields.matchmethod, MatchMethod::NotMatched);
        assert_eq!(fields.authorityid, "Not Matched to Taxonomic Authority");
        assert_eq!(fields.rank, "Unknown Taxonomic Rank");
    }

    #[test]
    fn test_swap2005_upgrades_to_legacy_match() {
        let itis = itis_bucket(MatchMethod::NotMatched);
        let worms = worms_bucket(MatchMethod::NotMatched);
        let sgcn = SgcnBucket::new("Mammals".to_string(), true, Default::default());
        let fields = reconcile(&ReconcileInput {
            submitted_name: "Incognitus maximus",
            source: "SGCN",
            itis: Some(&itis),
            worms: Some(&worms),
            sgcn: Some(&sgcn),
            ..Default::default()
        });

        assert_eq!(fields.matchmethod, MatchMethod::LegacyMatch);
        assert_eq!(
            fields.authorityid,
            "https://www.sciencebase.gov/catalog/item/56d720ece4b015c306f442d5"
        );
        assert_eq!(fields.taxonomicgroup, "Mammals");
    }

    #[test]
    fn test_swap2005_does_not_override_real_match() {
        let itis = itis_bucket(MatchMethod::ExactMatch);
        let sgcn = SgcnBucket::new("Mammals".to_string(), true, Default::default());
        let fields = reconcile(&ReconcileInput {
            submitted_name: "Ursus arctos",
            source: "SGCN",
            itis: Some(&itis),
            sgcn: Some(&sgcn),
            ..Default::default()
        });

        assert_eq!(fields.matchmethod, MatchMethod::ExactMatch);
        assert!(fields.authorityid.starts_with("https://services.itis.gov/"));
    }

    #[test]
    fn test_common_name_from_itis_vernacular() {
        let mut itis = itis_bucket(MatchMethod::ExactMatch);
        itis.commonnames = vec![
            VernacularName {
                name: "oso pardo".to_string(),
                language: "Spanish".to_string(),
            },
            VernacularName {
                name: "brown bear".to_string(),
                language: "English".to_string(),
            },
        ];
        let fields = reconcile(&ReconcileInput {
            submitted_name: "Ursus arctos",
            source: "GAP Species",
            itis: Some(&itis),
            ..Default::default()
        });
        assert_eq!(fields.commonname, "brown bear");
    }

    #[test]
    fn test_common_name_from_source_annotation() {
        let itis = itis_bucket(MatchMethod::NotMatched);
        let fields = reconcile(&ReconcileInput {
            submitted_name: "Incognitus maximus",
            source: "SGCN",
            itis: Some(&itis),
            source_common_name: Some("big unknown"),
            ..Default::default()
        });
        assert_eq!(fields.commonname, "big unknown");
    }

    #[test]
    fn test_common_name_placeholder() {
        let fields = reconcile(&ReconcileInput {
            submitted_name: "Incognitus maximus",
            source: "GAP Species",
            ..Default::default()
        });
        assert_eq!(fields.commonname, "no common name");
    }

    #[test]
    fn test_taxonomic_group_unknown_for_non_sgcn() {
        let sgcn = SgcnBucket::new("Mammals".to_string(), false, Default::default());
        let fields = reconcile(&ReconcileInput {
            submitted_name: "Ursus arctos",
            source: "GAP Species",
            sgcn: Some(&sgcn),
            ..Default::default()
        });
        assert_eq!(fields.taxonomicgroup, "unknown");
    }

    #[test]
    fn test_cache_date_is_newest_contributing_bucket() {
        let itis = itis_bucket(MatchMethod::ExactMatch);
        let worms = worms_bucket(MatchMethod::NotMatched);
        let fields = reconcile(&ReconcileInput {
            submitted_name: "Ursus arctos",
            source: "GAP Species",
            itis: Some(&itis),
            worms: Some(&worms),
            ..Default::default()
        });
        assert_eq!(fields.cache_date, "2017-05-02T12:00:00+00:00");
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let itis = itis_bucket(MatchMethod::ExactMatch);
        let worms = worms_bucket(MatchMethod::NotMatched);
        let input = ReconcileInput {
            submitted_name: "Ursus arctos",
            source: "SGCN",
            itis: Some(&itis),
            worms: Some(&worms),
            ..Default::default()
        };
        assert_eq!(reconcile(&input), reconcile(&input));
    }
}
