//! Typed cache buckets, one per authority, and their packaging.
//!
//! A bucket is one authority's timestamped resolution result for one
//! record. Every bucket carries `cacheDate` and a match method even when
//! nothing was found: a negative result is still a cached fact with its
//! own staleness. Serialized field names match what the registry already
//! stores, so the renames are part of the storage contract.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::hierarchy::{parse_hierarchy, parse_vernaculars, HierarchyLevel, VernacularName};
use super::pairs::PairsBuilder;
use super::{BucketColumn, CacheBucket};
use crate::authority::{AphiaRecord, ConservationStatus, ItisDoc, TessDetail};
use crate::resolver::{MatchMethod, MatchOutcome};

fn cache_timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Cached ITIS resolution result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItisBucket {
    #[serde(rename = "cacheDate")]
    pub cache_date: String,
    #[serde(rename = "MatchMethod")]
    pub match_method: MatchMethod,
    #[serde(rename = "matchString", default, skip_serializing_if = "Option::is_none")]
    pub match_string: Option<String>,
    #[serde(rename = "createDate", default, skip_serializing_if = "Option::is_none")]
    pub create_date: Option<String>,
    #[serde(rename = "updateDate", default, skip_serializing_if = "Option::is_none")]
    pub update_date: Option<String>,
    /// TSN of the record as originally discovered, before any
    /// follow-accepted replacement.
    #[serde(
        rename = "discoveredTSN",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub discovered_tsn: Option<String>,
    /// TSN of the cached record itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsn: Option<String>,
    #[serde(
        rename = "acceptedTSN",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub accepted_tsn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,
    #[serde(rename = "nameWInd", default, skip_serializing_if = "Option::is_none")]
    pub name_w_ind: Option<String>,
    #[serde(rename = "nameWOInd", default, skip_serializing_if = "Option::is_none")]
    pub name_wo_ind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hierarchy: Vec<HierarchyLevel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commonnames: Vec<VernacularName>,
}

impl ItisBucket {
    /// A bucket recording that the lookup ran and found nothing. Only
    /// `cacheDate` and the match method are present.
    pub fn negative(method: MatchMethod) -> Self {
        Self {
            cache_date: cache_timestamp(),
            match_method: method,
            match_string: None,
            create_date: None,
            update_date: None,
            discovered_tsn: None,
            tsn: None,
            accepted_tsn: None,
            rank: None,
            name_w_ind: None,
            name_wo_ind: None,
            usage: None,
            hierarchy: Vec::new(),
            commonnames: Vec::new(),
        }
    }

    /// Package a resolver outcome into a cacheable bucket.
    pub fn package(outcome: &MatchOutcome<ItisDoc>) -> Self {
        let mut bucket = Self::negative(outcome.method);
        let Some(doc) = &outcome.record else {
            return bucket;
        };

        bucket.match_string = Some(outcome.search_term.clone());
        bucket.create_date = doc.create_date.clone();
        bucket.update_date = doc.update_date.clone();
        bucket.discovered_tsn = outcome.discovered_id.clone().or_else(|| Some(doc.tsn.clone()));
        bucket.tsn = Some(doc.tsn.clone());
        bucket.accepted_tsn = doc.accepted_tsn.first().cloned();
        bucket.rank = Some(doc.rank.clone());
        bucket.name_w_ind = Some(doc.name_w_ind.clone());
        bucket.name_wo_ind = Some(doc.name_wo_ind.clone());
        bucket.usage = Some(doc.usage.clone());
        if let Some(raw) = doc.hierarchy_so_far_w_ranks.first() {
            bucket.hierarchy = parse_hierarchy(raw);
        }
        bucket.commonnames = parse_vernaculars(&doc.vernacular);
        bucket
    }

    /// First English (or language-unspecified) common name, if any.
    pub fn english_common_name(&self) -> Option<&str> {
        self.commonnames
            .iter()
            .find(|v| v.language == "English" || v.language == "unspecified")
            .map(|v| v.name.as_str())
    }
}

impl CacheBucket for ItisBucket {
    fn column(&self) -> BucketColumn {
        BucketColumn::Itis
    }

    fn to_pairs(&self) -> String {
        let mut pairs = PairsBuilder::new();
        pairs.push("cacheDate", &self.cache_date);
        pairs.push("itisMatchMethod", self.match_method.as_str());
        pairs.push_opt("matchString", self.match_string.as_deref());
        pairs.push_opt("createDate", self.create_date.as_deref());
        pairs.push_opt("updateDate", self.update_date.as_deref());
        pairs.push_opt("tsn", self.tsn.as_deref());
        pairs.push_opt("discoveredTSN", self.discovered_tsn.as_deref());
        pairs.push_opt("acceptedTSN", self.accepted_tsn.as_deref());
        pairs.push_opt("rank", self.rank.as_deref());
        pairs.push_opt("nameWInd", self.name_w_ind.as_deref());
        pairs.push_opt("nameWOInd", self.name_wo_ind.as_deref());
        pairs.push_opt("usage", self.usage.as_deref());
        for level in &self.hierarchy {
            pairs.push(&level.rank, &level.name);
        }
        for vernacular in &self.commonnames {
            pairs.push(
                &format!("vernacular:{}", vernacular.language),
                &vernacular.name,
            );
        }
        pairs.finish()
    }

    fn strip_oversized(&mut self) -> bool {
        if self.commonnames.is_empty() {
            return false;
        }
        self.commonnames.clear();
        true
    }
}

/// Cached WoRMS resolution result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WormsBucket {
    #[serde(rename = "cacheDate")]
    pub cache_date: String,
    #[serde(rename = "MatchMethod")]
    pub match_method: MatchMethod,
    #[serde(rename = "matchString", default, skip_serializing_if = "Option::is_none")]
    pub match_string: Option<String>,
    #[serde(rename = "AphiaID", default, skip_serializing_if = "Option::is_none")]
    pub aphia_id: Option<i64>,
    /// AphiaID as originally discovered, before any valid-ID follow-up.
    #[serde(
        rename = "discoveredAphiaID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub discovered_aphia_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientificname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_name: Option<String>,
    #[serde(
        rename = "valid_AphiaID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub valid_aphia_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kingdom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phylum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lsid: Option<String>,
    #[serde(rename = "isMarine", default, skip_serializing_if = "Option::is_none")]
    pub is_marine: Option<i64>,
    #[serde(rename = "isBrackish", default, skip_serializing_if = "Option::is_none")]
    pub is_brackish: Option<i64>,
    #[serde(
        rename = "isFreshwater",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_freshwater: Option<i64>,
    #[serde(
        rename = "isTerrestrial",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_terrestrial: Option<i64>,
    #[serde(rename = "isExtinct", default, skip_serializing_if = "Option::is_none")]
    pub is_extinct: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl WormsBucket {
    /// A bucket recording that the lookup ran and found nothing.
    pub fn negative(method: MatchMethod) -> Self {
        Self {
            cache_date: cache_timestamp(),
            match_method: method,
            match_string: None,
            aphia_id: None,
            discovered_aphia_id: None,
            scientificname: None,
            status: None,
            rank: None,
            valid_name: None,
            valid_aphia_id: None,
            kingdom: None,
            phylum: None,
            class: None,
            order: None,
            family: None,
            genus: None,
            lsid: None,
            is_marine: None,
            is_brackish: None,
            is_freshwater: None,
            is_terrestrial: None,
            is_extinct: None,
            match_type: None,
            modified: None,
        }
    }

    /// Package a resolver outcome into a cacheable bucket.
    pub fn package(outcome: &MatchOutcome<AphiaRecord>) -> Self {
        let mut bucket = Self::negative(outcome.method);
        let Some(record) = &outcome.record else {
            return bucket;
        };

        bucket.match_string = Some(outcome.search_term.clone());
        bucket.aphia_id = Some(record.aphia_id);
        bucket.discovered_aphia_id = outcome.discovered_id.clone();
        bucket.scientificname = Some(record.scientificname.clone());
        bucket.status = Some(record.status.clone());
        bucket.rank = record.rank.clone();
        bucket.valid_name = record.valid_name.clone();
        bucket.valid_aphia_id = record.valid_aphia_id;
        bucket.kingdom = record.kingdom.clone();
        bucket.phylum = record.phylum.clone();
        bucket.class = record.class.clone();
        bucket.order = record.order.clone();
        bucket.family = record.family.clone();
        bucket.genus = record.genus.clone();
        bucket.lsid = record.lsid.clone();
        bucket.is_marine = record.is_marine;
        bucket.is_brackish = record.is_brackish;
        bucket.is_freshwater = record.is_freshwater;
        bucket.is_terrestrial = record.is_terrestrial;
        bucket.is_extinct = record.is_extinct;
        bucket.match_type = record.match_type.clone();
        bucket.modified = record.modified.clone();
        bucket
    }
}

impl CacheBucket for WormsBucket {
    fn column(&self) -> BucketColumn {
        BucketColumn::Worms
    }

    fn to_pairs(&self) -> String {
        let mut pairs = PairsBuilder::new();
        pairs.push("cacheDate", &self.cache_date);
        pairs.push("wormsMatchMethod", self.match_method.as_str());
        pairs.push_opt("matchString", self.match_string.as_deref());
        pairs.push_opt("AphiaID", self.aphia_id.map(|v| v.to_string()).as_deref());
        pairs.push_opt("discoveredAphiaID", self.discovered_aphia_id.as_deref());
        pairs.push_opt("scientificname", self.scientificname.as_deref());
        pairs.push_opt("status", self.status.as_deref());
        pairs.push_opt("rank", self.rank.as_deref());
        pairs.push_opt("valid_name", self.valid_name.as_deref());
        pairs.push_opt(
            "valid_AphiaID",
            self.valid_aphia_id.map(|v| v.to_string()).as_deref(),
        );
        pairs.push_opt("kingdom", self.kingdom.as_deref());
        pairs.push_opt("phylum", self.phylum.as_deref());
        pairs.push_opt("class", self.class.as_deref());
        pairs.push_opt("order", self.order.as_deref());
        pairs.push_opt("family", self.family.as_deref());
        pairs.push_opt("genus", self.genus.as_deref());
        pairs.push_opt("lsid", self.lsid.as_deref());
        pairs.push_opt("isMarine", self.is_marine.map(|v| v.to_string()).as_deref());
        pairs.push_opt(
            "isBrackish",
            self.is_brackish.map(|v| v.to_string()).as_deref(),
        );
        pairs.push_opt(
            "isFreshwater",
            self.is_freshwater.map(|v| v.to_string()).as_deref(),
        );
        pairs.push_opt(
            "isTerrestrial",
            self.is_terrestrial.map(|v| v.to_string()).as_deref(),
        );
        pairs.push_opt(
            "isExtinct",
            self.is_extinct.map(|v| v.to_string()).as_deref(),
        );
        pairs.push_opt("match_type", self.match_type.as_deref());
        pairs.push_opt("modified", self.modified.as_deref());
        pairs.finish()
    }

    fn strip_oversized(&mut self) -> bool {
        false
    }
}

/// Cached NatureServe conservation-status result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatureServeBucket {
    #[serde(rename = "cacheDate")]
    pub cache_date: String,
    #[serde(rename = "MatchMethod")]
    pub match_method: MatchMethod,
    #[serde(
        rename = "elementGlobalID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub element_global_id: Option<String>,
    /// Negative-outcome tag: "Not Found" when no element ID resolved,
    /// "error" when the ID resolved but the document was empty. Absent on
    /// success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(
        rename = "GlobalStatusRank",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub global_status_rank: Option<String>,
    #[serde(
        rename = "roundedGlobalStatusRankDescription",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub rounded_global_status_rank_description: Option<String>,
    #[serde(
        rename = "globalStatusLastReviewed",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub global_status_last_reviewed: Option<String>,
    #[serde(
        rename = "usNationalStatusRankCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub us_national_status_rank_code: Option<String>,
    #[serde(
        rename = "usNationalStatusLastReviewed",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub us_national_status_last_reviewed: Option<String>,
    #[serde(
        rename = "stateStatusCodes",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub state_status_codes: BTreeMap<String, String>,
}

impl NatureServeBucket {
    /// No element global ID resolved for any of the tried names.
    pub fn not_found() -> Self {
        Self {
            cache_date: cache_timestamp(),
            match_method: MatchMethod::NotMatched,
            element_global_id: None,
            status: Some("Not Found".to_string()),
            global_status_rank: None,
            rounded_global_status_rank_description: None,
            global_status_last_reviewed: None,
            us_national_status_rank_code: None,
            us_national_status_last_reviewed: None,
            state_status_codes: BTreeMap::new(),
        }
    }

    /// The ID resolved but the status document came back empty.
    pub fn error(element_id: &str) -> Self {
        let mut bucket = Self::not_found();
        bucket.element_global_id = Some(element_id.to_string());
        bucket.status = Some("error".to_string());
        bucket
    }

    /// Package a populated status document.
    pub fn found(element_id: &str, status: &ConservationStatus) -> Self {
        Self {
            cache_date: cache_timestamp(),
            match_method: MatchMethod::ExactMatch,
            element_global_id: Some(element_id.to_string()),
            status: None,
            global_status_rank: status.global_status_rank.clone(),
            rounded_global_status_rank_description: status
                .rounded_global_status_rank_description
                .clone(),
            global_status_last_reviewed: status
                .global_status_last_reviewed
                .clone()
                .or_else(|| Some("Unknown".to_string())),
            us_national_status_rank_code: status.us_national_status_rank_code.clone(),
            us_national_status_last_reviewed: status.us_national_status_last_reviewed.clone().or(
                if status.us_national_status_rank_code.is_some() {
                    Some("Unknown".to_string())
                } else {
                    None
                },
            ),
            state_status_codes: status.state_status_codes.clone(),
        }
    }
}

impl CacheBucket for NatureServeBucket {
    fn column(&self) -> BucketColumn {
        BucketColumn::NatureServe
    }

    fn to_pairs(&self) -> String {
        let mut pairs = PairsBuilder::new();
        pairs.push("cacheDate", &self.cache_date);
        pairs.push("MatchMethod", self.match_method.as_str());
        pairs.push_opt("elementGlobalID", self.element_global_id.as_deref());
        pairs.push_opt("status", self.status.as_deref());
        pairs.push_opt("GlobalStatusRank", self.global_status_rank.as_deref());
        pairs.push_opt(
            "roundedGlobalStatusRankDescription",
            self.rounded_global_status_rank_description.as_deref(),
        );
        pairs.push_opt(
            "globalStatusLastReviewed",
            self.global_status_last_reviewed.as_deref(),
        );
        pairs.push_opt(
            "usNationalStatusRankCode",
            self.us_national_status_rank_code.as_deref(),
        );
        pairs.push_opt(
            "usNationalStatusLastReviewed",
            self.us_national_status_last_reviewed.as_deref(),
        );
        for (state, code) in &self.state_status_codes {
            pairs.push(&format!("StateCode:{}", state), code);
        }
        pairs.finish()
    }

    fn strip_oversized(&mut self) -> bool {
        if self.state_status_codes.is_empty() {
            return false;
        }
        self.state_status_codes.clear();
        true
    }
}

/// Cached TESS listing result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TessBucket {
    #[serde(rename = "cacheDate")]
    pub cache_date: String,
    #[serde(rename = "MatchMethod")]
    pub match_method: MatchMethod,
    /// TSN the query ran with (discovered or accepted).
    pub tsn: String,
    /// "success", "none" or "error".
    pub result: String,
    #[serde(rename = "entityId", default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(
        rename = "SpeciesCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub species_code: Option<String>,
    #[serde(rename = "CommonName", default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    #[serde(
        rename = "PopulationDescription",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub population_description: Option<String>,
    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "StatusText", default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(
        rename = "ListingDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub listing_date: Option<String>,
}

impl TessBucket {
    fn base(tsn: &str, result: &str, method: MatchMethod) -> Self {
        Self {
            cache_date: cache_timestamp(),
            match_method: method,
            tsn: tsn.to_string(),
            result: result.to_string(),
            entity_id: None,
            species_code: None,
            common_name: None,
            population_description: None,
            status: None,
            status_text: None,
            listing_date: None,
        }
    }

    /// No listing exists for this TSN.
    pub fn none(tsn: &str) -> Self {
        Self::base(tsn, "none", MatchMethod::NotMatched)
    }

    /// The service response could not be read.
    pub fn error(tsn: &str) -> Self {
        Self::base(tsn, "error", MatchMethod::NotMatched)
    }

    /// Package a listing detail.
    pub fn found(tsn: &str, detail: &TessDetail) -> Self {
        let mut bucket = Self::base(tsn, "success", MatchMethod::TsnQuery);
        bucket.entity_id = Some(detail.entity_id.clone());
        bucket.species_code = Some(detail.species_code.clone());
        bucket.common_name = Some(detail.common_name.clone());
        bucket.population_description = Some(detail.population_description.clone());
        bucket.status = Some(detail.status.clone());
        bucket.status_text = Some(detail.status_text.clone());
        bucket.listing_date = detail.listing_date.clone();
        bucket
    }
}

impl CacheBucket for TessBucket {
    fn column(&self) -> BucketColumn {
        BucketColumn::Tess
    }

    fn to_pairs(&self) -> String {
        let mut pairs = PairsBuilder::new();
        pairs.push("cacheDate", &self.cache_date);
        pairs.push("MatchMethod", self.match_method.as_str());
        pairs.push("tsn", &self.tsn);
        pairs.push("result", &self.result);
        pairs.push_opt("entityId", self.entity_id.as_deref());
        pairs.push_opt("SpeciesCode", self.species_code.as_deref());
        pairs.push_opt("CommonName", self.common_name.as_deref());
        pairs.push_opt(
            "PopulationDescription",
            self.population_description.as_deref(),
        );
        pairs.push_opt("Status", self.status.as_deref());
        pairs.push_opt("StatusText", self.status_text.as_deref());
        pairs.push_opt("ListingDate", self.listing_date.as_deref());
        pairs.finish()
    }

    fn strip_oversized(&mut self) -> bool {
        false
    }
}

/// SGCN source annotation bucket.
///
/// Not an authority cache: carries the taxonomic-group alignment, the
/// 2005 SWAP reference flag and the per-year state lists for records
/// registered from the SGCN source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgcnBucket {
    #[serde(rename = "dateCached")]
    pub date_cached: String,
    pub taxonomicgroup: String,
    pub swap2005: bool,
    #[serde(
        rename = "stateLists",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub state_lists: BTreeMap<String, Vec<String>>,
}

impl SgcnBucket {
    pub fn new(
        taxonomic_group: String,
        swap2005: bool,
        state_lists: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            date_cached: cache_timestamp(),
            taxonomicgroup: taxonomic_group,
            swap2005,
            state_lists,
        }
    }
}

impl CacheBucket for SgcnBucket {
    fn column(&self) -> BucketColumn {
        BucketColumn::Sgcn
    }

    fn to_pairs(&self) -> String {
        let mut pairs = PairsBuilder::new();
        pairs.push("dateCached", &self.date_cached);
        pairs.push("taxonomicgroup", &self.taxonomicgroup);
        pairs.push("swap2005", if self.swap2005 { "true" } else { "false" });
        for (year, states) in &self.state_lists {
            pairs.push(&format!("stateList:{}", year), &states.join(","));
        }
        pairs.finish()
    }

    fn strip_oversized(&mut self) -> bool {
        if self.state_lists.is_empty() {
            return false;
        }
        self.state_lists.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::MatchOutcome;

    fn sample_doc() -> ItisDoc {
        ItisDoc {
            tsn: "180543".to_string(),
            name_w_ind: "Ursus arctos".to_string(),
            name_wo_ind: "Ursus arctos".to_string(),
            usage: "valid".to_string(),
            rank: "Species".to_string(),
            accepted_tsn: vec![],
            create_date: Some("1996-06-13 14:51:08".to_string()),
            update_date: Some("2014-03-25".to_string()),
            hierarchy_so_far_w_ranks: vec![
                "180543:$Kingdom:Animalia$Phylum:Chordata$Species:Ursus arctos$".to_string(),
            ],
            vernacular: vec![
                "$brown bear$English$".to_string(),
                "$oso pardo$Spanish$".to_string(),
            ],
        }
    }

    #[test]
    fn test_negative_bucket_has_only_cache_date_and_method() {
        let bucket = ItisBucket::negative(MatchMethod::NotMatched);
        let value = serde_json::to_value(&bucket).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert!(object.contains_key("cacheDate"));
        assert_eq!(object["MatchMethod"], "Not Matched");
    }

    #[test]
    fn test_packaged_bucket_carries_authority_fields() {
        let outcome = MatchOutcome {
            method: MatchMethod::ExactMatch,
            record: Some(sample_doc()),
            search_term: "Ursus arctos".to_string(),
            discovered_id: Some("180543".to_string()),
            failures: vec![],
        };
        let bucket = ItisBucket::package(&outcome);
        assert_eq!(bucket.match_method, MatchMethod::ExactMatch);
        assert_eq!(bucket.tsn.as_deref(), Some("180543"));
        assert_eq!(bucket.rank.as_deref(), Some("Species"));
        assert_eq!(bucket.hierarchy.len(), 3);
        assert_eq!(bucket.commonnames.len(), 2);
        assert_eq!(bucket.english_common_name(), Some("brown bear"));
    }

    #[test]
    fn test_followed_outcome_keeps_discovered_tsn() {
        let outcome = MatchOutcome {
            method: MatchMethod::FollowedAccepted,
            record: Some(sample_doc()),
            search_term: "Ursus arctos".to_string(),
            discovered_id: Some("999".to_string()),
            failures: vec![],
        };
        let bucket = ItisBucket::package(&outcome);
        assert_eq!(bucket.discovered_tsn.as_deref(), Some("999"));
        assert_eq!(bucket.tsn.as_deref(), Some("180543"));
    }

    #[test]
    fn test_itis_pairs_include_hierarchy_and_vernaculars() {
        let outcome = MatchOutcome {
            method: MatchMethod::ExactMatch,
            record: Some(sample_doc()),
            search_term: "Ursus arctos".to_string(),
            discovered_id: Some("180543".to_string()),
            failures: vec![],
        };
        let pairs = ItisBucket::package(&outcome).to_pairs();
        assert!(pairs.contains(r#""itisMatchMethod"=>"Exact Match""#));
        assert!(pairs.contains(r#""Kingdom"=>"Animalia""#));
        assert!(pairs.contains(r#""vernacular:English"=>"brown bear""#));
        assert!(pairs.contains(r#""vernacular:Spanish"=>"oso pardo""#));
    }

    #[test]
    fn test_strip_oversized_drops_vernaculars_once() {
        let outcome = MatchOutcome {
            method: MatchMethod::ExactMatch,
            record: Some(sample_doc()),
            search_term: "Ursus arctos".to_string(),
            discovered_id: None,
            failures: vec![],
        };
        let mut bucket = ItisBucket::package(&outcome);
        assert!(bucket.strip_oversized());
        assert!(bucket.commonnames.is_empty());
        assert!(!bucket.strip_oversized());
        // The hierarchy survives the strip.
        assert!(!bucket.hierarchy.is_empty());
    }

    #[test]
    fn test_worms_negative_bucket_shape() {
        let bucket = WormsBucket::negative(MatchMethod::NotMatched);
        let value = serde_json::to_value(&bucket).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_natureserve_not_found_and_error_are_distinct() {
        let not_found = NatureServeBucket::not_found();
        assert_eq!(not_found.status.as_deref(), Some("Not Found"));
        assert!(not_found.element_global_id.is_none());

        let error = NatureServeBucket::error("ELEMENT_GLOBAL.2.1");
        assert_eq!(error.status.as_deref(), Some("error"));
        assert_eq!(error.element_global_id.as_deref(), Some("ELEMENT_GLOBAL.2.1"));
    }

    #[test]
    fn test_tess_bucket_json_round_trip() {
        let detail = TessDetail {
            entity_id: "39".to_string(),
            species_code: "A001".to_string(),
            common_name: "Gray wolf".to_string(),
            population_description: "Wherever found".to_string(),
            status: "E".to_string(),
            status_text: "Endangered".to_string(),
            listing_date: Some("1975-01-04".to_string()),
        };
        let bucket = TessBucket::found("180596", &detail);
        let json = serde_json::to_string(&bucket).unwrap();
        let parsed: TessBucket = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.result, "success");
        assert_eq!(parsed.common_name.as_deref(), Some("Gray wolf"));
        assert_eq!(parsed.match_method, MatchMethod::TsnQuery);
    }

    #[test]
    fn test_sgcn_bucket_pairs() {
        let mut state_lists = BTreeMap::new();
        state_lists.insert(
            "2005".to_string(),
            vec!["Montana".to_string(), "Idaho".to_string()],
        );
        let bucket = SgcnBucket::new("Mammals".to_string(), true, state_lists);
        let pairs = bucket.to_pairs();
        assert!(pairs.contains(r#""taxonomicgroup"=>"Mammals""#));
        assert!(pairs.contains(r#""swap2005"=>"true""#));
        assert!(pairs.contains(r#""stateList:2005"=>"Montana,Idaho""#));
    }
}
