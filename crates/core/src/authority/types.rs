use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::MatchCandidate;

/// A document from the ITIS Solr service.
///
/// Field names mirror the service's own schema so the struct deserializes
/// straight off the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItisDoc {
    pub tsn: String,
    #[serde(rename = "nameWInd")]
    pub name_w_ind: String,
    #[serde(rename = "nameWOInd")]
    pub name_wo_ind: String,
    /// Usage tag: "valid", "accepted", "not accepted" or "invalid".
    pub usage: String,
    pub rank: String,
    /// TSN of the accepted counterpart; present only on non-accepted
    /// records. The service returns this as a list.
    #[serde(rename = "acceptedTSN", default)]
    pub accepted_tsn: Vec<String>,
    #[serde(rename = "createDate", default)]
    pub create_date: Option<String>,
    #[serde(rename = "updateDate", default)]
    pub update_date: Option<String>,
    /// Ranked hierarchy strings, "tsn:$Rank:Name$Rank:Name$...$".
    #[serde(rename = "hierarchySoFarWRanks", default)]
    pub hierarchy_so_far_w_ranks: Vec<String>,
    /// Vernacular name strings, "$name$language$...".
    #[serde(default)]
    pub vernacular: Vec<String>,
}

impl MatchCandidate for ItisDoc {
    fn record_id(&self) -> String {
        self.tsn.clone()
    }

    fn is_accepted(&self) -> bool {
        !matches!(self.usage.as_str(), "not accepted" | "invalid")
    }

    fn accepted_id(&self) -> Option<String> {
        self.accepted_tsn.first().cloned()
    }
}

/// A record from the WoRMS REST service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AphiaRecord {
    #[serde(rename = "AphiaID")]
    pub aphia_id: i64,
    pub scientificname: String,
    /// Status tag; "accepted" marks the valid form.
    pub status: String,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub valid_name: Option<String>,
    #[serde(rename = "valid_AphiaID", default)]
    pub valid_aphia_id: Option<i64>,
    #[serde(default)]
    pub kingdom: Option<String>,
    #[serde(default)]
    pub phylum: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub genus: Option<String>,
    #[serde(default)]
    pub lsid: Option<String>,
    #[serde(rename = "isMarine", default)]
    pub is_marine: Option<i64>,
    #[serde(rename = "isBrackish", default)]
    pub is_brackish: Option<i64>,
    #[serde(rename = "isFreshwater", default)]
    pub is_freshwater: Option<i64>,
    #[serde(rename = "isTerrestrial", default)]
    pub is_terrestrial: Option<i64>,
    #[serde(rename = "isExtinct", default)]
    pub is_extinct: Option<i64>,
    #[serde(default)]
    pub match_type: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
}

impl MatchCandidate for AphiaRecord {
    fn record_id(&self) -> String {
        self.aphia_id.to_string()
    }

    fn is_accepted(&self) -> bool {
        self.status == "accepted" || self.valid_aphia_id == Some(self.aphia_id)
    }

    fn accepted_id(&self) -> Option<String> {
        self.valid_aphia_id.map(|id| id.to_string())
    }
}

/// Outcome of fetching a conservation-status document by element ID.
#[derive(Debug, Clone)]
pub enum SpeciesDocResult {
    /// The service returned a populated status document.
    Found(Box<ConservationStatus>),
    /// The ID resolved but the document came back empty or unreadable.
    /// Cached as an "error" status, distinct from "Not Found".
    Empty,
}

/// Conservation status fields extracted from the NatureServe document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConservationStatus {
    pub global_status_rank: Option<String>,
    pub rounded_global_status_rank_description: Option<String>,
    pub global_status_last_reviewed: Option<String>,
    pub us_national_status_rank_code: Option<String>,
    pub us_national_status_last_reviewed: Option<String>,
    /// Subnational (US state) status codes keyed by state name.
    pub state_status_codes: BTreeMap<String, String>,
}

/// Outcome of a TESS listing lookup.
#[derive(Debug, Clone)]
pub enum TessOutcome {
    /// The service returned an empty results element: nothing listed.
    None,
    /// The service returned a document that could not be read.
    Error,
    /// A listing detail was found.
    Found(Box<TessDetail>),
}

/// Listing detail fields from a TESS `SPECIES_DETAIL` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TessDetail {
    pub entity_id: String,
    pub species_code: String,
    pub common_name: String,
    pub population_description: String,
    pub status: String,
    pub status_text: String,
    pub listing_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_itis_doc_accepted_usage() {
        let doc = ItisDoc {
            tsn: "180543".to_string(),
            name_w_ind: "Ursus arctos".to_string(),
            name_wo_ind: "Ursus arctos".to_string(),
            usage: "valid".to_string(),
            rank: "Species".to_string(),
            accepted_tsn: vec![],
            create_date: None,
            update_date: None,
            hierarchy_so_far_w_ranks: vec![],
            vernacular: vec![],
        };
        assert!(doc.is_accepted());
        assert_eq!(doc.accepted_id(), None);
        assert_eq!(doc.record_id(), "180543");
    }

    #[test]
    fn test_itis_doc_invalid_usage() {
        let doc = ItisDoc {
            tsn: "1".to_string(),
            name_w_ind: "x".to_string(),
            name_wo_ind: "x".to_string(),
            usage: "invalid".to_string(),
            rank: "Species".to_string(),
            accepted_tsn: vec!["2".to_string()],
            create_date: None,
            update_date: None,
            hierarchy_so_far_w_ranks: vec![],
            vernacular: vec![],
        };
        assert!(!doc.is_accepted());
        assert_eq!(doc.accepted_id(), Some("2".to_string()));
    }

    #[test]
    fn test_aphia_record_deserializes_from_service_json() {
        let json = r#"{
            "AphiaID": 137087,
            "scientificname": "Phoca vitulina",
            "status": "accepted",
            "rank": "Species",
            "valid_name": "Phoca vitulina",
            "valid_AphiaID": 137087,
            "kingdom": "Animalia",
            "isMarine": 1,
            "isExtinct": null,
            "match_type": "exact",
            "modified": "2021-03-11T07:27:49.843Z"
        }"#;
        let record: AphiaRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.aphia_id, 137087);
        assert!(record.is_accepted());
        assert_eq!(record.is_marine, Some(1));
        assert_eq!(record.is_extinct, None);
    }

    #[test]
    fn test_aphia_record_unaccepted_points_at_valid() {
        let json = r#"{
            "AphiaID": 344089,
            "scientificname": "Clupea pallasii pallasii",
            "status": "unaccepted",
            "valid_AphiaID": 293567
        }"#;
        let record: AphiaRecord = serde_json::from_str(json).unwrap();
        assert!(!record.is_accepted());
        assert_eq!(record.accepted_id(), Some("293567".to_string()));
    }
}
