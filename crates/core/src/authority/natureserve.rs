//! NatureServe species service client.
//!
//! Two-step lookup: a name search resolves to an element global ID
//! ("ELEMENT_GLOBAL.2.<n>"), then the comprehensive species document for
//! that ID yields the conservation status codes we cache. The documents
//! are XML; an ID that resolves but returns an empty document is an
//! "error" outcome distinct from a name that never resolved.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{ConservationStatus, SpeciesDocResult};
use super::{AuthorityError, ConservationAuthority};

const AUTHORITY: &str = "natureserve";

/// NatureServe client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatureServeConfig {
    /// Base URL of the species service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Access key issued by NatureServe.
    pub api_key: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://services.natureserve.org/idd/rest/ns/v1.1/globalSpecies".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// NatureServe species service client.
pub struct NatureServeClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NatureServeClient {
    /// Create a new NatureServe client.
    pub fn new(config: NatureServeConfig) -> Result<Self, AuthorityError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url,
            api_key: config.api_key,
        })
    }

    async fn fetch_xml(&self, url: &str, query: &[(&str, &str)]) -> Result<String, AuthorityError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthorityError::Service {
                authority: AUTHORITY,
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ConservationAuthority for NatureServeClient {
    async fn find_global_id(&self, name: &str) -> Result<Option<String>, AuthorityError> {
        let url = format!("{}/list/nameSearch", self.base_url);
        debug!("NatureServe name search: '{}'", name);

        let xml = self
            .fetch_xml(&url, &[("NSAccessKeyId", self.api_key.as_str()), ("name", name)])
            .await?;

        let report: SpeciesSearchReport =
            quick_xml::de::from_str(&xml).map_err(|e| AuthorityError::Malformed {
                authority: AUTHORITY,
                message: e.to_string(),
            })?;

        Ok(report
            .result_list
            .and_then(|list| list.results.into_iter().next())
            .and_then(|result| result.global_species_uid))
    }

    async fn get_species(&self, element_id: &str) -> Result<SpeciesDocResult, AuthorityError> {
        let url = format!("{}/comprehensive", self.base_url);
        debug!("NatureServe species fetch: {}", element_id);

        let xml = self
            .fetch_xml(
                &url,
                &[("NSAccessKeyId", self.api_key.as_str()), ("uid", element_id)],
            )
            .await?;

        // Some IDs resolve through the search but come back with nothing
        // attached; that is a cacheable negative, not a hard failure.
        let list: GlobalSpeciesList = match quick_xml::de::from_str(&xml) {
            Ok(list) => list,
            Err(_) => return Ok(SpeciesDocResult::Empty),
        };

        let Some(species) = list.species.into_iter().next() else {
            return Ok(SpeciesDocResult::Empty);
        };

        Ok(SpeciesDocResult::Found(Box::new(extract_status(species))))
    }
}

fn extract_status(species: GlobalSpeciesXml) -> ConservationStatus {
    let mut status = ConservationStatus::default();

    let global = species
        .conservation_status
        .and_then(|cs| cs.nature_serve_status)
        .and_then(|ns| ns.global_status);
    let Some(global) = global else {
        return status;
    };

    status.global_status_rank = global.rank.and_then(|r| r.code);
    status.rounded_global_status_rank_description =
        global.rounded_rank.and_then(|r| r.description);
    status.global_status_last_reviewed = global.status_last_reviewed;

    let us = global
        .national_statuses
        .map(|n| n.entries)
        .unwrap_or_default()
        .into_iter()
        .find(|n| n.nation_code.as_deref() == Some("US"));
    let Some(us) = us else {
        return status;
    };

    status.us_national_status_rank_code = us.rank.and_then(|r| r.code);
    status.us_national_status_last_reviewed = us.status_last_reviewed;

    for sub in us
        .subnational_statuses
        .map(|s| s.entries)
        .unwrap_or_default()
    {
        if let (Some(name), Some(code)) = (sub.subnation_name, sub.rank.and_then(|r| r.code)) {
            status.state_status_codes.insert(name, code);
        }
    }

    status
}

// ============================================================================
// XML wire types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct SpeciesSearchReport {
    #[serde(rename = "speciesSearchResultList")]
    result_list: Option<SpeciesSearchResultList>,
}

#[derive(Debug, Deserialize)]
struct SpeciesSearchResultList {
    #[serde(rename = "speciesSearchResult", default)]
    results: Vec<SpeciesSearchResultXml>,
}

#[derive(Debug, Deserialize)]
struct SpeciesSearchResultXml {
    #[serde(rename = "globalSpeciesUid")]
    global_species_uid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlobalSpeciesList {
    #[serde(rename = "globalSpecies", default)]
    species: Vec<GlobalSpeciesXml>,
}

#[derive(Debug, Deserialize)]
struct GlobalSpeciesXml {
    #[serde(rename = "conservationStatus")]
    conservation_status: Option<ConservationStatusXml>,
}

#[derive(Debug, Deserialize)]
struct ConservationStatusXml {
    #[serde(rename = "natureServeStatus")]
    nature_serve_status: Option<NatureServeStatusXml>,
}

#[derive(Debug, Deserialize)]
struct NatureServeStatusXml {
    #[serde(rename = "globalStatus")]
    global_status: Option<GlobalStatusXml>,
}

#[derive(Debug, Deserialize)]
struct GlobalStatusXml {
    rank: Option<RankXml>,
    #[serde(rename = "roundedRank")]
    rounded_rank: Option<RoundedRankXml>,
    #[serde(rename = "statusLastReviewed")]
    status_last_reviewed: Option<String>,
    #[serde(rename = "nationalStatuses")]
    national_statuses: Option<NationalStatusesXml>,
}

#[derive(Debug, Deserialize)]
struct RankXml {
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoundedRankXml {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NationalStatusesXml {
    #[serde(rename = "nationalStatus", default)]
    entries: Vec<NationalStatusXml>,
}

#[derive(Debug, Deserialize)]
struct NationalStatusXml {
    #[serde(rename = "@nationCode")]
    nation_code: Option<String>,
    rank: Option<RankXml>,
    #[serde(rename = "statusLastReviewed")]
    status_last_reviewed: Option<String>,
    #[serde(rename = "subnationalStatuses")]
    subnational_statuses: Option<SubnationalStatusesXml>,
}

#[derive(Debug, Deserialize)]
struct SubnationalStatusesXml {
    #[serde(rename = "subnationalStatus", default)]
    entries: Vec<SubnationalStatusXml>,
}

#[derive(Debug, Deserialize)]
struct SubnationalStatusXml {
    #[serde(rename = "@subnationName")]
    subnation_name: Option<String>,
    rank: Option<RankXml>,
}
