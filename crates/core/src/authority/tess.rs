//! TESS (Threatened and Endangered Species System) client.
//!
//! Listing lookups run an XQuery against the TESS service keyed by TSN.
//! An empty `<results/>` element means the taxon carries no federal
//! listing ("none"); a document that cannot be read is cached as "error"
//! so the two negatives stay distinguishable downstream.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{TessDetail, TessOutcome};
use super::{AuthorityError, ListingAuthority};

const AUTHORITY: &str = "tess";

/// TESS client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TessConfig {
    /// Base URL of the query endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://ecos.fws.gov/ecp0/TessQuery".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for TessConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

/// TESS service client.
pub struct TessClient {
    client: Client,
    base_url: String,
}

impl TessClient {
    /// Create a new TESS client.
    pub fn new(config: TessConfig) -> Result<Self, AuthorityError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }
}

#[async_trait]
impl ListingAuthority for TessClient {
    async fn query_by_tsn(&self, tsn: &str) -> Result<TessOutcome, AuthorityError> {
        let xquery = format!("/SPECIES_DETAIL[TSN={}]", tsn);
        debug!("TESS query: {}", xquery);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("request", "query"), ("xquery", xquery.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthorityError::Service {
                authority: AUTHORITY,
                status: status.as_u16(),
            });
        }

        let xml = response.text().await?;
        Ok(parse_results(&xml))
    }
}

/// Interpret a TESS results document. Parsing problems yield
/// [`TessOutcome::Error`] rather than an `Err`: the malformed response is
/// itself a cacheable fact about the lookup.
fn parse_results(xml: &str) -> TessOutcome {
    let results: TessResults = match quick_xml::de::from_str(xml) {
        Ok(results) => results,
        Err(_) => return TessOutcome::Error,
    };

    let Some(detail) = results.species_detail.into_iter().next() else {
        return TessOutcome::None;
    };

    match detail.into_detail() {
        Some(detail) => TessOutcome::Found(Box::new(detail)),
        None => TessOutcome::Error,
    }
}

// ============================================================================
// XML wire types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TessResults {
    #[serde(rename = "SPECIES_DETAIL", default)]
    species_detail: Vec<SpeciesDetailXml>,
}

#[derive(Debug, Deserialize)]
struct SpeciesDetailXml {
    #[serde(rename = "ENTITY_ID")]
    entity_id: Option<String>,
    #[serde(rename = "SPCODE")]
    spcode: Option<String>,
    #[serde(rename = "COMNAME")]
    comname: Option<String>,
    #[serde(rename = "POP_DESC")]
    pop_desc: Option<String>,
    #[serde(rename = "STATUS")]
    status: Option<String>,
    #[serde(rename = "STATUS_TEXT")]
    status_text: Option<String>,
    #[serde(rename = "LISTING_DATE")]
    listing_date: Option<String>,
}

impl SpeciesDetailXml {
    /// A detail document missing any of the always-present fields is
    /// treated as malformed.
    fn into_detail(self) -> Option<TessDetail> {
        Some(TessDetail {
            entity_id: self.entity_id?,
            species_code: self.spcode?,
            common_name: self.comname?,
            population_description: self.pop_desc?,
            status: self.status?,
            status_text: self.status_text?,
            listing_date: self.listing_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_results_is_none() {
        assert!(matches!(parse_results("<results/>"), TessOutcome::None));
    }

    #[test]
    fn test_parse_detail() {
        let xml = r#"
<results>
  <SPECIES_DETAIL>
    <ENTITY_ID>39</ENTITY_ID>
    <SPCODE>A001</SPCODE>
    <COMNAME>Gray wolf</COMNAME>
    <POP_DESC>Wherever found, except where listed as an experimental population</POP_DESC>
    <STATUS>E</STATUS>
    <STATUS_TEXT>Endangered</STATUS_TEXT>
    <LISTING_DATE>1975-01-04</LISTING_DATE>
  </SPECIES_DETAIL>
</results>"#;
        match parse_results(xml) {
            TessOutcome::Found(detail) => {
                assert_eq!(detail.entity_id, "39");
                assert_eq!(detail.common_name, "Gray wolf");
                assert_eq!(detail.status, "E");
                assert_eq!(detail.listing_date.as_deref(), Some("1975-01-04"));
            }
            other => panic!("expected a listing detail, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_detail_without_listing_date() {
        let xml = r#"
<results>
  <SPECIES_DETAIL>
    <ENTITY_ID>1</ENTITY_ID>
    <SPCODE>X001</SPCODE>
    <COMNAME>Test species</COMNAME>
    <POP_DESC>Wherever found</POP_DESC>
    <STATUS>T</STATUS>
    <STATUS_TEXT>Threatened</STATUS_TEXT>
  </SPECIES_DETAIL>
</results>"#;
        match parse_results(xml) {
            TessOutcome::Found(detail) => assert!(detail.listing_date.is_none()),
            other => panic!("expected a listing detail, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_incomplete_detail_is_error() {
        let xml = r#"
<results>
  <SPECIES_DETAIL>
    <ENTITY_ID>39</ENTITY_ID>
  </SPECIES_DETAIL>
</results>"#;
        assert!(matches!(parse_results(xml), TessOutcome::Error));
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(matches!(parse_results("not xml at all"), TessOutcome::Error));
    }
}
