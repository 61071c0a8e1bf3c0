//! ITIS Solr service client.
//!
//! The service is a plain Solr index over the ITIS taxonomy. Exact
//! searches query a name field with escaped spaces; fuzzy searches append
//! an edit-distance suffix to the same query; TSN lookups query the `tsn`
//! field directly.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::ItisDoc;
use super::{AuthorityError, TaxonAuthority};
use crate::names::LookupField;

const AUTHORITY: &str = "itis";

/// ITIS client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItisConfig {
    /// Base URL of the Solr service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Edit-distance suffix appended for fuzzy searches.
    #[serde(default = "default_fuzzy_level")]
    pub fuzzy_level: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://services.itis.gov/".to_string()
}

fn default_fuzzy_level() -> String {
    "~0.5".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ItisConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            fuzzy_level: default_fuzzy_level(),
            timeout_secs: default_timeout(),
        }
    }
}

/// ITIS Solr service client.
pub struct ItisClient {
    client: Client,
    base_url: String,
    fuzzy_level: String,
}

impl ItisClient {
    /// Create a new ITIS client.
    pub fn new(config: ItisConfig) -> Result<Self, AuthorityError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url,
            fuzzy_level: config.fuzzy_level,
        })
    }

    fn solr_field(field: LookupField) -> &'static str {
        match field {
            LookupField::NameWithoutIndicator => "nameWOInd",
            LookupField::NameWithIndicator => "nameWInd",
        }
    }

    /// Build a Solr query value, escaping spaces so multi-word names are
    /// matched as one term.
    fn query_value(field: &str, term: &str) -> String {
        format!("{}:{}", field, term.replace(' ', "\\ "))
    }

    async fn run_query(&self, q: String) -> Result<Vec<ItisDoc>, AuthorityError> {
        debug!("ITIS query: {}", q);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("wt", "json"), ("rows", "10"), ("q", q.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthorityError::Service {
                authority: AUTHORITY,
                status: status.as_u16(),
            });
        }

        let envelope: SolrEnvelope =
            response
                .json()
                .await
                .map_err(|e| AuthorityError::Malformed {
                    authority: AUTHORITY,
                    message: e.to_string(),
                })?;

        Ok(envelope.response.docs)
    }
}

#[async_trait]
impl TaxonAuthority for ItisClient {
    type Record = ItisDoc;

    fn name(&self) -> &'static str {
        AUTHORITY
    }

    async fn search_exact(
        &self,
        term: &str,
        field: LookupField,
    ) -> Result<Vec<ItisDoc>, AuthorityError> {
        let q = Self::query_value(Self::solr_field(field), term);
        self.run_query(q).await
    }

    async fn search_fuzzy(
        &self,
        term: &str,
        field: LookupField,
    ) -> Result<Vec<ItisDoc>, AuthorityError> {
        let q = format!(
            "{}{}",
            Self::query_value(Self::solr_field(field), term),
            self.fuzzy_level
        );
        self.run_query(q).await
    }

    async fn search_by_id(&self, id: &str) -> Result<Option<ItisDoc>, AuthorityError> {
        let docs = self.run_query(format!("tsn:{}", id)).await?;
        Ok(docs.into_iter().next())
    }
}

// ============================================================================
// Solr response envelope (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct SolrEnvelope {
    response: SolrResponse,
}

#[derive(Debug, Deserialize)]
struct SolrResponse {
    #[serde(rename = "numFound", default)]
    #[allow(dead_code)]
    num_found: u64,
    #[serde(default)]
    docs: Vec<ItisDoc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_value_escapes_spaces() {
        assert_eq!(
            ItisClient::query_value("nameWOInd", "Ursus arctos"),
            "nameWOInd:Ursus\\ arctos"
        );
    }

    #[test]
    fn test_solr_field_selection() {
        assert_eq!(
            ItisClient::solr_field(LookupField::NameWithoutIndicator),
            "nameWOInd"
        );
        assert_eq!(
            ItisClient::solr_field(LookupField::NameWithIndicator),
            "nameWInd"
        );
    }

    #[test]
    fn test_envelope_parses_solr_response() {
        let json = r#"{
            "responseHeader": {"status": 0},
            "response": {
                "numFound": 1,
                "start": 0,
                "docs": [{
                    "tsn": "180543",
                    "nameWInd": "Ursus arctos",
                    "nameWOInd": "Ursus arctos",
                    "usage": "valid",
                    "rank": "Species",
                    "createDate": "1996-06-13 14:51:08",
                    "updateDate": "2014-03-25",
                    "hierarchySoFarWRanks": [
                        "180543:$Kingdom:Animalia$Phylum:Chordata$Species:Ursus arctos$"
                    ],
                    "vernacular": ["$brown bear$English$", "$oso pardo$Spanish$"]
                }]
            }
        }"#;
        let envelope: SolrEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.response.docs.len(), 1);
        assert_eq!(envelope.response.docs[0].tsn, "180543");
        assert_eq!(envelope.response.docs[0].vernacular.len(), 2);
    }

    #[test]
    fn test_envelope_empty_docs() {
        let json = r#"{"response": {"numFound": 0, "docs": []}}"#;
        let envelope: SolrEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.response.docs.is_empty());
    }
}
