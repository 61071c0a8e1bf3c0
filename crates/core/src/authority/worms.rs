//! WoRMS (World Register of Marine Species) REST client.
//!
//! Name lookups run against `AphiaRecordsByName` with `like=false` for
//! exact and `like=true` for fuzzy mode; identifier lookups run against
//! `AphiaRecordByAphiaID`. The service signals an absent result with
//! HTTP 204 rather than an empty body, which must not be read as a
//! service failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::AphiaRecord;
use super::{AuthorityError, TaxonAuthority};
use crate::names::LookupField;

const AUTHORITY: &str = "worms";

/// WoRMS client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WormsConfig {
    /// Base URL of the REST service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://www.marinespecies.org/rest".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for WormsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

/// WoRMS REST service client.
pub struct WormsClient {
    client: Client,
    base_url: String,
}

impl WormsClient {
    /// Create a new WoRMS client.
    pub fn new(config: WormsConfig) -> Result<Self, AuthorityError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    async fn records_by_name(
        &self,
        term: &str,
        like: bool,
    ) -> Result<Vec<AphiaRecord>, AuthorityError> {
        let url = format!(
            "{}/AphiaRecordsByName/{}",
            self.base_url,
            urlencoding::encode(term)
        );
        debug!("WoRMS name search: term='{}', like={}", term, like);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("like", if like { "true" } else { "false" }),
                ("marine_only", "false"),
                ("offset", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        // 204: the service found nothing. A negative result, not a failure.
        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(AuthorityError::Service {
                authority: AUTHORITY,
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AuthorityError::Malformed {
                authority: AUTHORITY,
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl TaxonAuthority for WormsClient {
    type Record = AphiaRecord;

    fn name(&self) -> &'static str {
        AUTHORITY
    }

    async fn search_exact(
        &self,
        term: &str,
        _field: LookupField,
    ) -> Result<Vec<AphiaRecord>, AuthorityError> {
        self.records_by_name(term, false).await
    }

    async fn search_fuzzy(
        &self,
        term: &str,
        _field: LookupField,
    ) -> Result<Vec<AphiaRecord>, AuthorityError> {
        self.records_by_name(term, true).await
    }

    async fn search_by_id(&self, id: &str) -> Result<Option<AphiaRecord>, AuthorityError> {
        let url = format!("{}/AphiaRecordByAphiaID/{}", self.base_url, id);
        debug!("WoRMS id lookup: {}", id);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AuthorityError::Service {
                authority: AUTHORITY,
                status: status.as_u16(),
            });
        }

        let record: AphiaRecord =
            response
                .json()
                .await
                .map_err(|e| AuthorityError::Malformed {
                    authority: AUTHORITY,
                    message: e.to_string(),
                })?;
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WormsConfig::default();
        assert_eq!(config.base_url, "https://www.marinespecies.org/rest");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_records_response_parses() {
        let json = r#"[{
            "AphiaID": 137087,
            "scientificname": "Phoca vitulina",
            "authority": "Linnaeus, 1758",
            "status": "accepted",
            "rank": "Species",
            "valid_AphiaID": 137087,
            "valid_name": "Phoca vitulina",
            "kingdom": "Animalia",
            "phylum": "Chordata",
            "class": "Mammalia",
            "order": "Carnivora",
            "family": "Phocidae",
            "genus": "Phoca",
            "lsid": "urn:lsid:marinespecies.org:taxname:137087",
            "isMarine": 1,
            "isBrackish": 1,
            "isFreshwater": 0,
            "isTerrestrial": 0,
            "isExtinct": null,
            "match_type": "exact",
            "modified": "2021-03-11T07:27:49.843Z"
        }]"#;
        let records: Vec<AphiaRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].genus.as_deref(), Some("Phoca"));
        assert_eq!(records[0].class.as_deref(), Some("Mammalia"));
    }
}
