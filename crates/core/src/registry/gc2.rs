//! GC2-style SQL-over-HTTP registry client.
//!
//! Every operation is a GET with a `q` SQL parameter against the API
//! base URL; reads come back as JSON feature collections with the
//! selected columns under `properties`. Bucket columns hold JSON
//! documents and are parsed into their typed buckets on read.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::types::{LookupProperty, TirRecord};
use super::{RegistryError, RegistryStore};
use crate::bucket::BucketColumn;
use crate::pipeline::PipelineStep;
use crate::reconcile::CanonicalFields;

/// Registry API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// SQL API base URL.
    pub base_url: String,
    /// API key for the target database.
    pub api_key: String,
    /// Fully qualified registry table name.
    #[serde(default = "default_table")]
    pub table: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_table() -> String {
    "tir.tir".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Registry client for the GC2 SQL API.
pub struct Gc2Registry {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl Gc2Registry {
    /// Create a new registry client.
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            table: config.table.clone(),
        })
    }

    async fn run_query(&self, sql: &str) -> Result<Gc2Response, RegistryError> {
        debug!("registry query: {}", sql);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("key", self.api_key.as_str()), ("q", sql)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Api {
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| RegistryError::Malformed(e.to_string()))
    }

    async fn run_update(&self, id: i64, sql: &str) -> Result<Gc2Response, RegistryError> {
        let response = self.run_query(sql).await?;
        if response.success == Some(false) {
            return Err(RegistryError::WriteConflict {
                id,
                message: response.message.unwrap_or_else(|| "unknown".to_string()),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RegistryStore for Gc2Registry {
    async fn next_unresolved(
        &self,
        step: PipelineStep,
    ) -> Result<Option<TirRecord>, RegistryError> {
        let sql = select_sql(step, &self.table);
        let response = self.run_query(&sql).await?;
        let Some(feature) = response.features.into_iter().next() else {
            return Ok(None);
        };
        record_from_properties(&feature.properties).map(Some)
    }

    async fn write_bucket(
        &self,
        id: i64,
        column: BucketColumn,
        payload: &str,
    ) -> Result<(), RegistryError> {
        let sql = format!(
            "UPDATE {table} SET {col} = '{payload}' WHERE id = {id} AND {col} IS NULL",
            table = self.table,
            col = column.as_str(),
            payload = sql_escape(payload),
            id = id
        );
        let response = self.run_update(id, &sql).await?;
        if response.affected_rows == Some(0) {
            return Err(RegistryError::ClaimLost { id });
        }
        Ok(())
    }

    async fn write_common(&self, id: i64, fields: &CanonicalFields) -> Result<(), RegistryError> {
        let sql = format!(
            "UPDATE {table} SET scientificname = '{sci}', commonname = '{common}', \
             authorityid = '{auth}', rank = '{rank}', taxonomicgroup = '{group}', \
             matchmethod = '{method}' WHERE id = {id}",
            table = self.table,
            sci = sql_escape(&fields.scientificname),
            common = sql_escape(&fields.commonname),
            auth = sql_escape(&fields.authorityid),
            rank = sql_escape(&fields.rank),
            group = sql_escape(&fields.taxonomicgroup),
            method = fields.matchmethod.as_str(),
            id = id
        );
        self.run_update(id, &sql).await?;
        Ok(())
    }

    async fn sgcn_common_name(&self, name: &str) -> Result<Option<String>, RegistryError> {
        let sql = format!(
            "SELECT commonname FROM sgcn.sgcn WHERE scientificname_submitted = '{}' \
             AND commonname IS NOT NULL LIMIT 1",
            sql_escape(name)
        );
        let response = self.run_query(&sql).await?;
        Ok(response
            .features
            .into_iter()
            .next()
            .and_then(|f| prop_string(&f.properties, "commonname")))
    }

    async fn sgcn_taxonomic_group(&self, name: &str) -> Result<Option<String>, RegistryError> {
        let sql = format!(
            "SELECT taxonomicgroup_submitted FROM sgcn.sgcn \
             WHERE scientificname_submitted = '{}' LIMIT 1",
            sql_escape(name)
        );
        let response = self.run_query(&sql).await?;
        Ok(response
            .features
            .into_iter()
            .next()
            .and_then(|f| prop_string(&f.properties, "taxonomicgroup_submitted")))
    }

    async fn sgcn_state_lists(
        &self,
        name: &str,
    ) -> Result<BTreeMap<String, Vec<String>>, RegistryError> {
        let sql = format!(
            "SELECT DISTINCT sgcnyear, statename FROM sgcn.sgcn \
             WHERE scientificname_submitted = '{}' ORDER BY sgcnyear, statename",
            sql_escape(name)
        );
        let response = self.run_query(&sql).await?;

        let mut lists: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for feature in response.features {
            let year = prop_string(&feature.properties, "sgcnyear");
            let state = prop_string(&feature.properties, "statename");
            if let (Some(year), Some(state)) = (year, state) {
                lists.entry(year).or_default().push(state);
            }
        }
        Ok(lists)
    }
}

/// Escape a value for inclusion in a single-quoted SQL literal.
fn sql_escape(value: &str) -> String {
    value.replace('\'', "''")
}

/// The read query for one pipeline step. Each step's predicate encodes
/// its dependencies: WoRMS and TESS need the ITIS bucket in place, the
/// common-properties step needs both authorities cached.
fn select_sql(step: PipelineStep, table: &str) -> String {
    match step {
        PipelineStep::Itis => format!(
            "SELECT id, registration->>'source' AS source, \
             registration->>'followTaxonomy' AS followtaxonomy, \
             registration->>'taxonomicLookupProperty' AS taxonomiclookupproperty, \
             registration->>'scientificname' AS scientificname, \
             registration->>'tsn' AS tsn \
             FROM {table} WHERE itis IS NULL LIMIT 1"
        ),
        PipelineStep::Worms => format!(
            "SELECT id, registration->>'scientificname' AS scientificname, \
             registration->>'followTaxonomy' AS followtaxonomy, \
             itis->>'nameWInd' AS name_itis \
             FROM {table} WHERE worms IS NULL AND itis IS NOT NULL LIMIT 1"
        ),
        PipelineStep::NatureServe => format!(
            "SELECT id, registration->>'scientificname' AS scientificname, \
             registration->>'EGTID' AS egtid, \
             itis->>'nameWInd' AS name_itis, worms->>'valid_name' AS name_worms \
             FROM {table} WHERE natureserve IS NULL LIMIT 1"
        ),
        PipelineStep::Tess => format!(
            "SELECT id, itis AS itis FROM {table} \
             WHERE tess IS NULL AND itis IS NOT NULL \
             AND itis->>'MatchMethod' <> 'Not Matched' LIMIT 1"
        ),
        PipelineStep::SgcnAnnotation => format!(
            "SELECT id, registration->>'scientificname' AS scientificname, \
             itis->>'nameWInd' AS name_itis, worms->>'valid_name' AS name_worms \
             FROM {table} WHERE registration->>'source' = 'SGCN' \
             AND sgcn IS NULL LIMIT 1"
        ),
        PipelineStep::CommonProperties => format!(
            "SELECT id, registration->>'source' AS source, \
             registration->>'scientificname' AS scientificname, \
             itis AS itis, worms AS worms, sgcn AS sgcn \
             FROM {table} WHERE scientificname IS NULL \
             AND itis IS NOT NULL AND worms IS NOT NULL LIMIT 1"
        ),
    }
}

/// Map one feature's properties onto a record. Bucket columns may come
/// back as JSON strings or inlined objects; both parse.
fn record_from_properties(props: &Value) -> Result<TirRecord, RegistryError> {
    let id = props
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| RegistryError::Malformed("feature without numeric id".to_string()))?;

    Ok(TirRecord {
        id,
        source: prop_string(props, "source"),
        follow_taxonomy: prop_bool(props, "followtaxonomy"),
        lookup_property: LookupProperty::parse(
            prop_string(props, "taxonomiclookupproperty").as_deref(),
        ),
        scientificname: prop_string(props, "scientificname"),
        tsn: prop_string(props, "tsn"),
        egtid: prop_string(props, "egtid"),
        name_itis: prop_string(props, "name_itis"),
        name_worms: prop_string(props, "name_worms"),
        itis: prop_bucket(props, "itis"),
        worms: prop_bucket(props, "worms"),
        sgcn: prop_bucket(props, "sgcn"),
    })
}

fn prop_string(props: &Value, key: &str) -> Option<String> {
    match props.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn prop_bool(props: &Value, key: &str) -> bool {
    match props.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn prop_bucket<T: serde::de::DeserializeOwned>(props: &Value, key: &str) -> Option<T> {
    match props.get(key) {
        Some(Value::String(s)) => serde_json::from_str(s).ok(),
        Some(value @ Value::Object(_)) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    }
}

// ============================================================================
// GC2 response envelope (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct Gc2Response {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    affected_rows: Option<i64>,
    #[serde(default)]
    features: Vec<Gc2Feature>,
}

#[derive(Debug, Deserialize)]
struct Gc2Feature {
    #[serde(default)]
    properties: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_sql_itis_predicate() {
        let sql = select_sql(PipelineStep::Itis, "tir.tir");
        assert!(sql.contains("WHERE itis IS NULL"));
        assert!(sql.contains("registration->>'followTaxonomy'"));
        assert!(sql.ends_with("LIMIT 1"));
    }

    #[test]
    fn test_select_sql_worms_requires_itis() {
        let sql = select_sql(PipelineStep::Worms, "tir.tir");
        assert!(sql.contains("worms IS NULL AND itis IS NOT NULL"));
        assert!(sql.contains("itis->>'nameWInd'"));
    }

    #[test]
    fn test_select_sql_tess_requires_matched_itis() {
        let sql = select_sql(PipelineStep::Tess, "tir.tir");
        assert!(sql.contains("itis->>'MatchMethod' <> 'Not Matched'"));
    }

    #[test]
    fn test_select_sql_common_requires_both_authorities() {
        let sql = select_sql(PipelineStep::CommonProperties, "tir.tir");
        assert!(sql.contains("scientificname IS NULL"));
        assert!(sql.contains("itis IS NOT NULL AND worms IS NOT NULL"));
    }

    #[test]
    fn test_sql_escape() {
        assert_eq!(sql_escape("O'Brien"), "O''Brien");
    }

    #[test]
    fn test_record_from_properties_basic() {
        let props = json!({
            "id": 42,
            "source": "SGCN",
            "followtaxonomy": "TRUE",
            "taxonomiclookupproperty": "scientificname",
            "scientificname": "Ursus arctos",
            "tsn": null
        });
        let record = record_from_properties(&props).unwrap();
        assert_eq!(record.id, 42);
        assert!(record.follow_taxonomy);
        assert_eq!(record.lookup_property, LookupProperty::ScientificName);
        assert_eq!(record.scientificname.as_deref(), Some("Ursus arctos"));
        assert!(record.tsn.is_none());
    }

    #[test]
    fn test_record_from_properties_parses_bucket_json_string() {
        let bucket = json!({
            "cacheDate": "2017-05-01T12:00:00+00:00",
            "MatchMethod": "Exact Match",
            "tsn": "180543",
            "nameWInd": "Ursus arctos",
            "rank": "Species"
        });
        let props = json!({
            "id": 7,
            "itis": bucket.to_string()
        });
        let record = record_from_properties(&props).unwrap();
        let itis = record.itis.expect("itis bucket should parse");
        assert_eq!(itis.tsn.as_deref(), Some("180543"));
    }

    #[test]
    fn test_record_from_properties_parses_inline_bucket_object() {
        let props = json!({
            "id": 7,
            "worms": {
                "cacheDate": "2017-05-01T12:00:00+00:00",
                "MatchMethod": "Not Matched"
            }
        });
        let record = record_from_properties(&props).unwrap();
        assert!(record.worms.is_some());
    }

    #[test]
    fn test_record_without_id_is_malformed() {
        let props = json!({"source": "SGCN"});
        assert!(matches!(
            record_from_properties(&props),
            Err(RegistryError::Malformed(_))
        ));
    }

    #[test]
    fn test_numeric_id_properties_coerce_to_string() {
        let props = json!({"id": 1, "tsn": 180543});
        let record = record_from_properties(&props).unwrap();
        assert_eq!(record.tsn.as_deref(), Some("180543"));
    }
}
