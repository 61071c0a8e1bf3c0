//! In-memory registry store for tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::bucket::{BucketColumn, ItisBucket, SgcnBucket, WormsBucket};
use crate::pipeline::PipelineStep;
use crate::reconcile::CanonicalFields;
use crate::registry::{LookupProperty, RegistryError, RegistryStore, TirRecord};
use crate::resolver::MatchMethod;

/// One stored registration row: the registration fields plus whatever
/// bucket payloads have been written.
#[derive(Debug, Clone, Default)]
pub struct MockRecord {
    pub id: i64,
    pub source: Option<String>,
    pub follow_taxonomy: bool,
    pub lookup_property: LookupProperty,
    pub scientificname: Option<String>,
    pub tsn: Option<String>,
    pub egtid: Option<String>,
    /// Serialized bucket payloads by column, as written.
    pub buckets: HashMap<BucketColumn, String>,
    pub common: Option<CanonicalFields>,
}

impl MockRecord {
    fn bucket<T: serde::de::DeserializeOwned>(&self, column: BucketColumn) -> Option<T> {
        self.buckets
            .get(&column)
            .and_then(|payload| serde_json::from_str(payload).ok())
    }

    fn matches_step(&self, step: PipelineStep) -> bool {
        match step {
            PipelineStep::Itis => !self.buckets.contains_key(&BucketColumn::Itis),
            PipelineStep::Worms => {
                !self.buckets.contains_key(&BucketColumn::Worms)
                    && self.buckets.contains_key(&BucketColumn::Itis)
            }
            PipelineStep::NatureServe => !self.buckets.contains_key(&BucketColumn::NatureServe),
            PipelineStep::Tess => {
                !self.buckets.contains_key(&BucketColumn::Tess)
                    && self
                        .bucket::<ItisBucket>(BucketColumn::Itis)
                        .map(|b| b.match_method != MatchMethod::NotMatched)
                        .unwrap_or(false)
            }
            PipelineStep::SgcnAnnotation => {
                self.source.as_deref() == Some("SGCN")
                    && !self.buckets.contains_key(&BucketColumn::Sgcn)
            }
            PipelineStep::CommonProperties => {
                self.common.is_none()
                    && self.buckets.contains_key(&BucketColumn::Itis)
                    && self.buckets.contains_key(&BucketColumn::Worms)
            }
        }
    }

    fn to_tir_record(&self) -> TirRecord {
        let itis: Option<ItisBucket> = self.bucket(BucketColumn::Itis);
        let worms: Option<WormsBucket> = self.bucket(BucketColumn::Worms);
        let sgcn: Option<SgcnBucket> = self.bucket(BucketColumn::Sgcn);
        TirRecord {
            id: self.id,
            source: self.source.clone(),
            follow_taxonomy: self.follow_taxonomy,
            lookup_property: self.lookup_property,
            scientificname: self.scientificname.clone(),
            tsn: self.tsn.clone(),
            egtid: self.egtid.clone(),
            name_itis: itis.as_ref().and_then(|b| b.name_w_ind.clone()),
            name_worms: worms.as_ref().and_then(|b| b.valid_name.clone()),
            itis,
            worms,
            sgcn,
        }
    }
}

/// In-memory [`RegistryStore`]. Bucket payloads are stored exactly as
/// written; reads parse them back the way the real store would.
#[derive(Default)]
pub struct MockRegistry {
    records: RwLock<Vec<MockRecord>>,
    sgcn_common_names: RwLock<HashMap<String, String>>,
    sgcn_groups: RwLock<HashMap<String, String>>,
    sgcn_states: RwLock<HashMap<String, BTreeMap<String, Vec<String>>>>,
    next_write_error: RwLock<Option<RegistryError>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registration row.
    pub async fn add_record(&self, record: MockRecord) {
        self.records.write().await.push(record);
    }

    /// The payload written for a record's bucket column, if any.
    pub async fn bucket_payload(&self, id: i64, column: BucketColumn) -> Option<String> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .and_then(|r| r.buckets.get(&column).cloned())
    }

    /// Parse a written bucket payload back into its typed form.
    pub async fn bucket<T: serde::de::DeserializeOwned>(
        &self,
        id: i64,
        column: BucketColumn,
    ) -> Option<T> {
        self.bucket_payload(id, column)
            .await
            .and_then(|payload| serde_json::from_str(&payload).ok())
    }

    /// The canonical fields written for a record, if any.
    pub async fn common(&self, id: i64) -> Option<CanonicalFields> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .and_then(|r| r.common.clone())
    }

    /// Register an SGCN-source common name for a submitted name.
    pub async fn set_sgcn_common_name(&self, name: &str, common: &str) {
        self.sgcn_common_names
            .write()
            .await
            .insert(name.to_string(), common.to_string());
    }

    /// Register an SGCN-submitted taxonomic group for a name.
    pub async fn set_sgcn_group(&self, name: &str, group: &str) {
        self.sgcn_groups
            .write()
            .await
            .insert(name.to_string(), group.to_string());
    }

    /// Register per-year state lists for a name.
    pub async fn set_sgcn_states(&self, name: &str, lists: BTreeMap<String, Vec<String>>) {
        self.sgcn_states
            .write()
            .await
            .insert(name.to_string(), lists);
    }

    /// Fail the next bucket write with the given error.
    pub async fn set_next_write_error(&self, error: RegistryError) {
        *self.next_write_error.write().await = Some(error);
    }
}

#[async_trait]
impl RegistryStore for MockRegistry {
    async fn next_unresolved(
        &self,
        step: PipelineStep,
    ) -> Result<Option<TirRecord>, RegistryError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.matches_step(step))
            .map(MockRecord::to_tir_record))
    }

    async fn write_bucket(
        &self,
        id: i64,
        column: BucketColumn,
        payload: &str,
    ) -> Result<(), RegistryError> {
        if let Some(error) = self.next_write_error.write().await.take() {
            return Err(error);
        }

        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RegistryError::ClaimLost { id })?;
        if record.buckets.contains_key(&column) {
            return Err(RegistryError::ClaimLost { id });
        }
        record.buckets.insert(column, payload.to_string());
        Ok(())
    }

    async fn write_common(&self, id: i64, fields: &CanonicalFields) -> Result<(), RegistryError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RegistryError::ClaimLost { id })?;
        record.common = Some(fields.clone());
        Ok(())
    }

    async fn sgcn_common_name(&self, name: &str) -> Result<Option<String>, RegistryError> {
        Ok(self.sgcn_common_names.read().await.get(name).cloned())
    }

    async fn sgcn_taxonomic_group(&self, name: &str) -> Result<Option<String>, RegistryError> {
        Ok(self.sgcn_groups.read().await.get(name).cloned())
    }

    async fn sgcn_state_lists(
        &self,
        name: &str,
    ) -> Result<BTreeMap<String, Vec<String>>, RegistryError> {
        Ok(self
            .sgcn_states
            .read()
            .await
            .get(name)
            .cloned()
            .unwrap_or_default())
    }
}
