//! The batch runner: one record at a time, strictly sequential.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::authority::{
    AphiaRecord, ConservationAuthority, ItisDoc, ListingAuthority, SpeciesDocResult,
    TaxonAuthority, TessOutcome,
};
use crate::bucket::{
    BucketEncoding, CacheBucket, ItisBucket, NatureServeBucket, TessBucket, WormsBucket,
};
use crate::metrics;
use crate::names::{clean_text, normalize, LookupField, SearchTerm};
use crate::reconcile::{reconcile, ReconcileInput};
use crate::registry::{LookupProperty, RegistryError, RegistryStore, TirRecord};
use crate::resolver::{MatchOutcome, MatchResolver};
use crate::sgcn::SgcnAnnotator;

use super::{PipelineError, PipelineStep, RunContext, RunSummary};

/// Drives the pipeline steps against a registry and a set of authority
/// clients. The conservation and listing clients are optional; steps
/// without a configured client are skipped with a warning.
pub struct PipelineRunner {
    registry: Arc<dyn RegistryStore>,
    itis: Arc<dyn TaxonAuthority<Record = ItisDoc>>,
    worms: Arc<dyn TaxonAuthority<Record = AphiaRecord>>,
    natureserve: Option<Arc<dyn ConservationAuthority>>,
    tess: Option<Arc<dyn ListingAuthority>>,
    annotator: SgcnAnnotator,
    encoding: BucketEncoding,
    ctx: RunContext,
}

impl PipelineRunner {
    pub fn new(
        registry: Arc<dyn RegistryStore>,
        itis: Arc<dyn TaxonAuthority<Record = ItisDoc>>,
        worms: Arc<dyn TaxonAuthority<Record = AphiaRecord>>,
        ctx: RunContext,
    ) -> Self {
        Self {
            registry,
            itis,
            worms,
            natureserve: None,
            tess: None,
            annotator: SgcnAnnotator::default(),
            encoding: BucketEncoding::default(),
            ctx,
        }
    }

    pub fn with_natureserve(mut self, client: Arc<dyn ConservationAuthority>) -> Self {
        self.natureserve = Some(client);
        self
    }

    pub fn with_tess(mut self, client: Arc<dyn ListingAuthority>) -> Self {
        self.tess = Some(client);
        self
    }

    pub fn with_annotator(mut self, annotator: SgcnAnnotator) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn with_encoding(mut self, encoding: BucketEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Run the given steps in order, returning one summary per step.
    pub async fn run_all(&self, steps: &[PipelineStep]) -> Vec<(PipelineStep, RunSummary)> {
        let mut summaries = Vec::with_capacity(steps.len());
        for step in steps {
            summaries.push((*step, self.run_step(*step).await));
        }
        summaries
    }

    /// Run one step until either no unresolved record remains or the run
    /// context's record ceiling is hit. Failures are per-record and
    /// never stop the loop.
    pub async fn run_step(&self, step: PipelineStep) -> RunSummary {
        let mut summary = RunSummary::default();

        if self.step_client_missing(step) {
            warn!("step '{}' requested but its client is not configured, skipping", step);
            return summary;
        }
        if !self.ctx.commit {
            info!("step '{}' running without commit; payloads are logged only", step);
        }

        while summary.processed < self.ctx.max_records {
            let record = match self.registry.next_unresolved(step).await {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(e) => {
                    error!("step '{}': failed to fetch next record: {}", step, e);
                    summary.failures += 1;
                    break;
                }
            };

            summary.processed += 1;
            metrics::RECORDS_PROCESSED
                .with_label_values(&[step.as_str()])
                .inc();

            match self.process_record(step, &record).await {
                Ok(true) => summary.written += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("step '{}': record {} failed: {}", step, record.id, e);
                    summary.failures += 1;
                }
            }
        }

        info!(
            "step '{}' finished: {} processed, {} written, {} failures",
            step, summary.processed, summary.written, summary.failures
        );
        summary
    }

    fn step_client_missing(&self, step: PipelineStep) -> bool {
        match step {
            PipelineStep::NatureServe => self.natureserve.is_none(),
            PipelineStep::Tess => self.tess.is_none(),
            _ => false,
        }
    }

    async fn process_record(
        &self,
        step: PipelineStep,
        record: &TirRecord,
    ) -> Result<bool, PipelineError> {
        match step {
            PipelineStep::Itis => self.process_itis(record).await,
            PipelineStep::Worms => self.process_worms(record).await,
            PipelineStep::NatureServe => self.process_natureserve(record).await,
            PipelineStep::Tess => self.process_tess(record).await,
            PipelineStep::SgcnAnnotation => self.process_sgcn(record).await,
            PipelineStep::CommonProperties => self.process_common(record).await,
        }
    }

    async fn process_itis(&self, record: &TirRecord) -> Result<bool, PipelineError> {
        let resolver = MatchResolver::new(self.itis.as_ref());

        let outcome = match record.lookup_property {
            LookupProperty::Tsn => match record.tsn.as_deref() {
                Some(tsn) => resolver.resolve_identifier(tsn).await,
                None => MatchOutcome::not_matched(""),
            },
            LookupProperty::ScientificName => {
                let normalized = normalize(record.scientificname.as_deref().unwrap_or(""));
                let term = SearchTerm::classify(&normalized);
                resolver.resolve(&term, record.follow_taxonomy).await
            }
        };

        metrics::MATCH_OUTCOMES
            .with_label_values(&["itis", outcome.method.as_str()])
            .inc();
        self.record_failures("itis", &outcome.failures);

        self.write_bucket(record.id, ItisBucket::package(&outcome)).await
    }

    async fn process_worms(&self, record: &TirRecord) -> Result<bool, PipelineError> {
        let resolver = MatchResolver::new(self.worms.as_ref());

        let normalized = normalize(record.scientificname.as_deref().unwrap_or(""));
        let term = SearchTerm::classify(&normalized);
        let mut outcome = resolver.resolve(&term, record.follow_taxonomy).await;

        // The registration name missed; the ITIS-matched name is a
        // second chance when it differs from what we already tried.
        if !outcome.method.is_matched() {
            if let Some(name_itis) = record.name_itis.as_deref() {
                if Some(name_itis) != term.as_query() {
                    debug!(
                        "record {}: retrying marine lookup with ITIS name '{}'",
                        record.id, name_itis
                    );
                    let fallback = SearchTerm::Name {
                        value: name_itis.to_string(),
                        field: LookupField::NameWithoutIndicator,
                    };
                    let second = resolver.resolve(&fallback, record.follow_taxonomy).await;
                    if second.method.is_matched() {
                        outcome = second;
                    }
                }
            }
        }

        metrics::MATCH_OUTCOMES
            .with_label_values(&["worms", outcome.method.as_str()])
            .inc();
        self.record_failures("worms", &outcome.failures);

        self.write_bucket(record.id, WormsBucket::package(&outcome)).await
    }

    async fn process_natureserve(&self, record: &TirRecord) -> Result<bool, PipelineError> {
        let client = self
            .natureserve
            .as_ref()
            .ok_or(PipelineError::StepNotConfigured(PipelineStep::NatureServe))?;

        // GAP registrations arrive with the element ID already known.
        let mut element_id = record
            .egtid
            .as_deref()
            .map(|egtid| format!("ELEMENT_GLOBAL.2.{}", egtid));

        if element_id.is_none() {
            for name in record.known_names() {
                match client.find_global_id(&name).await {
                    Ok(Some(id)) => {
                        element_id = Some(id);
                        break;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        // Degrade to the next candidate name.
                        warn!(
                            "record {}: conservation id search failed for '{}': {}",
                            record.id, name, e
                        );
                    }
                }
            }
        }

        let bucket = match element_id {
            None => NatureServeBucket::not_found(),
            Some(id) => match client.get_species(&id).await? {
                SpeciesDocResult::Found(status) => NatureServeBucket::found(&id, &status),
                SpeciesDocResult::Empty => NatureServeBucket::error(&id),
            },
        };

        metrics::MATCH_OUTCOMES
            .with_label_values(&["natureserve", bucket.match_method.as_str()])
            .inc();

        self.write_bucket(record.id, bucket).await
    }

    async fn process_tess(&self, record: &TirRecord) -> Result<bool, PipelineError> {
        let client = self
            .tess
            .as_ref()
            .ok_or(PipelineError::StepNotConfigured(PipelineStep::Tess))?;

        let itis = record.itis.as_ref();
        let discovered = itis.and_then(|b| b.discovered_tsn.clone().or_else(|| b.tsn.clone()));
        let Some(discovered) = discovered else {
            warn!("record {}: no TSN in ITIS bucket, caching empty listing", record.id);
            return self.write_bucket(record.id, TessBucket::none("")).await;
        };

        let mut tsn_used = discovered;
        let mut outcome = client.query_by_tsn(&tsn_used).await?;

        // Listings sometimes hang off the accepted TSN only.
        if matches!(outcome, TessOutcome::None) {
            if let Some(accepted) = itis.and_then(|b| b.accepted_tsn.clone()) {
                tsn_used = accepted;
                outcome = client.query_by_tsn(&tsn_used).await?;
            }
        }

        let bucket = match outcome {
            TessOutcome::None => TessBucket::none(&tsn_used),
            TessOutcome::Error => TessBucket::error(&tsn_used),
            TessOutcome::Found(detail) => TessBucket::found(&tsn_used, &detail),
        };

        self.write_bucket(record.id, bucket).await
    }

    async fn process_sgcn(&self, record: &TirRecord) -> Result<bool, PipelineError> {
        let submitted = record.scientificname.clone().unwrap_or_default();

        let provided_group = match self.registry.sgcn_taxonomic_group(&submitted).await {
            Ok(group) => group,
            Err(e) => {
                warn!(
                    "record {}: taxonomic group lookup failed, aligning without it: {}",
                    record.id, e
                );
                None
            }
        };

        let state_lists = match self.registry.sgcn_state_lists(&submitted).await {
            Ok(lists) => lists,
            Err(e) => {
                warn!(
                    "record {}: state list lookup failed, caching without it: {}",
                    record.id, e
                );
                Default::default()
            }
        };

        let bucket =
            self.annotator
                .annotate(&record.known_names(), provided_group.as_deref(), state_lists);
        self.write_bucket(record.id, bucket).await
    }

    async fn process_common(&self, record: &TirRecord) -> Result<bool, PipelineError> {
        let submitted = record.scientificname.clone().unwrap_or_default();
        let source = record.source.clone().unwrap_or_default();

        // The SGCN source keeps its own common names; fetch one up front
        // when the hierarchy bucket has no usable vernacular, so
        // reconciliation itself stays free of I/O.
        let mut source_common_name = None;
        let has_vernacular = record
            .itis
            .as_ref()
            .and_then(|b| b.english_common_name())
            .is_some();
        if source == "SGCN" && !has_vernacular {
            source_common_name = match self.registry.sgcn_common_name(&clean_text(&submitted)).await
            {
                Ok(name) => name,
                Err(e) => {
                    warn!("record {}: source common name lookup failed: {}", record.id, e);
                    None
                }
            };
        }

        let fields = reconcile(&ReconcileInput {
            submitted_name: &submitted,
            source: &source,
            itis: record.itis.as_ref(),
            worms: record.worms.as_ref(),
            sgcn: record.sgcn.as_ref(),
            source_common_name: source_common_name.as_deref(),
        });

        if !self.ctx.commit {
            debug!("dry run: record {} canonical fields: {:?}", record.id, fields);
            return Ok(false);
        }

        self.registry.write_common(record.id, &fields).await?;
        metrics::BUCKET_WRITES
            .with_label_values(&["common", "written"])
            .inc();
        Ok(true)
    }

    /// Encode and write one bucket. A rejected write gets a single retry
    /// with the bucket's known-oversized field stripped; a lost claim is
    /// logged and skipped, since the competing instance already cached
    /// the result.
    async fn write_bucket<B: CacheBucket + Send>(
        &self,
        id: i64,
        mut bucket: B,
    ) -> Result<bool, PipelineError> {
        let column = bucket.column();
        let payload = bucket.encode(self.encoding)?;

        if !self.ctx.commit {
            debug!("dry run: record {} {} bucket: {}", id, column, payload);
            metrics::BUCKET_WRITES
                .with_label_values(&[column.as_str(), "dry_run"])
                .inc();
            return Ok(false);
        }

        match self.registry.write_bucket(id, column, &payload).await {
            Ok(()) => {
                metrics::BUCKET_WRITES
                    .with_label_values(&[column.as_str(), "written"])
                    .inc();
                Ok(true)
            }
            Err(RegistryError::WriteConflict { id: conflict_id, message }) => {
                if !bucket.strip_oversized() {
                    return Err(RegistryError::WriteConflict {
                        id: conflict_id,
                        message,
                    }
                    .into());
                }
                warn!(
                    "record {}: {} write rejected ({}), retrying without oversized field",
                    id, column, message
                );
                let payload = bucket.encode(self.encoding)?;
                self.registry.write_bucket(id, column, &payload).await?;
                metrics::BUCKET_WRITES
                    .with_label_values(&[column.as_str(), "written_stripped"])
                    .inc();
                Ok(true)
            }
            Err(RegistryError::ClaimLost { .. }) => {
                warn!("record {}: {} bucket already claimed by another instance", id, column);
                metrics::BUCKET_WRITES
                    .with_label_values(&[column.as_str(), "claim_lost"])
                    .inc();
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn record_failures(&self, authority: &str, failures: &[crate::resolver::AuthorityFailure]) {
        for failure in failures {
            metrics::AUTHORITY_FAILURES
                .with_label_values(&[authority, &failure.stage.to_string()])
                .inc();
        }
    }
}
