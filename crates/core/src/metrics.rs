//! Prometheus metrics for the pipeline.
//!
//! Counters only: records pulled per step, match outcomes per authority,
//! bucket write results, and authority calls that degraded to a
//! fallback. The runner binary dumps them as text at the end of a run.

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec, TextEncoder};

/// Records pulled from the registry, by step.
pub static RECORDS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "tircache_records_processed_total",
        "Records pulled from the registry",
        &["step"]
    )
    .unwrap()
});

/// Match outcomes, by authority and method.
pub static MATCH_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "tircache_match_outcomes_total",
        "Resolution outcomes per authority",
        &["authority", "method"]
    )
    .unwrap()
});

/// Bucket write attempts, by column and result.
pub static BUCKET_WRITES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "tircache_bucket_writes_total",
        "Bucket write results",
        &["column", "result"]
    )
    .unwrap()
});

/// Authority calls that failed and were degraded to a fallback step.
pub static AUTHORITY_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "tircache_authority_failures_total",
        "Authority calls degraded to a fallback",
        &["authority", "stage"]
    )
    .unwrap()
});

/// Render all registered metrics in the Prometheus text format.
pub fn dump() -> String {
    TextEncoder::new()
        .encode_to_string(&prometheus::gather())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment_and_dump() {
        RECORDS_PROCESSED.with_label_values(&["itis"]).inc();
        MATCH_OUTCOMES
            .with_label_values(&["itis", "Exact Match"])
            .inc();
        let text = dump();
        assert!(text.contains("tircache_records_processed_total"));
    }
}
