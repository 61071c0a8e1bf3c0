//! The per-record resolution pipeline and its batch runner.
//!
//! Each step pulls one unresolved record at a time from the registry,
//! runs the authority-specific processing, and writes one bucket (or the
//! canonical fields) back. Records fail individually; the loop always
//! moves on, bounded by the run context's record ceiling on top of the
//! "nothing left to do" termination.

mod config;
mod runner;

pub use config::RunContext;
pub use runner::PipelineRunner;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::authority::AuthorityError;
use crate::registry::RegistryError;

/// The pipeline steps, in their natural dependency order: the hierarchy
/// authority first (its names feed the others), then the marine,
/// conservation and listing authorities, the source annotations, and
/// finally the canonical-field reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStep {
    #[serde(rename = "itis")]
    Itis,
    #[serde(rename = "worms")]
    Worms,
    #[serde(rename = "natureserve")]
    NatureServe,
    #[serde(rename = "tess")]
    Tess,
    #[serde(rename = "sgcn")]
    SgcnAnnotation,
    #[serde(rename = "common")]
    CommonProperties,
}

impl PipelineStep {
    /// All steps in dependency order.
    pub const ALL: [PipelineStep; 6] = [
        PipelineStep::Itis,
        PipelineStep::Worms,
        PipelineStep::NatureServe,
        PipelineStep::Tess,
        PipelineStep::SgcnAnnotation,
        PipelineStep::CommonProperties,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStep::Itis => "itis",
            PipelineStep::Worms => "worms",
            PipelineStep::NatureServe => "natureserve",
            PipelineStep::Tess => "tess",
            PipelineStep::SgcnAnnotation => "sgcn",
            PipelineStep::CommonProperties => "common",
        }
    }
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from processing one record.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Registry read or write failed.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// An authority call failed in a step with no negative-result
    /// packaging (the record stays unresolved and is retried next run).
    #[error("authority error: {0}")]
    Authority(#[from] AuthorityError),

    /// Bucket serialization failed.
    #[error("failed to encode bucket: {0}")]
    Encode(#[from] serde_json::Error),

    /// A step was requested without its client configured.
    #[error("step '{0}' is not configured")]
    StepNotConfigured(PipelineStep),
}

/// Counters for one step's run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Records pulled from the registry.
    pub processed: u32,
    /// Records whose bucket or canonical fields were written back.
    pub written: u32,
    /// Records that failed; failures never stop the loop.
    pub failures: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_names() {
        assert_eq!(PipelineStep::Itis.as_str(), "itis");
        assert_eq!(PipelineStep::SgcnAnnotation.as_str(), "sgcn");
        assert_eq!(PipelineStep::CommonProperties.as_str(), "common");
    }

    #[test]
    fn test_step_order_starts_with_itis_and_ends_with_common() {
        assert_eq!(PipelineStep::ALL[0], PipelineStep::Itis);
        assert_eq!(
            PipelineStep::ALL[PipelineStep::ALL.len() - 1],
            PipelineStep::CommonProperties
        );
    }

    #[test]
    fn test_step_deserializes_from_config_names() {
        let step: PipelineStep = serde_json::from_str("\"natureserve\"").unwrap();
        assert_eq!(step, PipelineStep::NatureServe);
        let step: PipelineStep = serde_json::from_str("\"sgcn\"").unwrap();
        assert_eq!(step, PipelineStep::SgcnAnnotation);
    }
}
