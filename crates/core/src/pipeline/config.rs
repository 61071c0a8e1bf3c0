use serde::{Deserialize, Serialize};

/// Explicit per-run state for a pipeline invocation. Passed into the
/// runner rather than living as ambient globals, so two runners with
/// different limits can coexist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunContext {
    /// When false, processing runs end to end but nothing is written;
    /// payloads are logged instead.
    #[serde(default = "default_commit")]
    pub commit: bool,
    /// Ceiling on records pulled per step per run. Guards against a
    /// runaway loop independent of the "no more unresolved records"
    /// termination; both end the run cleanly.
    #[serde(default = "default_max_records")]
    pub max_records: u32,
}

fn default_commit() -> bool {
    true
}

fn default_max_records() -> u32 {
    1000
}

impl Default for RunContext {
    fn default() -> Self {
        Self {
            commit: default_commit(),
            max_records: default_max_records(),
        }
    }
}
