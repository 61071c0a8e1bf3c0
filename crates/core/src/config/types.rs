use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::authority::{ItisConfig, NatureServeConfig, TessConfig, WormsConfig};
use crate::bucket::BucketEncoding;
use crate::pipeline::{PipelineStep, RunContext};
use crate::registry::RegistryConfig;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub registry: RegistryConfig,
    #[serde(default)]
    pub itis: ItisConfig,
    #[serde(default)]
    pub worms: WormsConfig,
    /// Optional because the service needs an issued access key; the
    /// conservation step is skipped without it.
    #[serde(default)]
    pub natureserve: Option<NatureServeConfig>,
    #[serde(default)]
    pub tess: TessConfig,
    #[serde(default)]
    pub sgcn: SgcnConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Pipeline run configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// When false, process records but only log what would be written.
    #[serde(default = "default_commit")]
    pub commit: bool,
    /// Records-per-step ceiling for one run.
    #[serde(default = "default_max_records")]
    pub max_records_per_run: u32,
    /// Steps to run, in order.
    #[serde(default = "default_steps")]
    pub steps: Vec<PipelineStep>,
    /// Bucket write serialization.
    #[serde(default)]
    pub encoding: BucketEncoding,
}

fn default_commit() -> bool {
    true
}

fn default_max_records() -> u32 {
    1000
}

fn default_steps() -> Vec<PipelineStep> {
    PipelineStep::ALL.to_vec()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            commit: default_commit(),
            max_records_per_run: default_max_records(),
            steps: default_steps(),
            encoding: BucketEncoding::default(),
        }
    }
}

impl PipelineConfig {
    pub fn run_context(&self) -> RunContext {
        RunContext {
            commit: self.commit,
            max_records: self.max_records_per_run,
        }
    }
}

/// SGCN reference data files.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SgcnConfig {
    /// Two-column "ProvidedName,PreferredName" taxonomic group mapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomic_group_mappings: Option<PathBuf>,
    /// One scientific name per line, the 2005 SWAP national list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap2005_list: Option<PathBuf>,
}

/// Sanitized config for logs and diagnostics (secrets redacted).
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub registry: SanitizedRegistryConfig,
    pub itis: ItisConfig,
    pub worms: WormsConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub natureserve: Option<SanitizedNatureServeConfig>,
    pub tess: TessConfig,
    pub sgcn: SgcnConfig,
    pub pipeline: PipelineConfig,
}

/// Sanitized registry config (API key hidden).
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRegistryConfig {
    pub base_url: String,
    pub table: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
}

/// Sanitized NatureServe config (access key hidden).
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedNatureServeConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            registry: SanitizedRegistryConfig {
                base_url: config.registry.base_url.clone(),
                table: config.registry.table.clone(),
                api_key_configured: !config.registry.api_key.is_empty(),
                timeout_secs: config.registry.timeout_secs,
            },
            itis: config.itis.clone(),
            worms: config.worms.clone(),
            natureserve: config.natureserve.as_ref().map(|ns| {
                SanitizedNatureServeConfig {
                    base_url: ns.base_url.clone(),
                    api_key_configured: !ns.api_key.is_empty(),
                    timeout_secs: ns.timeout_secs,
                }
            }),
            tess: config.tess.clone(),
            sgcn: config.sgcn.clone(),
            pipeline: config.pipeline.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[registry]
base_url = "https://gc2.example.org/api/v1/sql/bcb"
api_key = "secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.registry.timeout_secs, 30);
        assert_eq!(config.itis.base_url, "https://services.itis.gov/");
        assert!(config.natureserve.is_none());
        assert_eq!(config.pipeline.steps.len(), 6);
        assert_eq!(config.pipeline.encoding, BucketEncoding::Json);
    }

    #[test]
    fn test_deserialize_missing_registry_fails() {
        let result: Result<Config, _> = toml::from_str("[itis]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_step_subset() {
        let toml = r#"
[registry]
base_url = "https://gc2.example.org/api/v1/sql/bcb"
api_key = "secret"

[pipeline]
steps = ["itis", "common"]
encoding = "hstore_pairs"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.pipeline.steps,
            vec![PipelineStep::Itis, PipelineStep::CommonProperties]
        );
        assert_eq!(config.pipeline.encoding, BucketEncoding::HstorePairs);
    }

    #[test]
    fn test_deserialize_with_natureserve() {
        let toml = r#"
[registry]
base_url = "https://gc2.example.org/api/v1/sql/bcb"
api_key = "secret"

[natureserve]
api_key = "ns-key"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let ns = config.natureserve.unwrap();
        assert_eq!(ns.api_key, "ns-key");
        assert!(ns.base_url.contains("natureserve.org"));
    }

    #[test]
    fn test_run_context_from_pipeline_config() {
        let pipeline = PipelineConfig {
            commit: false,
            max_records_per_run: 10,
            ..Default::default()
        };
        let ctx = pipeline.run_context();
        assert!(!ctx.commit);
        assert_eq!(ctx.max_records, 10);
    }

    #[test]
    fn test_sanitized_config_hides_keys() {
        let toml = r#"
[registry]
base_url = "https://gc2.example.org/api/v1/sql/bcb"
api_key = "secret"

[natureserve]
api_key = "ns-key"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.registry.api_key_configured);
        assert!(sanitized.natureserve.as_ref().unwrap().api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("ns-key"));
    }
}
