use super::{types::Config, ConfigError};

/// Validate configuration beyond what serde enforces:
/// - registry base URL and API key are non-empty
/// - the records-per-run ceiling is non-zero
/// - the ITIS fuzzy level is a Solr edit-distance suffix
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.registry.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "registry.base_url cannot be empty".to_string(),
        ));
    }
    if config.registry.api_key.is_empty() {
        return Err(ConfigError::ValidationError(
            "registry.api_key cannot be empty".to_string(),
        ));
    }
    if config.pipeline.max_records_per_run == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.max_records_per_run cannot be 0".to_string(),
        ));
    }
    if !config.itis.fuzzy_level.starts_with('~') {
        return Err(ConfigError::ValidationError(format!(
            "itis.fuzzy_level must be a '~'-prefixed edit distance, got '{}'",
            config.itis.fuzzy_level
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_toml() -> &'static str {
        r#"
[registry]
base_url = "https://gc2.example.org/api/v1/sql/bcb"
api_key = "secret"
"#
    }

    #[test]
    fn test_validate_valid_config() {
        let config = load_config_from_str(valid_toml()).unwrap();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_api_key_fails() {
        let mut config = load_config_from_str(valid_toml()).unwrap();
        config.registry.api_key.clear();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_zero_record_ceiling_fails() {
        let mut config = load_config_from_str(valid_toml()).unwrap();
        config.pipeline.max_records_per_run = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_bad_fuzzy_level_fails() {
        let mut config = load_config_from_str(valid_toml()).unwrap();
        config.itis.fuzzy_level = "0.5".to_string();
        assert!(validate_config(&config).is_err());
    }
}
