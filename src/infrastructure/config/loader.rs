use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_concurrency: {0}. Must be between 1 and 64")]
    InvalidMaxConcurrency(usize),

    #[error("Invalid default_task_timeout_secs: {0}. Must be positive")]
    InvalidTaskTimeout(u64),

    #[error("Invalid max_loop_iterations: {0}. Must be at least 1")]
    InvalidMaxLoopIterations(u32),

    #[error(
        "Invalid default_loop_iterations: {0}. Must be between 1 and max_loop_iterations ({1})"
    )]
    InvalidDefaultLoopIterations(u32, u32),

    #[error("Fallback worker cannot be empty")]
    EmptyFallbackWorker,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .conductor/config.yaml (project config)
    /// 3. .conductor/local.yaml (project local overrides, optional)
    /// 4. Environment variables (CONDUCTOR_* prefix, highest priority)
    ///
    /// Configuration is always project-local (pwd/.conductor/) so multiple
    /// projects on one machine can carry different rule sets.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".conductor/config.yaml"))
            .merge(Yaml::file(".conductor/local.yaml"))
            .merge(Env::prefixed("CONDUCTOR_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.max_concurrency == 0 || config.max_concurrency > 64 {
            return Err(ConfigError::InvalidMaxConcurrency(config.max_concurrency));
        }

        if config.default_task_timeout_secs == 0 {
            return Err(ConfigError::InvalidTaskTimeout(
                config.default_task_timeout_secs,
            ));
        }

        if config.max_loop_iterations == 0 {
            return Err(ConfigError::InvalidMaxLoopIterations(
                config.max_loop_iterations,
            ));
        }

        if config.default_loop_iterations == 0
            || config.default_loop_iterations > config.max_loop_iterations
        {
            return Err(ConfigError::InvalidDefaultLoopIterations(
                config.default_loop_iterations,
                config.max_loop_iterations,
            ));
        }

        if config.fallback_worker.trim().is_empty() {
            return Err(ConfigError::EmptyFallbackWorker);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        for rule in &config.routing_rules {
            if rule.worker_id.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "routing rule worker_id cannot be empty".to_string(),
                ));
            }
            if rule.priority == 0 {
                return Err(ConfigError::ValidationFailed(format!(
                    "routing rule '{}' priority must be at least 1",
                    rule.worker_id
                )));
            }
            if !(0.0..=1.0).contains(&rule.confidence_threshold) {
                return Err(ConfigError::ValidationFailed(format!(
                    "routing rule '{}' confidence_threshold must be within [0.0, 1.0]",
                    rule.worker_id
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::RoutingRuleConfig;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.default_task_timeout_secs, 30);
        assert_eq!(config.fallback_worker, "generalist");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
max_concurrency: 8
default_task_timeout_secs: 60
cache_ttl_secs: 120
fallback_worker: catchall
logging:
  level: debug
  format: json
routing_rules:
  - worker_id: security
    keywords: [injection, exploit]
    patterns: ['sql injection']
    priority: 10
    confidence_threshold: 0.3
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.default_task_timeout_secs, 60);
        assert_eq!(config.cache_ttl_secs, 120);
        assert_eq!(config.fallback_worker, "catchall");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.routing_rules.len(), 1);
        assert_eq!(config.routing_rules[0].keywords.len(), 2);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let config = Config {
            max_concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxConcurrency(0)
        ));
    }

    #[test]
    fn test_validate_excess_concurrency() {
        let config = Config {
            max_concurrency: 65,
            ..Default::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxConcurrency(65)
        ));
    }

    #[test]
    fn test_validate_default_loop_iterations_above_bound() {
        let config = Config {
            max_loop_iterations: 5,
            default_loop_iterations: 6,
            ..Default::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidDefaultLoopIterations(6, 5)
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "verbose"),
            other => panic!("Expected InvalidLogLevel, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn test_validate_rule_threshold_out_of_range() {
        let config = Config {
            routing_rules: vec![RoutingRuleConfig {
                worker_id: "security".to_string(),
                keywords: vec!["injection".to_string()],
                patterns: vec![],
                priority: 10,
                confidence_threshold: 1.5,
                workflow_hint: None,
            }],
            ..Default::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::ValidationFailed(_)
        ));
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "max_concurrency: 2\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "max_concurrency: 8\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.max_concurrency, 8, "Override should win");
        assert_eq!(
            config.logging.level, "debug",
            "Override should win for nested fields"
        );
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
    }
}
