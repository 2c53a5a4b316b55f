use serde::{Deserialize, Serialize};

/// Main configuration structure for Conductor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Maximum number of concurrently executing tasks (1-64)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Default per-task time budget in seconds
    #[serde(default = "default_task_timeout_secs")]
    pub default_task_timeout_secs: u64,

    /// Hard upper bound on loop workflow iterations
    #[serde(default = "default_max_loop_iterations")]
    pub max_loop_iterations: u32,

    /// How many iterations a loop detected from plain text runs by default
    #[serde(default = "default_loop_iterations")]
    pub default_loop_iterations: u32,

    /// TTL for cached dispatch responses, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Worker used when no routing rule meets its threshold and the
    /// task type is not in the fallback table
    #[serde(default = "default_fallback_worker")]
    pub fallback_worker: String,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Optional routing rule overrides; empty means built-in rules
    #[serde(default)]
    pub routing_rules: Vec<RoutingRuleConfig>,
}

const fn default_max_concurrency() -> usize {
    4
}

const fn default_task_timeout_secs() -> u64 {
    30
}

const fn default_max_loop_iterations() -> u32 {
    25
}

const fn default_loop_iterations() -> u32 {
    3
}

const fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_fallback_worker() -> String {
    "generalist".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            default_task_timeout_secs: default_task_timeout_secs(),
            max_loop_iterations: default_max_loop_iterations(),
            default_loop_iterations: default_loop_iterations(),
            cache_ttl_secs: default_cache_ttl_secs(),
            fallback_worker: default_fallback_worker(),
            logging: LoggingConfig::default(),
            routing_rules: vec![],
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// A routing rule as it appears in configuration files.
///
/// Converted into a validated `RoutingRule` by the router at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RoutingRuleConfig {
    pub worker_id: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    pub priority: u32,
    pub confidence_threshold: f64,
    #[serde(default)]
    pub workflow_hint: Option<String>,
}
