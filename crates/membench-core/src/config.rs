use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level engine configuration.
///
/// Loaded once at process startup and threaded through the plan builder,
/// executor and durability layer. Nothing below is mutated after load.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub runs: RunsConfig,
    pub retry: RetryConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl EngineConfig {
    /// Load configuration from `MEMBENCH_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_env("MEMBENCH")
    }

    pub fn load_from_env(prefix: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(
                Environment::with_prefix(prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("runs.root_dir", "runs")?
            .set_default("retry.base_delay_ms", 1000)?
            .set_default("retry.max_delay_ms", 30000)?
            .set_default("retry.max_retries", 3)?
            .set_default("retry.jitter_factor", 0.5)?
            .set_default("execution.default_concurrency", 1)?;

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load configuration from a file, with environment overrides layered on
    /// top (environment wins).
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("MEMBENCH").separator("__"));

        let config = builder.build()?;
        config.try_deserialize()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            runs: RunsConfig::default(),
            retry: RetryConfig::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

/// Where run artifacts land on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct RunsConfig {
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
}

impl Default for RunsConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
        }
    }
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("runs")
}

/// Default retry/backoff parameters (spec.md 4.D). A benchmark manifest or
/// CLI flag may override these per run; this is only the engine-wide default.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_retries: default_max_retries(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_jitter_factor() -> f64 {
    0.5
}

/// Execution-pool defaults.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_concurrency")]
    pub default_concurrency: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            default_concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_config() {
        let retry = RetryConfig::default();
        assert_eq!(retry.base_delay_ms, 1000);
        assert_eq!(retry.max_delay_ms, 30_000);
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.jitter_factor, 0.5);
    }

    #[test]
    fn test_default_runs_config() {
        let runs = RunsConfig::default();
        assert_eq!(runs.root_dir, PathBuf::from("runs"));
    }

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.execution.default_concurrency, 1);
    }
}
