use crate::scheduler::DelayRange;
use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for the automation runs engine
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrchestratorConfig {
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Simulated automation behaviour
    pub simulation: SimulationConfig,
    /// Graceful shutdown settings
    pub shutdown: ShutdownConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level or EnvFilter directive, overridden by RUST_LOG
    pub log_level: String,
    /// Emit JSON lines instead of human readable logs
    pub json_logs: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Chance that a started run pauses on a checkpoint (0.0 - 1.0)
    pub checkpoint_probability: f64,
    /// Delay before a started run raises a checkpoint or completes
    pub progress_delay: DelayConfig,
    /// Delay before a resolved run attempts completion
    pub completion_delay: DelayConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct DelayConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl From<DelayConfig> for DelayRange {
    fn from(config: DelayConfig) -> Self {
        DelayRange::from_millis(config.min_ms, config.max_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ShutdownConfig {
    /// How long to wait for scheduled work before giving up
    pub drain_timeout_seconds: u64,
}

impl ShutdownConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_seconds)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
            simulation: SimulationConfig {
                checkpoint_probability: 0.15,
                progress_delay: DelayConfig {
                    min_ms: 1500,
                    max_ms: 4000,
                },
                completion_delay: DelayConfig {
                    min_ms: 800,
                    max_ms: 2000,
                },
            },
            shutdown: ShutdownConfig {
                drain_timeout_seconds: 30,
            },
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (automation-runs.toml)
    /// 3. Environment variables (prefixed with AUTOMATION_RUNS__)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("automation-runs.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("AUTOMATION_RUNS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<OrchestratorConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = OrchestratorConfig::load_env_file();
        OrchestratorConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static OrchestratorConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load_without_file() {
        let config = OrchestratorConfig::load_from(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config.simulation, OrchestratorConfig::default().simulation);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("automation-runs.toml");

        let mut custom = OrchestratorConfig::default();
        custom.simulation.checkpoint_probability = 0.5;
        custom.simulation.progress_delay = DelayConfig {
            min_ms: 10,
            max_ms: 20,
        };
        custom.save_to_file(&path).unwrap();

        let loaded = OrchestratorConfig::load_from(&path).unwrap();
        assert_eq!(loaded.simulation.checkpoint_probability, 0.5);
        assert_eq!(
            DelayRange::from(loaded.simulation.progress_delay),
            DelayRange::from_millis(10, 20)
        );
    }

    #[test]
    fn test_drain_timeout() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.shutdown.drain_timeout(), Duration::from_secs(30));
    }
}
