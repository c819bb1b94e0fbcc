//! Server Configuration
//!
//! Layered with the `config` crate, lowest precedence first: built-in
//! defaults, the optional `config/coffee-health.toml` file, `COFFEE_HEALTH__*`
//! environment variables (for example `COFFEE_HEALTH__SERVER__HOST`), and
//! finally the platform `PORT` variable for `server.port`.

use config::{Config, ConfigError, Environment, File};
use inference_engine::{ArtifactPaths, LifecycleSettings, TrainingConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::rate_limit::RateLimitConfig;

/// Config file looked up relative to the working directory (extension optional)
pub const DEFAULT_CONFIG_FILE: &str = "config/coffee-health";

const ENV_PREFIX: &str = "COFFEE_HEALTH";

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub model: LifecycleSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Directory served for paths no route matches
    pub static_dir: Option<PathBuf>,
    pub rate_limit: RateLimitConfig,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `trace`, `debug`, `info`, `warn` or `error`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 5000,
                static_dir: None,
                rate_limit: RateLimitConfig::default(),
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                json: false,
            },
            model: LifecycleSettings {
                dataset_path: PathBuf::from("synthetic_coffee_health_10000.csv"),
                artifacts: ArtifactPaths::in_dir("artifacts"),
                training: TrainingConfig::default(),
            },
        }
    }
}

impl Settings {
    /// Load settings from the default file, process environment and `PORT`
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(
            DEFAULT_CONFIG_FILE,
            Environment::with_prefix(ENV_PREFIX).separator("__"),
            std::env::var("PORT").ok(),
        )
    }

    /// Load settings from explicit sources
    pub fn from_sources(
        config_file: &str,
        environment: Environment,
        port: Option<String>,
    ) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name(config_file).required(false))
            .add_source(environment)
            .set_override_option("server.port", port)?
            .build()?
            .try_deserialize()
    }

    /// `host:port` for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).separator("__").source(Some(map))
    }

    fn no_file() -> String {
        let dir = std::env::temp_dir();
        dir.join("coffee-health-absent-config").display().to_string()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_sources(&no_file(), env(&[]), None).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.bind_addr(), "0.0.0.0:5000");
        assert!(!settings.server.rate_limit.enabled);
        assert_eq!(settings.model.training.seed, 136);
    }

    #[test]
    fn test_port_override_wins() {
        let settings = Settings::from_sources(
            &no_file(),
            env(&[("COFFEE_HEALTH__SERVER__PORT", "7000")]),
            Some("8123".to_string()),
        )
        .unwrap();
        assert_eq!(settings.server.port, 8123);
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let settings = Settings::from_sources(
            &no_file(),
            env(&[
                ("COFFEE_HEALTH__LOGGING__LEVEL", "debug"),
                ("COFFEE_HEALTH__MODEL__DATASET_PATH", "/data/coffee.csv"),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.model.dataset_path, PathBuf::from("/data/coffee.csv"));
    }

    #[test]
    fn test_file_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9001\nstatic_dir = \"public\"\n\n[model.training]\ntest_fraction = 0.25\n",
        )
        .unwrap();

        let settings =
            Settings::from_sources(&path.display().to_string(), env(&[]), None).unwrap();
        assert_eq!(settings.server.port, 9001);
        assert_eq!(settings.server.static_dir, Some(PathBuf::from("public")));
        assert_eq!(settings.model.training.test_fraction, 0.25);
        assert_eq!(settings.model.training.max_iter, 1000);
    }
}
