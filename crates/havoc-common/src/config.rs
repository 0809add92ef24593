//! Agent configuration loading.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_listen() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default listen address")
}

fn default_systemctl_path() -> PathBuf {
    PathBuf::from("systemctl")
}

fn default_unit_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_stop_grace() -> Duration {
    Duration::from_secs(10)
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

/// Primary configuration object for the havoc agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Transport settings for the gRPC control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Settings for the systemd service target.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Binary used to drive units. Overridable for sandboxed test setups.
    #[serde(default = "default_systemctl_path")]
    pub systemctl_path: PathBuf,
    /// Upper bound on a single start/stop attempt, in seconds.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_unit_timeout")]
    pub unit_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            systemctl_path: default_systemctl_path(),
            unit_timeout: default_unit_timeout(),
        }
    }
}

/// Settings for the Docker container target.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerConfig {
    /// Grace period granted to a container before the daemon kills it, in seconds.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_stop_grace")]
    pub stop_grace: Duration,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            stop_grace: default_stop_grace(),
        }
    }
}

/// Logging sink configuration consumed by [`crate::logging::init_tracing`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    /// Prefix for the rolling log file. Defaults to the service name.
    #[serde(default)]
    pub file_prefix: Option<String>,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            file_prefix: None,
            format: default_log_format(),
        }
    }
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    /// `None` when no file was found and built-in defaults were used.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "HAVOC_CONFIG";

    /// Load configuration from disk, respecting the `HAVOC_CONFIG` override.
    ///
    /// Candidates are tried in order; when none exists the built-in defaults
    /// are returned so the agent can come up on a bare node.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        debug!("no configuration file found; using built-in defaults");
        Ok(LoadedAppConfig {
            config: Self::default(),
            source: None,
        })
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.service.unit_timeout.is_zero() {
            return Err(anyhow!("service.unit_timeout must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = toml::from_str::<AppConfig>("").unwrap();
        assert_eq!(config.agent.listen, default_listen());
        assert_eq!(config.service.systemctl_path, PathBuf::from("systemctl"));
        assert_eq!(config.service.unit_timeout, Duration::from_secs(30));
        assert_eq!(config.docker.stop_grace, Duration::from_secs(10));
        assert_eq!(config.logging.format, LogFormat::StructuredJson);
    }

    #[test]
    fn full_document_parses() {
        let config = toml::from_str::<AppConfig>(
            r#"
            [agent]
            listen = "127.0.0.1:9000"

            [service]
            systemctl_path = "/usr/bin/systemctl"
            unit_timeout = 5

            [docker]
            stop_grace = 3

            [logging]
            directory = "/var/log/havoc"
            file_prefix = "node-7"
            format = "pretty"
            "#,
        )
        .unwrap();
        assert_eq!(config.agent.listen, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.service.unit_timeout, Duration::from_secs(5));
        assert_eq!(config.docker.stop_grace, Duration::from_secs(3));
        assert_eq!(config.logging.file_prefix.as_deref(), Some("node-7"));
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn missing_candidates_fall_back_to_defaults() {
        let loaded = AppConfig::load(&["does/not/exist.toml"]).unwrap();
        assert!(loaded.source.is_none());
        assert_eq!(loaded.config.agent.listen, default_listen());
    }

    #[test]
    fn first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[agent]\nlisten = \"127.0.0.1:7777\"").unwrap();

        let missing = dir.path().join("missing.toml");
        let loaded = AppConfig::load(&[missing, path.clone()]).unwrap();
        assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.config.agent.listen, "127.0.0.1:7777".parse().unwrap());
    }

    #[test]
    fn zero_unit_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.toml");
        fs::write(&path, "[service]\nunit_timeout = 0\n").unwrap();
        let err = AppConfig::load(&[path]).unwrap_err();
        assert!(err.to_string().contains("unit_timeout"));
    }
}
