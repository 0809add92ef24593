//! systemd service target driven through `systemctl`.

use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use async_trait::async_trait;
use havoc_common::config::ServiceConfig;

use super::{Target, TargetError, TargetKind};

/// Operating-system service controlled by shelling out to `systemctl`.
///
/// Each start/stop attempt is bounded by the configured timeout so a wedged
/// unit stalls only its own RPC.
#[derive(Debug, Clone)]
pub struct ServiceUnit {
    name: String,
    job: String,
    systemctl: PathBuf,
    attempt_timeout: Duration,
}

impl ServiceUnit {
    pub fn new(name: impl Into<String>, job: impl Into<String>, config: &ServiceConfig) -> Self {
        Self {
            name: name.into(),
            job: job.into(),
            systemctl: config.systemctl_path.clone(),
            attempt_timeout: config.unit_timeout,
        }
    }

    async fn run(&self, action: &'static str) -> Result<(), TargetError> {
        let mut command = Command::new(&self.systemctl);
        command.arg(action).arg(&self.name).kill_on_drop(true);
        debug!(unit = %self.name, action, program = %self.systemctl.display(), "invoking systemctl");

        let output = match timeout(self.attempt_timeout, command.output()).await {
            Err(_) => {
                return Err(TargetError::UnitTimeout {
                    action,
                    unit: self.name.clone(),
                    timeout_secs: self.attempt_timeout.as_secs(),
                })
            }
            Ok(result) => result.map_err(|source| TargetError::Spawn {
                program: self.systemctl.display().to_string(),
                source,
            })?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(TargetError::UnitFailed {
                program: self.systemctl.display().to_string(),
                action,
                unit: self.name.clone(),
                code: output
                    .status
                    .code()
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "signal".to_owned()),
                stderr,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Target for ServiceUnit {
    fn kind(&self) -> TargetKind {
        TargetKind::Service
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn job(&self) -> &str {
        &self.job
    }

    async fn start(&self) -> Result<String, TargetError> {
        self.run("start").await?;
        Ok(format!("started service {}", self.name))
    }

    async fn stop(&self) -> Result<String, TargetError> {
        self.run("stop").await?;
        Ok(format!("stopped service {}", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_with(program: &str, timeout: Duration) -> ServiceUnit {
        let config = ServiceConfig {
            systemctl_path: PathBuf::from(program),
            unit_timeout: timeout,
        };
        ServiceUnit::new("crond", "latency-experiment", &config)
    }

    #[tokio::test]
    async fn successful_start_reports_unit_name() {
        let unit = unit_with("true", Duration::from_secs(5));
        let message = unit.start().await.unwrap();
        assert_eq!(message, "started service crond");
    }

    #[tokio::test]
    async fn failing_command_surfaces_exit_status() {
        let unit = unit_with("false", Duration::from_secs(5));
        let err = unit.stop().await.unwrap_err();
        match err {
            TargetError::UnitFailed { action, unit, code, .. } => {
                assert_eq!(action, "stop");
                assert_eq!(unit, "crond");
                assert_eq!(code, "1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unspawnable_program_is_a_spawn_error() {
        let unit = unit_with("/nonexistent/systemctl", Duration::from_secs(5));
        let err = unit.start().await.unwrap_err();
        assert!(matches!(err, TargetError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_command_hits_the_deadline() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slowctl");
        let mut file = std::fs::File::create(&script).unwrap();
        writeln!(file, "#!/bin/sh\nsleep 5").unwrap();
        drop(file);
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let unit = unit_with(script.to_str().unwrap(), Duration::from_millis(100));
        let err = unit.start().await.unwrap_err();
        match err {
            TargetError::UnitTimeout { unit, .. } => assert_eq!(unit, "crond"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
