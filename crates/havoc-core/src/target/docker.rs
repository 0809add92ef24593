//! Docker container target driven through the bollard API client.

use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{StartContainerOptions, StopContainerOptions};
use bollard::Docker;
use tracing::debug;

use havoc_common::config::DockerConfig;

use super::{Target, TargetError, TargetKind};

/// Container controlled through the local Docker daemon.
///
/// The client is constructed without touching the daemon, so an unreachable
/// daemon surfaces per call as a capability failure rather than at agent
/// startup.
#[derive(Clone)]
pub struct DockerContainer {
    name: String,
    job: String,
    docker: Docker,
    stop_grace: Duration,
}

impl DockerContainer {
    pub fn new(
        docker: Docker,
        name: impl Into<String>,
        job: impl Into<String>,
        config: &DockerConfig,
    ) -> Self {
        Self {
            name: name.into(),
            job: job.into(),
            docker,
            stop_grace: config.stop_grace,
        }
    }
}

#[async_trait]
impl Target for DockerContainer {
    fn kind(&self) -> TargetKind {
        TargetKind::Container
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn job(&self) -> &str {
        &self.job
    }

    async fn start(&self) -> Result<String, TargetError> {
        debug!(container = %self.name, "starting container");
        self.docker
            .start_container(&self.name, None::<StartContainerOptions<String>>)
            .await
            .map_err(|source| TargetError::Docker {
                action: "start",
                container: self.name.clone(),
                source,
            })?;
        Ok(format!("started container {}", self.name))
    }

    async fn stop(&self) -> Result<String, TargetError> {
        debug!(container = %self.name, grace_secs = self.stop_grace.as_secs(), "stopping container");
        let options = StopContainerOptions {
            t: self.stop_grace.as_secs() as i64,
        };
        self.docker
            .stop_container(&self.name, Some(options))
            .await
            .map_err(|source| TargetError::Docker {
                action: "stop",
                container: self.name.clone(),
                source,
            })?;
        Ok(format!("stopped container {}", self.name))
    }
}
