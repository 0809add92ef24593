//! Pluggable construction of targets, keyed by kind, name, and job label.

use std::sync::Arc;

use bollard::Docker;

use havoc_common::config::{DockerConfig, ServiceConfig};

use crate::target::{DockerContainer, ServiceUnit, Target, TargetKind};

/// Builds a fresh [`Target`] per request.
///
/// Handlers never reuse target instances across requests; the factory seam is
/// also where tests substitute scripted targets for the real capabilities.
pub trait TargetFactory: Send + Sync {
    fn build(&self, kind: TargetKind, name: &str, job: &str) -> Arc<dyn Target>;
}

/// Production factory handing out systemctl- and Docker-backed targets.
#[derive(Clone)]
pub struct SystemTargetFactory {
    docker: Docker,
    service: ServiceConfig,
    containers: DockerConfig,
}

impl SystemTargetFactory {
    pub fn new(docker: Docker, service: ServiceConfig, containers: DockerConfig) -> Self {
        Self {
            docker,
            service,
            containers,
        }
    }
}

impl TargetFactory for SystemTargetFactory {
    fn build(&self, kind: TargetKind, name: &str, job: &str) -> Arc<dyn Target> {
        match kind {
            TargetKind::Service => Arc::new(ServiceUnit::new(name, job, &self.service)),
            TargetKind::Container => Arc::new(DockerContainer::new(
                self.docker.clone(),
                name,
                job,
                &self.containers,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_builds_the_requested_kind() {
        let docker = Docker::connect_with_local_defaults().unwrap();
        let factory =
            SystemTargetFactory::new(docker, ServiceConfig::default(), DockerConfig::default());

        let service = factory.build(TargetKind::Service, "crond", "job-1");
        assert_eq!(service.kind(), TargetKind::Service);
        assert_eq!(service.name(), "crond");

        let container = factory.build(TargetKind::Container, "payments-db", "job-1");
        assert_eq!(container.kind(), TargetKind::Container);
        assert_eq!(container.job(), "job-1");
    }
}
