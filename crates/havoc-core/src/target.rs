//! Target capability contract and the built-in implementations.

use std::fmt;

use async_trait::async_trait;

pub mod docker;
pub mod service;

pub use docker::DockerContainer;
pub use service::ServiceUnit;

/// Kind of disruptable target the agent knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Service,
    Container,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Service => "service",
            TargetKind::Container => "container",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named unit of disruption: something the agent can take down and later
/// bring back.
///
/// Implementations perform the side effect and return a human-readable,
/// target-identifying message on success. A fresh instance is built per
/// request; the recovery tracker keeps the instance that performed a
/// successful stop so the identical snapshot restarts the target later.
/// Futures returned here are cancel-safe in the usual sense: dropping them
/// abandons the attempt without touching the tracker.
#[async_trait]
pub trait Target: Send + Sync {
    fn kind(&self) -> TargetKind;
    fn name(&self) -> &str;
    /// Label of the experiment this disruption belongs to. Informational.
    fn job(&self) -> &str;

    /// Bring the target back up.
    async fn start(&self) -> Result<String, TargetError>;

    /// Take the target down.
    async fn stop(&self) -> Result<String, TargetError>;
}

/// Failure of the underlying start/stop mechanics.
///
/// The `Display` text is suitable for direct operator display; callers never
/// retry automatically.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// The control binary could not be spawned at all.
    #[error("unable to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The control binary ran and reported failure.
    #[error("{program} {action} {unit} exited with status {code}: {stderr}")]
    UnitFailed {
        program: String,
        action: &'static str,
        unit: String,
        code: String,
        stderr: String,
    },

    /// The unit operation did not finish within the configured deadline.
    #[error("{action} of service {unit} timed out after {timeout_secs}s")]
    UnitTimeout {
        action: &'static str,
        unit: String,
        timeout_secs: u64,
    },

    /// The Docker daemon rejected or failed the operation.
    #[error("docker {action} of container {container} failed: {source}")]
    Docker {
        action: &'static str,
        container: String,
        #[source]
        source: bollard::errors::Error,
    },
}
