//! Start/stop request handling with recovery-set bookkeeping.

use std::sync::Arc;

use tracing::{info, warn};

use crate::factory::TargetFactory;
use crate::outcome::Outcome;
use crate::target::{TargetError, TargetKind};
use crate::tracker::RecoveryTracker;

/// Result of a single start/stop request.
///
/// The envelope always carries a target-identifying message; the typed error
/// is present exactly when the operation failed, so the transport layer can
/// surface both signals.
#[derive(Debug)]
pub struct OperationResult {
    pub outcome: Outcome,
    pub error: Option<TargetError>,
}

impl OperationResult {
    fn success(message: String) -> Self {
        Self {
            outcome: Outcome::success(message),
            error: None,
        }
    }

    fn fail(message: String, error: TargetError) -> Self {
        Self {
            outcome: Outcome::fail(message),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-request lifecycle handler.
///
/// Start and stop share one shape (build a fresh target, drive the
/// capability, adjust the tracker, fold into an envelope) and differ only in
/// the direction of the tracker mutation. Tracker membership changes on
/// success alone; a failed call leaves the recovery set exactly as it was.
pub struct TargetManager {
    factory: Arc<dyn TargetFactory>,
    tracker: Arc<RecoveryTracker>,
}

impl TargetManager {
    pub fn new(factory: Arc<dyn TargetFactory>, tracker: Arc<RecoveryTracker>) -> Self {
        Self { factory, tracker }
    }

    /// Start a target. A successful start always clears any tracked entry
    /// for the name; clearing an absent entry is a no-op.
    pub async fn start(&self, kind: TargetKind, name: &str, job: &str) -> OperationResult {
        let target = self.factory.build(kind, name, job);
        match target.start().await {
            Ok(message) => {
                self.tracker.remove(name);
                info!(kind = %kind, name, job, "target started");
                OperationResult::success(message)
            }
            Err(error) => {
                warn!(kind = %kind, name, job, error = %error, "target start failed");
                OperationResult::fail(format!("failed to start {kind} {name}"), error)
            }
        }
    }

    /// Stop a target. The snapshot that performed a successful stop is
    /// remembered for later recovery, overwriting any previous entry for the
    /// name.
    pub async fn stop(&self, kind: TargetKind, name: &str, job: &str) -> OperationResult {
        let target = self.factory.build(kind, name, job);
        match target.stop().await {
            Ok(message) => {
                self.tracker.put(Arc::clone(&target));
                info!(kind = %kind, name, job, "target stopped and tracked for recovery");
                OperationResult::success(message)
            }
            Err(error) => {
                warn!(kind = %kind, name, job, error = %error, "target stop failed");
                OperationResult::fail(format!("failed to stop {kind} {name}"), error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::target::Target;

    struct ScriptedTarget {
        kind: TargetKind,
        name: String,
        job: String,
        start_ok: bool,
        stop_ok: bool,
    }

    impl ScriptedTarget {
        fn failure(&self, action: &'static str) -> TargetError {
            TargetError::UnitFailed {
                program: "systemctl".to_owned(),
                action,
                unit: self.name.clone(),
                code: "1".to_owned(),
                stderr: "scripted failure".to_owned(),
            }
        }
    }

    #[async_trait]
    impl Target for ScriptedTarget {
        fn kind(&self) -> TargetKind {
            self.kind
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn job(&self) -> &str {
            &self.job
        }

        async fn start(&self) -> Result<String, TargetError> {
            if self.start_ok {
                Ok(format!("started {} {}", self.kind, self.name))
            } else {
                Err(self.failure("start"))
            }
        }

        async fn stop(&self) -> Result<String, TargetError> {
            if self.stop_ok {
                Ok(format!("stopped {} {}", self.kind, self.name))
            } else {
                Err(self.failure("stop"))
            }
        }
    }

    struct ScriptedFactory {
        start_ok: bool,
        stop_ok: bool,
    }

    impl TargetFactory for ScriptedFactory {
        fn build(&self, kind: TargetKind, name: &str, job: &str) -> Arc<dyn Target> {
            Arc::new(ScriptedTarget {
                kind,
                name: name.to_owned(),
                job: job.to_owned(),
                start_ok: self.start_ok,
                stop_ok: self.stop_ok,
            })
        }
    }

    fn manager(start_ok: bool, stop_ok: bool) -> (TargetManager, Arc<RecoveryTracker>) {
        let tracker = Arc::new(RecoveryTracker::new());
        let factory = Arc::new(ScriptedFactory { start_ok, stop_ok });
        (
            TargetManager::new(factory, Arc::clone(&tracker)),
            tracker,
        )
    }

    #[tokio::test]
    async fn successful_stop_tracks_the_snapshot() {
        let (manager, tracker) = manager(true, true);
        let result = manager
            .stop(TargetKind::Service, "svc-a", "job-1")
            .await;
        assert!(result.is_success());
        assert_eq!(result.outcome.message, "stopped service svc-a");
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.get("svc-a").unwrap().job(), "job-1");
    }

    #[tokio::test]
    async fn successful_start_clears_the_entry() {
        let (manager, tracker) = manager(true, true);
        manager.stop(TargetKind::Service, "svc-a", "job-1").await;
        let result = manager
            .start(TargetKind::Service, "svc-a", "job-1")
            .await;
        assert!(result.is_success());
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn start_without_entry_is_a_no_op_both_times() {
        let (manager, tracker) = manager(true, true);
        for _ in 0..2 {
            let result = manager
                .start(TargetKind::Service, "svc-a", "job-1")
                .await;
            assert!(result.is_success());
            assert!(tracker.is_empty());
        }
    }

    #[tokio::test]
    async fn failed_start_leaves_membership_untouched() {
        let (manager, tracker) = manager(false, true);
        manager.stop(TargetKind::Service, "svc-a", "job-1").await;
        let result = manager
            .start(TargetKind::Service, "svc-a", "job-1")
            .await;
        assert!(!result.is_success());
        assert_eq!(result.outcome.message, "failed to start service svc-a");
        assert!(result.error.is_some());
        assert_eq!(tracker.len(), 1);
    }

    #[tokio::test]
    async fn failed_stop_leaves_the_tracker_empty() {
        let (manager, tracker) = manager(true, false);
        let result = manager
            .stop(TargetKind::Container, "payments-db", "job-1")
            .await;
        assert!(!result.is_success());
        assert_eq!(result.outcome.message, "failed to stop container payments-db");
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn restop_overwrites_the_tracked_snapshot() {
        let (manager, tracker) = manager(true, true);
        manager.stop(TargetKind::Service, "svc-a", "job-1").await;
        manager.stop(TargetKind::Service, "svc-a", "job-2").await;
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.get("svc-a").unwrap().job(), "job-2");
    }
}
