//! Batch recovery across every tracked target.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::outcome::Outcome;
use crate::target::TargetError;
use crate::tracker::RecoveryTracker;

/// A single restart failure inside a recovery pass.
#[derive(Debug)]
pub struct RecoveryFailure {
    pub name: String,
    pub error: TargetError,
}

impl fmt::Display for RecoveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.error)
    }
}

/// Aggregated error for a partially failed recovery pass.
///
/// Carries every cause in processing order instead of a nested wrap chain, so
/// no individual failure is silently dropped and callers can inspect each
/// one.
#[derive(Debug, thiserror::Error)]
#[error("recovery failed for {} target(s): {}", .causes.len(), .causes.join("; "))]
pub struct RecoveryError {
    pub causes: Vec<String>,
}

/// Ordered per-target outcomes of one recovery pass.
#[derive(Debug)]
pub struct RecoveryReport {
    pub outcomes: Vec<Outcome>,
    pub failures: Vec<RecoveryFailure>,
}

impl RecoveryReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Aggregated error, present iff at least one target failed to restart.
    pub fn error(&self) -> Option<RecoveryError> {
        if self.failures.is_empty() {
            return None;
        }
        Some(RecoveryError {
            causes: self.failures.iter().map(ToString::to_string).collect(),
        })
    }
}

/// Replays recovery across the tracked set, draining entries that restart.
pub struct RecoveryCoordinator {
    tracker: Arc<RecoveryTracker>,
}

impl RecoveryCoordinator {
    pub fn new(tracker: Arc<RecoveryTracker>) -> Self {
        Self { tracker }
    }

    /// Attempt to restart every tracked target.
    ///
    /// Operates on a snapshot taken at entry; a stop of a different name
    /// landing mid-pass is tracked but not part of this batch. One failing
    /// target never blocks the rest, and each outcome reflects only its own
    /// start attempt. An empty tracker yields an empty report, the common
    /// no-disruptions-outstanding case.
    pub async fn recover(&self) -> RecoveryReport {
        let targets = self.tracker.snapshot();
        let mut outcomes = Vec::with_capacity(targets.len());
        let mut failures = Vec::new();

        for target in targets {
            let name = target.name().to_owned();
            match target.start().await {
                Ok(message) => {
                    self.tracker.remove(&name);
                    info!(kind = %target.kind(), name = %name, "recovered target; tracker entry removed");
                    outcomes.push(Outcome::success(message));
                }
                Err(error) => {
                    warn!(kind = %target.kind(), name = %name, error = %error, "recovery attempt failed; tracker entry retained");
                    outcomes.push(Outcome::fail(format!(
                        "failed to recover {} {}",
                        target.kind(),
                        name
                    )));
                    failures.push(RecoveryFailure { name, error });
                }
            }
        }

        info!(
            recovered = outcomes.len() - failures.len(),
            failed = failures.len(),
            "recovery pass complete"
        );
        RecoveryReport { outcomes, failures }
    }
}
