//! Target lifecycle and recovery-tracking engine for the havoc agent.
//!
//! Disrupting a node is the easy half of a chaos experiment; this crate owns
//! the hard half: remembering exactly which targets this agent took down and
//! replaying recovery across that set on demand. The rule, per target name,
//! is that a tracker entry exists iff the most recent successful lifecycle
//! operation was a stop not yet undone by a successful start or recovery.

pub mod factory;
pub mod manager;
pub mod outcome;
pub mod recovery;
pub mod target;
pub mod tracker;

pub use factory::{SystemTargetFactory, TargetFactory};
pub use manager::{OperationResult, TargetManager};
pub use outcome::{Outcome, OutcomeStatus};
pub use recovery::{RecoveryCoordinator, RecoveryError, RecoveryFailure, RecoveryReport};
pub use target::{DockerContainer, ServiceUnit, Target, TargetError, TargetKind};
pub use tracker::RecoveryTracker;
