//! Uniform status envelope for lifecycle operations.

/// Envelope status, mirrored one-to-one onto the wire-level
/// `StatusResponse.Status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Fail,
}

/// Human-readable outcome of a single lifecycle operation.
///
/// The message identifies the target even on failure, so it can be displayed
/// verbatim by controllers aggregating many agents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: OutcomeStatus,
    pub message: String,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Success,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Fail,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}
