//! Saga state machine.

use serde::{Deserialize, Serialize};

/// The state of a saga in its lifecycle.
///
/// State transitions:
/// ```text
/// NotStarted ──► Running ──┬──► Completed
///                          ├──► Failed            (nothing to undo)
///                          └──► Compensating ──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// No step has run yet.
    #[default]
    NotStarted,

    /// Steps are being executed.
    Running,

    /// A step failed and compensating actions are in progress.
    Compensating,

    /// All steps completed successfully (terminal state).
    Completed,

    /// A step failed; any compensation has been attempted (terminal state).
    Failed,
}

impl SagaState {
    /// Returns true if another step may run.
    pub fn can_run(&self) -> bool {
        matches!(self, SagaState::NotStarted | SagaState::Running)
    }

    /// Returns true if the saga can begin compensation.
    pub fn can_compensate(&self) -> bool {
        matches!(self, SagaState::Running)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::NotStarted => "NotStarted",
            SagaState::Running => "Running",
            SagaState::Compensating => "Compensating",
            SagaState::Completed => "Completed",
            SagaState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
