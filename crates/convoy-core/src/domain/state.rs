//! Task lifecycle state.

use serde::{Deserialize, Serialize};

/// State of a single Task.
///
/// State transitions:
/// - Idle -> Running -> Succeeded
/// - Idle -> Running -> Failed
/// - Idle -> Running -> Cancelled
/// - Idle -> Cancelled (cancelled before it was ever run)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Created, not submitted yet.
    Idle,

    /// Waiting on the network collaborator.
    Running,

    Succeeded,

    /// Produced a failure envelope (or error).
    Failed,

    Cancelled,
}

impl TaskState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::idle(TaskState::Idle, false)]
    #[case::running(TaskState::Running, false)]
    #[case::succeeded(TaskState::Succeeded, true)]
    #[case::failed(TaskState::Failed, true)]
    #[case::cancelled(TaskState::Cancelled, true)]
    fn terminal_states(#[case] state: TaskState, #[case] terminal: bool) {
        assert_eq!(state.is_terminal(), terminal);
    }
}
