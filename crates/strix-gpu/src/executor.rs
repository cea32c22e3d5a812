use crate::cmd::PendingState;

/// Opaque identifier correlating a flushed state batch with the draw or
/// dispatch that consumes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DrawToken(pub u64);

/// Consumer of completed pending state.
///
/// This is intentionally minimal: the executor owns command-buffer recording
/// and submission scheduling, both outside this layer. `submit` returns once
/// the host API calls implied by `state` have been scheduled ahead of the
/// draw identified by `token`.
pub trait CommandExecutor {
    fn submit(&mut self, state: PendingState, token: DrawToken);
}

/// Executor that records submissions instead of scheduling them.
///
/// Used by tests and diagnostics; the real executor lives with the backend.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    submissions: Vec<(PendingState, DrawToken)>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> &[(PendingState, DrawToken)] {
        &self.submissions
    }

    pub fn last(&self) -> Option<&(PendingState, DrawToken)> {
        self.submissions.last()
    }
}

impl CommandExecutor for RecordingExecutor {
    fn submit(&mut self, state: PendingState, token: DrawToken) {
        self.submissions.push((state, token));
    }
}
