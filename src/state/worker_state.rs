/// Worker state definitions for tracking crawl progress
///
/// A worker moves through `Created -> Running -> Done | Failed`. A worker may
/// also fail before it starts running (for example when its sink cannot be
/// created).
use std::fmt;

/// Represents the current state of a crawl worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    // ===== Active States =====
    /// Worker has been constructed but not yet started
    Created,

    /// Worker is walking its assigned range
    Running,

    // ===== Terminal States =====
    /// Worker finished its whole range
    Done,

    /// Worker stopped early; its sink is discarded
    Failed,
}

impl WorkerState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the worker produced a complete result
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Running)
                | (Self::Created, Self::Failed)
                | (Self::Running, Self::Done)
                | (Self::Running, Self::Failed)
        )
    }

    /// Returns a lowercase name for logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
