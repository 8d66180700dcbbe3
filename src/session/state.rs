//! Per-test state machine.
//!
//! ```text
//!  IDLE ──[start]──▶ RUNNING ──[completed]──▶ SUCCESS   (terminal)
//!                      │  ▲
//!               [failed]  [start]
//!                      ▼  │
//!                     FAILED
//! ```
//!
//! Transitions not drawn above are rejected by [`TestStatus::next`]
//! returning `None`; the session treats that as a no-op.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Status of a single test within a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    #[default]
    Idle,
    Running,
    Success,
    Failed,
}

/// Inputs that drive a [`TestStatus`] transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestEvent {
    /// Operator asked for the test (first run or retry).
    Start,
    /// The pod confirmed the test completed.
    Completed,
    /// Transport fault, non-completed status, or no answer.
    Failed,
}

impl TestStatus {
    /// Transition table.  `None` means the event is not accepted here.
    pub const fn next(self, event: TestEvent) -> Option<Self> {
        match (self, event) {
            (Self::Idle | Self::Failed, TestEvent::Start) => Some(Self::Running),
            (Self::Running, TestEvent::Completed) => Some(Self::Success),
            (Self::Running, TestEvent::Failed) => Some(Self::Failed),
            _ => None,
        }
    }

    /// `Success` never leaves; re-running it is a no-op.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
