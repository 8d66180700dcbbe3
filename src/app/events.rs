//! Outbound certification events.
//!
//! The [`CertService`](super::service::CertService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them: log a line, raise a UI notice, append to an
//! audit trail.

use crate::catalog::TestId;
use crate::error::{PreconditionError, TestFailure};
use crate::session::{PodId, TestResult};

/// Structured events emitted by the certification core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertEvent {
    /// A test moved to `Running`.
    TestStarted(TestId),

    /// The pod (or the local stand-in) confirmed completion.
    TestPassed { test: TestId, result: TestResult },

    /// The test ended in `Failed`.  Carries an operator notice.
    TestFailed {
        test: TestId,
        failure: TestFailure,
        result: TestResult,
    },

    /// A run request was refused; nothing changed.
    RunRejected {
        test: TestId,
        reason: PreconditionError,
    },

    /// Every test passed and the operator confirmed.  The session is reset.
    Certified(PodId),

    /// Certification was requested too early; nothing changed.
    CertifyRejected(PreconditionError),

    /// The workflow was abandoned; the session is back to all-idle.
    SessionReset(PodId),
}

impl CertEvent {
    /// User-facing notice text for events an operator must see.
    pub fn notice(&self) -> Option<String> {
        match self {
            Self::TestFailed {
                test,
                failure,
                result,
            } => {
                let mut msg = format!("{} test failed: {failure}", test.label());
                if let Some(n) = result.doors_failed() {
                    msg.push_str(&format!(" ({n} doors failed)"));
                }
                Some(msg)
            }
            Self::CertifyRejected(reason) => Some(format!("Cannot certify yet: {reason}")),
            _ => None,
        }
    }
}
