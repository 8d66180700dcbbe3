//! Certification session: the per-pod aggregate.
//!
//! A [`CertificationSession`] owns the status of every test in
//! [`TestId::ALL`], the single "currently running" marker that enforces
//! global mutual exclusion, and the cached outcome of the most recently
//! finished test.  It is transient: created when an operator opens the
//! workflow for a pod, reset on certification or abandonment, never
//! persisted.
//!
//! All mutation goes through [`begin`](CertificationSession::begin),
//! [`finish`](CertificationSession::finish),
//! [`certify`](CertificationSession::certify) and
//! [`reset`](CertificationSession::reset).  Each either applies a legal
//! state-machine transition or leaves the session untouched.

pub mod state;

use core::fmt;
use std::collections::BTreeMap;

use log::{debug, info};
use serde::Serialize;

use crate::catalog::TestId;
use crate::error::{PodIdError, PreconditionError};

pub use state::{TestEvent, TestStatus};

// ---------------------------------------------------------------------------
// Pod identifier
// ---------------------------------------------------------------------------

/// Validated pod identifier.  Doubles as the messaging topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PodId(String);

impl PodId {
    /// Onboarding caps pod ids at this many characters.
    pub const MAX_LEN: usize = 20;

    pub fn new(raw: &str) -> Result<Self, PodIdError> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(PodIdError::Empty);
        }
        let len = id.chars().count();
        if len > Self::MAX_LEN {
            return Err(PodIdError::TooLong {
                len,
                max: Self::MAX_LEN,
            });
        }
        if let Some(c) = id
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#'))
        {
            return Err(PodIdError::InvalidChar(c));
        }
        Ok(Self(id.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Test result (the cached `last_result`)
// ---------------------------------------------------------------------------

/// Structured outcome of the most recently finished test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResult {
    pub test: String,
    pub test_status: String,
    /// Test-specific numeric details, e.g. `doors_failed`.
    #[serde(flatten)]
    pub metrics: BTreeMap<String, i64>,
}

impl TestResult {
    pub fn new(test: impl Into<String>, test_status: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            test_status: test_status.into(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn metric(&self, name: &str) -> Option<i64> {
        self.metrics.get(name).copied()
    }

    /// Number of doors that failed, when the pod reported it.
    pub fn doors_failed(&self) -> Option<i64> {
        self.metric(crate::catalog::DOORS_FAILED.name)
    }
}

// ---------------------------------------------------------------------------
// Session phase
// ---------------------------------------------------------------------------

/// Aggregate gate derived from the per-test statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Pending,
    Certified,
}

impl SessionPhase {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending Certification",
            Self::Certified => "Certified",
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Per-pod status table plus the running marker and the last result.
///
/// Read-only outside the crate; every transition goes through
/// [`CertService`](crate::app::service::CertService).
///
/// ```compile_fail
/// use podcert::session::{CertificationSession, PodId};
///
/// let mut session = CertificationSession::new(PodId::new("QP-1").unwrap());
/// session.reset();
/// ```
#[derive(Debug, Clone)]
pub struct CertificationSession {
    pod: PodId,
    /// Indexed by `TestId as usize`; every test is always present.
    statuses: [TestStatus; TestId::COUNT],
    running: Option<TestId>,
    last_result: Option<TestResult>,
}

impl CertificationSession {
    pub fn new(pod: PodId) -> Self {
        Self {
            pod,
            statuses: [TestStatus::Idle; TestId::COUNT],
            running: None,
            last_result: None,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn pod(&self) -> &PodId {
        &self.pod
    }

    pub fn status(&self, id: TestId) -> TestStatus {
        self.statuses[id.index()]
    }

    /// Every test with its status, in display order.
    pub fn statuses(&self) -> impl Iterator<Item = (TestId, TestStatus)> + '_ {
        TestId::ALL.into_iter().map(|id| (id, self.status(id)))
    }

    /// The test currently in flight, if any.
    pub fn running(&self) -> Option<TestId> {
        self.running
    }

    pub fn last_result(&self) -> Option<&TestResult> {
        self.last_result.as_ref()
    }

    pub fn completed_count(&self) -> usize {
        self.statuses
            .iter()
            .filter(|s| **s == TestStatus::Success)
            .count()
    }

    pub fn total(&self) -> usize {
        TestId::COUNT
    }

    pub fn is_certified(&self) -> bool {
        self.completed_count() == self.total()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_certified() {
            SessionPhase::Certified
        } else {
            SessionPhase::Pending
        }
    }

    /// Whole-number progress, 0–100.
    pub fn progress_percent(&self) -> u8 {
        (self.completed_count() * 100 / self.total()) as u8
    }

    // ── Transitions ───────────────────────────────────────────

    /// Claim the running marker for `id` and move it to `Running`.
    ///
    /// Rejected, with the session unchanged, if `id` already passed or any
    /// test is in flight.
    pub(crate) fn begin(&mut self, id: TestId) -> Result<(), PreconditionError> {
        let current = self.status(id);
        if current.is_terminal() {
            return Err(PreconditionError::AlreadyPassed(id));
        }
        if let Some(running) = self.running {
            return Err(PreconditionError::TestInProgress { running });
        }
        let Some(next) = current.next(TestEvent::Start) else {
            return Err(PreconditionError::TestInProgress { running: id });
        };
        self.statuses[id.index()] = next;
        self.running = Some(id);
        info!("TEST | {} {} -> {}", id, current, next);
        Ok(())
    }

    /// Resolve the in-flight test, cache its result, release the marker.
    ///
    /// Ignored unless `id` is the test currently running.
    pub(crate) fn finish(&mut self, id: TestId, passed: bool, result: TestResult) {
        if self.running != Some(id) {
            debug!("TEST | finish({id}) ignored, running={:?}", self.running);
            return;
        }
        let event = if passed {
            TestEvent::Completed
        } else {
            TestEvent::Failed
        };
        let current = self.status(id);
        if let Some(next) = current.next(event) {
            self.statuses[id.index()] = next;
            info!("TEST | {} {} -> {}", id, current, next);
        }
        self.last_result = Some(result);
        self.running = None;
    }

    /// Certification gate: succeeds only when every test passed, and then
    /// clears the session for the next attempt.
    pub(crate) fn certify(&mut self) -> Result<(), PreconditionError> {
        if !self.is_certified() {
            return Err(PreconditionError::NotCertifiable {
                completed: self.completed_count(),
                total: self.total(),
            });
        }
        info!("SESSION | pod {} certified", self.pod);
        self.reset();
        Ok(())
    }

    /// Back to all-`Idle` with no cached result.
    pub(crate) fn reset(&mut self) {
        self.statuses = [TestStatus::Idle; TestId::COUNT];
        self.running = None;
        self.last_result = None;
    }
}
