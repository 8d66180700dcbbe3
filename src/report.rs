//! Session snapshot for presenters.
//!
//! A point-in-time, serializable copy of a [`CertificationSession`] carrying
//! everything an operator surface renders: header status, progress bar,
//! one row per test, and the last result.  Presenters read snapshots; they
//! never hold the live session.

use core::fmt;

use serde::Serialize;

use crate::catalog::TestId;
use crate::session::{CertificationSession, SessionPhase, TestResult, TestStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRow {
    pub key: TestId,
    pub label: &'static str,
    pub status: TestStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub pod_id: String,
    pub phase: SessionPhase,
    pub status_label: &'static str,
    pub completed: usize,
    pub total: usize,
    pub progress_percent: u8,
    pub running: Option<TestId>,
    pub tests: Vec<TestRow>,
    pub last_result: Option<TestResult>,
}

impl SessionSnapshot {
    pub fn capture(session: &CertificationSession) -> Self {
        let phase = session.phase();
        Self {
            pod_id: session.pod().to_string(),
            phase,
            status_label: phase.label(),
            completed: session.completed_count(),
            total: session.total(),
            progress_percent: session.progress_percent(),
            running: session.running(),
            tests: session
                .statuses()
                .map(|(key, status)| TestRow {
                    key,
                    label: key.label(),
                    status,
                })
                .collect(),
            last_result: session.last_result().cloned(),
        }
    }
}

/// Plain-text rendering for terminals.
impl fmt::Display for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Certify Pod #{}", self.pod_id)?;
        writeln!(f, "Status: {}", self.status_label)?;
        writeln!(
            f,
            "Progress: {} / {} Completed ({}%)",
            self.completed, self.total, self.progress_percent
        )?;
        for row in &self.tests {
            let mark = match row.status {
                TestStatus::Success => "[x]",
                TestStatus::Failed => "[!]",
                TestStatus::Running => "[~]",
                TestStatus::Idle => "[ ]",
            };
            writeln!(f, "  {mark} {:<14} {}", row.label, row.status)?;
        }
        if let Some(r) = &self.last_result {
            write!(f, "Last result: {} = {}", r.test, r.test_status)?;
            for (k, v) in &r.metrics {
                write!(f, ", {k} = {v}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
