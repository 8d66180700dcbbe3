//! Certification service: the hexagonal core.
//!
//! [`CertService`] owns one pod's [`CertificationSession`] and runs tests
//! against it.  All I/O flows through port traits injected at call sites,
//! making the whole workflow testable with scripted adapters.
//!
//! ```text
//!  GatewayPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                  │      CertService       │
//!    DelayPort ◀── │ Session · Catalog · Poll│
//!                  └────────────────────────┘
//! ```
//!
//! Scheduling is single-threaded and cooperative.  The session sits in a
//! `RefCell` that is only borrowed between suspension points, so a second
//! `run_test` started while one is awaiting the gateway sees the running
//! marker and is rejected, and a presenter can read the session at any time.

use core::cell::{Ref, RefCell};
use core::time::Duration;

use log::{debug, info, warn};
use serde_json::json;

use crate::catalog::{RemoteTest, SimulatedTest, TestDefinition, TestId};
use crate::config::CertConfig;
use crate::error::{PreconditionError, TestFailure};
use crate::record::Extracted;
use crate::report::SessionSnapshot;
use crate::session::{CertificationSession, PodId, TestResult};

use super::commands::CertCommand;
use super::events::CertEvent;
use super::poll::{Acquired, acquire};
use super::ports::{DelayPort, EventSink, GatewayPort};

/// Status recorded when the pod gave no usable answer.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// Status recorded for locally simulated passes.
pub const SIMULATED_STATUS: &str = "Completed";

// ───────────────────────────────────────────────────────────────
// Outcomes
// ───────────────────────────────────────────────────────────────

/// What a single `run_test` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Passed(TestResult),
    Failed {
        failure: TestFailure,
        result: TestResult,
    },
    /// Refused before anything happened; session unchanged.
    Rejected(PreconditionError),
}

impl RunOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed(_))
    }

    /// The result cached into `last_result`, if the test actually ran.
    pub fn result(&self) -> Option<&TestResult> {
        match self {
            Self::Passed(r) | Self::Failed { result: r, .. } => Some(r),
            Self::Rejected(_) => None,
        }
    }
}

/// What a [`CertCommand`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Ran(RunOutcome),
    Certified,
    Reset,
    Rejected(PreconditionError),
}

// ───────────────────────────────────────────────────────────────
// CertService
// ───────────────────────────────────────────────────────────────

/// Test orchestrator for one pod.
pub struct CertService {
    config: CertConfig,
    session: RefCell<CertificationSession>,
}

impl CertService {
    pub fn new(config: CertConfig, pod: PodId) -> Self {
        info!("CertService ready for pod {pod}");
        Self {
            config,
            session: RefCell::new(CertificationSession::new(pod)),
        }
    }

    // ── Operations ────────────────────────────────────────────

    /// Run (or retry) one test and record its outcome in the session.
    ///
    /// No-op returning [`RunOutcome::Rejected`] when the test already
    /// passed or another test is in flight; no gateway call is made then.
    pub async fn run_test(
        &self,
        id: TestId,
        gateway: &impl GatewayPort,
        delay: &impl DelayPort,
        sink: &mut impl EventSink,
    ) -> RunOutcome {
        let begun = self.session.borrow_mut().begin(id);
        if let Err(reason) = begun {
            debug!("TEST | {id} rejected: {reason}");
            sink.emit(&CertEvent::RunRejected { test: id, reason });
            return RunOutcome::Rejected(reason);
        }
        sink.emit(&CertEvent::TestStarted(id));

        let verdict = match id.definition() {
            TestDefinition::Remote(def) => self.run_remote(def, gateway, delay).await,
            TestDefinition::Simulated(def) => self.run_simulated(id, def, delay).await,
        };

        match verdict {
            Ok(result) => {
                self.session.borrow_mut().finish(id, true, result.clone());
                sink.emit(&CertEvent::TestPassed {
                    test: id,
                    result: result.clone(),
                });
                RunOutcome::Passed(result)
            }
            Err((failure, result)) => {
                warn!("TEST | {id} failed: {failure}");
                self.session.borrow_mut().finish(id, false, result.clone());
                sink.emit(&CertEvent::TestFailed {
                    test: id,
                    failure: failure.clone(),
                    result: result.clone(),
                });
                RunOutcome::Failed { failure, result }
            }
        }
    }

    /// Certification gate.  On success the session is cleared for the next
    /// attempt; otherwise nothing changes.
    pub fn certify(&self, sink: &mut impl EventSink) -> Result<(), PreconditionError> {
        // Release the borrow before emitting; sinks may read the session.
        let certified = {
            let mut session = self.session.borrow_mut();
            session.certify().map(|()| session.pod().clone())
        };
        match certified {
            Ok(pod) => {
                sink.emit(&CertEvent::Certified(pod));
                Ok(())
            }
            Err(reason) => {
                sink.emit(&CertEvent::CertifyRejected(reason));
                Err(reason)
            }
        }
    }

    /// Close the workflow without certifying.  Refused while a test runs.
    pub fn abandon(&self, sink: &mut impl EventSink) -> Result<(), PreconditionError> {
        let pod = {
            let mut session = self.session.borrow_mut();
            if let Some(running) = session.running() {
                debug!("SESSION | abandon refused, {running} in flight");
                return Err(PreconditionError::TestInProgress { running });
            }
            session.reset();
            session.pod().clone()
        };
        info!("SESSION | pod {pod} abandoned");
        sink.emit(&CertEvent::SessionReset(pod));
        Ok(())
    }

    /// Dispatch an operator command.
    pub async fn handle_command(
        &self,
        cmd: CertCommand,
        gateway: &impl GatewayPort,
        delay: &impl DelayPort,
        sink: &mut impl EventSink,
    ) -> CommandOutcome {
        match cmd {
            CertCommand::RunTest(id) => {
                CommandOutcome::Ran(self.run_test(id, gateway, delay, sink).await)
            }
            CertCommand::Certify => match self.certify(sink) {
                Ok(()) => CommandOutcome::Certified,
                Err(e) => CommandOutcome::Rejected(e),
            },
            CertCommand::Abandon => match self.abandon(sink) {
                Ok(()) => CommandOutcome::Reset,
                Err(e) => CommandOutcome::Rejected(e),
            },
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Read-only view of the session.  Do not hold across an `.await`.
    pub fn session(&self) -> Ref<'_, CertificationSession> {
        self.session.borrow()
    }

    /// Serializable view for presenters.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(&self.session.borrow())
    }

    pub fn config(&self) -> &CertConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Publish, settle, read back, classify.
    async fn run_remote(
        &self,
        def: &RemoteTest,
        gateway: &impl GatewayPort,
        delay: &impl DelayPort,
    ) -> Result<TestResult, (TestFailure, TestResult)> {
        let topic = self.session.borrow().pod().as_str().to_owned();
        let command = json!({ "action": def.command_tag });

        match gateway.publish(&topic, &command).await {
            Ok(ack) => debug!("PUB | {topic} <- {} ({:?})", def.command_tag, ack.message_id),
            Err(e) => {
                return Err((TestFailure::Transport(e), unknown_result(def, None)));
            }
        }

        delay
            .sleep(Duration::from_millis(self.config.settle_interval_ms))
            .await;

        let acquired = acquire(
            self.config.poll,
            def,
            &topic,
            self.config.gateway.max_records,
            gateway,
            delay,
        )
        .await;

        match acquired {
            Acquired::Conclusive(extracted) => {
                let result = result_from(def, &extracted);
                if !extracted.has_status() {
                    // e.g. our own command echoed back on the shared topic
                    Err((TestFailure::NoResponse { cause: None }, result))
                } else if extracted.is_completed() {
                    Ok(result)
                } else {
                    let status = result.test_status.clone();
                    Err((TestFailure::Incomplete { status }, result))
                }
            }
            Acquired::NoResponse(cause) => Err((
                TestFailure::NoResponse { cause },
                unknown_result(def, None),
            )),
            Acquired::DeadlineExceeded { attempts, last } => Err((
                TestFailure::DeadlineExceeded { attempts },
                unknown_result(def, last.as_ref()),
            )),
        }
    }

    async fn run_simulated(
        &self,
        id: TestId,
        def: &SimulatedTest,
        delay: &impl DelayPort,
    ) -> Result<TestResult, (TestFailure, TestResult)> {
        let wait = self
            .config
            .simulated_delay_override_ms
            .map_or(def.delay, Duration::from_millis);
        delay.sleep(wait).await;
        Ok(TestResult::new(id.key(), SIMULATED_STATUS))
    }
}

/// Cache whatever the record held; missing fields fall back to the command
/// tag and [`UNKNOWN_STATUS`].
fn result_from(def: &RemoteTest, extracted: &Extracted) -> TestResult {
    let mut result = TestResult::new(
        extracted
            .test_name
            .clone()
            .unwrap_or_else(|| def.command_tag.to_owned()),
        extracted
            .test_status
            .clone()
            .unwrap_or_else(|| UNKNOWN_STATUS.to_owned()),
    );
    result.metrics = extracted
        .metrics
        .iter()
        .map(|(k, v)| ((*k).to_owned(), *v))
        .collect();
    result
}

/// Result for runs that never produced a conclusive record.
fn unknown_result(def: &RemoteTest, last: Option<&Extracted>) -> TestResult {
    let mut result = last.map_or_else(
        || TestResult::new(def.command_tag, UNKNOWN_STATUS),
        |e| result_from(def, e),
    );
    result.test_status = UNKNOWN_STATUS.to_owned();
    result
}
