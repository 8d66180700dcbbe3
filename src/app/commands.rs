//! Inbound commands to the certification service.
//!
//! These represent operator actions from whatever presents the session
//! (CLI, desktop dialog, kiosk) that the
//! [`CertService`](super::service::CertService) interprets and acts upon.

use crate::catalog::TestId;

/// Operator actions the certification core understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertCommand {
    /// Run (or retry) one test.
    RunTest(TestId),

    /// Complete certification once every test passed.
    Certify,

    /// Close the workflow without certifying; clears the session.
    Abandon,
}
