//! Error taxonomy for the certification orchestrator.
//!
//! Every failure in this crate is local to one test or one operator action.
//! Nothing here is fatal: a transport fault fails the test being run, a
//! precondition violation is a benign rejection, and both leave the rest of
//! the session untouched.  All types are `Clone + PartialEq` so they can be
//! cached in outcomes and asserted on directly in tests.

use core::fmt;

use crate::catalog::TestId;

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// The Publish or Subscribe call itself failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No gateway is wired in (local-only runs).
    NotConfigured,
    /// The request could not be sent or no response arrived.
    Request(String),
    /// The gateway answered with a non-success HTTP status.
    Status(u16),
    /// The response body could not be decoded.
    Decode(String),
    /// The bearer credential was rejected.
    Unauthorized,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "no messaging gateway configured"),
            Self::Request(msg) => write!(f, "request failed: {msg}"),
            Self::Status(code) => write!(f, "gateway returned HTTP {code}"),
            Self::Decode(msg) => write!(f, "undecodable response: {msg}"),
            Self::Unauthorized => write!(f, "credential rejected by gateway"),
        }
    }
}

impl std::error::Error for TransportError {}

// ---------------------------------------------------------------------------
// Precondition errors
// ---------------------------------------------------------------------------

/// An operator action arrived at a moment the session cannot accept it.
///
/// These are rejections, not faults: the session is left exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionError {
    /// The test already passed; `Success` is terminal.
    AlreadyPassed(TestId),
    /// Another test is in flight (global exclusion).
    TestInProgress { running: TestId },
    /// `certify` was called before every test passed.
    NotCertifiable { completed: usize, total: usize },
}

impl fmt::Display for PreconditionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyPassed(id) => write!(f, "{} test already passed", id.key()),
            Self::TestInProgress { running } => {
                write!(f, "{} test is still running", running.key())
            }
            Self::NotCertifiable { completed, total } => {
                write!(f, "only {completed} of {total} tests passed")
            }
        }
    }
}

impl std::error::Error for PreconditionError {}

// ---------------------------------------------------------------------------
// Test failures
// ---------------------------------------------------------------------------

/// Why a test ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestFailure {
    /// The command could not be published; no result was requested.
    Transport(TransportError),
    /// The result read came back empty, errored, or held a record without
    /// any status field.
    NoResponse { cause: Option<TransportError> },
    /// The pod returned a record whose status is not `completed`.
    Incomplete { status: String },
    /// The poll deadline passed without a conclusive record.
    DeadlineExceeded { attempts: u32 },
}

impl TestFailure {
    /// Short machine-readable tag used in logs and snapshots.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::NoResponse { .. } => "no_response",
            Self::Incomplete { .. } => "incomplete",
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
        }
    }
}

impl fmt::Display for TestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "command not delivered: {e}"),
            Self::NoResponse { cause: Some(e) } => write!(f, "no response from pod: {e}"),
            Self::NoResponse { cause: None } => write!(f, "no response from pod"),
            Self::Incomplete { status } => write!(f, "pod reported status '{status}'"),
            Self::DeadlineExceeded { attempts } => {
                write!(f, "no conclusive result after {attempts} polls")
            }
        }
    }
}

impl std::error::Error for TestFailure {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from loading, validating or persisting [`CertConfig`](crate::config::CertConfig).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config could not be parsed.
    Corrupted(String),
    /// A field failed range validation; the message names the field.
    ValidationFailed(&'static str),
    /// Generic I/O error from the backing store.
    Io(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted(msg) => write!(f, "config corrupted: {msg}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::Io(msg) => write!(f, "config I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Pod identifier errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodIdError {
    Empty,
    TooLong { len: usize, max: usize },
    InvalidChar(char),
}

impl fmt::Display for PodIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "pod id is empty"),
            Self::TooLong { len, max } => {
                write!(f, "pod id is {len} characters (max {max})")
            }
            Self::InvalidChar(c) => write!(f, "pod id contains invalid character {c:?}"),
        }
    }
}

impl std::error::Error for PodIdError {}
