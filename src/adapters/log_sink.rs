//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every certification event as one log
//! line.  Failures and rejected certifications go out at `warn` so operator
//! notices stand out in the console; everything else is `info`.

use log::{debug, info, warn};

use crate::app::events::CertEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`CertEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &CertEvent) {
        match event {
            CertEvent::TestStarted(id) => {
                info!("START | Testing {}...", id.label());
            }
            CertEvent::TestPassed { test, result } => {
                info!(
                    "PASS  | {} | test={} status={}",
                    test.label(),
                    result.test,
                    result.test_status
                );
            }
            CertEvent::TestFailed { failure, .. } => {
                let notice = event.notice().unwrap_or_default();
                warn!("FAIL  | [{}] {}", failure.kind(), notice);
            }
            CertEvent::RunRejected { test, reason } => {
                debug!("SKIP  | {}: {}", test.label(), reason);
            }
            CertEvent::Certified(pod) => {
                info!("CERT  | pod {} certified", pod);
            }
            CertEvent::CertifyRejected(_) => {
                warn!("CERT  | {}", event.notice().unwrap_or_default());
            }
            CertEvent::SessionReset(pod) => {
                info!("RESET | pod {} session cleared", pod);
            }
        }
    }
}
