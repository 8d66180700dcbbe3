//! Timer adapter.
//!
//! Implements [`DelayPort`] on the tokio timer.  Requires a tokio runtime
//! with the time driver enabled (the binary uses a current-thread runtime,
//! matching the orchestrator's single-threaded cooperative model).

use core::time::Duration;

use crate::app::ports::DelayPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDelay;

impl TokioDelay {
    pub fn new() -> Self {
        Self
    }
}

impl DelayPort for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
