//! Port traits: the hexagonal boundary between orchestration logic and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ CertService (domain)
//! ```
//!
//! Driven adapters (messaging gateway, timers, event sinks, config storage)
//! implement these traits.  [`CertService`](super::service::CertService)
//! takes them as generic parameters at each call, so the orchestrator never
//! touches HTTP, clocks or logging backends directly.
//!
//! The async ports use native `async fn` in traits.  They are consumed
//! through generics only, never as trait objects.

use core::time::Duration;

use serde_json::Value;

use crate::config::CertConfig;
use crate::error::{ConfigError, TransportError};
use crate::record::Record;

// ───────────────────────────────────────────────────────────────
// Messaging gateway (driven adapter: domain ↔ pod topic)
// ───────────────────────────────────────────────────────────────

/// Gateway acknowledgement of a published command.
///
/// An ack only means the gateway accepted the message.  Delivery to the pod
/// is at-most-once and unconfirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack {
    /// Gateway-assigned message id, when the deployment returns one.
    pub message_id: Option<String>,
}

/// Publish/subscribe channel keyed by pod id.
///
/// The same topic carries commands to the pod and results from it.
#[allow(async_fn_in_trait)]
pub trait GatewayPort {
    /// Send `payload` to `topic`.
    async fn publish(&self, topic: &str, payload: &Value) -> Result<Ack, TransportError>;

    /// Read at most `max_records` of the most recent records on `topic`.
    /// An empty vector means nothing has been published yet.
    async fn subscribe(&self, topic: &str, max_records: u32)
    -> Result<Vec<Record>, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Delay port (driven adapter: domain → timer)
// ───────────────────────────────────────────────────────────────

/// Suspension point for settle intervals, poll backoff and simulated tests.
///
/// Waits are fixed and not cancellable.
#[allow(async_fn_in_trait)]
pub trait DelayPort {
    async fn sleep(&self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → operator / logging)
// ───────────────────────────────────────────────────────────────

/// The orchestrator emits structured [`CertEvent`](super::events::CertEvent)s
/// through this port.  Adapters decide where they go (log, UI toast,
/// audit trail).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::CertEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists orchestrator configuration.
///
/// Implementations MUST call [`CertConfig::validate`] before persisting and
/// reject invalid values with [`ConfigError::ValidationFailed`].
pub trait ConfigPort {
    /// Load configuration.  Returns [`CertConfig::default()`] if nothing is
    /// stored yet.
    fn load(&self) -> Result<CertConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &CertConfig) -> Result<(), ConfigError>;
}
