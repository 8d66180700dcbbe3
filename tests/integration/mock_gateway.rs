//! Scripted adapters for integration tests.
//!
//! Records every gateway call, every requested wait and every emitted event
//! so tests can assert on the full history without a network or a clock.

use core::cell::RefCell;
use core::time::Duration;
use std::collections::VecDeque;

use podcert::app::events::CertEvent;
use podcert::app::ports::{Ack, DelayPort, EventSink, GatewayPort};
use podcert::error::TransportError;
use podcert::record::Record;
use serde_json::Value;

// ── Gateway call record ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Publish { topic: String, payload: Value },
    Subscribe { topic: String, max_records: u32 },
}

// ── MockGateway ───────────────────────────────────────────────

/// Replays scripted subscribe replies in order.  Once the script runs dry
/// every further read returns no records.
pub struct MockGateway {
    pub calls: RefCell<Vec<GatewayCall>>,
    publish_error: Option<TransportError>,
    replies: RefCell<VecDeque<Result<Vec<Record>, TransportError>>>,
}

#[allow(dead_code)]
impl MockGateway {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            publish_error: None,
            replies: RefCell::new(VecDeque::new()),
        }
    }

    /// Every publish fails with `err`.
    pub fn failing_publish(err: TransportError) -> Self {
        Self {
            publish_error: Some(err),
            ..Self::new()
        }
    }

    /// Queue one subscribe reply holding the given JSON objects.
    pub fn reply(self, records: Value) -> Self {
        let records = match records {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            Value::Object(map) => vec![map],
            _ => Vec::new(),
        };
        self.replies.borrow_mut().push_back(Ok(records));
        self
    }

    pub fn reply_err(self, err: TransportError) -> Self {
        self.replies.borrow_mut().push_back(Err(err));
        self
    }

    pub fn publishes(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, GatewayCall::Publish { .. }))
            .count()
    }

    pub fn subscribes(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, GatewayCall::Subscribe { .. }))
            .count()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayPort for MockGateway {
    async fn publish(&self, topic: &str, payload: &Value) -> Result<Ack, TransportError> {
        self.calls.borrow_mut().push(GatewayCall::Publish {
            topic: topic.to_owned(),
            payload: payload.clone(),
        });
        match &self.publish_error {
            Some(e) => Err(e.clone()),
            None => Ok(Ack {
                message_id: Some(format!("msg-{}", self.publishes())),
            }),
        }
    }

    async fn subscribe(
        &self,
        topic: &str,
        max_records: u32,
    ) -> Result<Vec<Record>, TransportError> {
        self.calls.borrow_mut().push(GatewayCall::Subscribe {
            topic: topic.to_owned(),
            max_records,
        });
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

// ── RecordingDelay ────────────────────────────────────────────

/// Zero-time delay that remembers what it was asked for.
///
/// With `yielding` set, each sleep suspends once so that concurrently
/// polled futures get a turn.
#[derive(Default)]
pub struct RecordingDelay {
    pub waits: RefCell<Vec<Duration>>,
    yielding: bool,
}

#[allow(dead_code)]
impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn yielding() -> Self {
        Self {
            waits: RefCell::new(Vec::new()),
            yielding: true,
        }
    }

    pub fn total(&self) -> Duration {
        self.waits.borrow().iter().sum()
    }

    pub fn millis(&self) -> Vec<u64> {
        self.waits
            .borrow()
            .iter()
            .map(|d| d.as_millis() as u64)
            .collect()
    }
}

impl DelayPort for RecordingDelay {
    async fn sleep(&self, duration: Duration) {
        self.waits.borrow_mut().push(duration);
        if self.yielding {
            futures_lite::future::yield_now().await;
        }
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<CertEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operator notices raised so far.
    pub fn notices(&self) -> Vec<String> {
        self.events.iter().filter_map(CertEvent::notice).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &CertEvent) {
        self.events.push(event.clone());
    }
}
