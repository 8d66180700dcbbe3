//! A gateway that is not there.
//!
//! Every call fails with [`TransportError::NotConfigured`].  Useful when no
//! credential or network is available: simulated tests still run, remote
//! tests fail cleanly at publish time.

use serde_json::Value;

use crate::app::ports::{Ack, GatewayPort};
use crate::error::TransportError;
use crate::record::Record;

#[derive(Debug, Default, Clone, Copy)]
pub struct NullGateway;

impl GatewayPort for NullGateway {
    async fn publish(&self, _topic: &str, _payload: &Value) -> Result<Ack, TransportError> {
        Err(TransportError::NotConfigured)
    }

    async fn subscribe(
        &self,
        _topic: &str,
        _max_records: u32,
    ) -> Result<Vec<Record>, TransportError> {
        Err(TransportError::NotConfigured)
    }
}
