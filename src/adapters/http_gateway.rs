//! HTTP messaging-gateway adapter.
//!
//! Implements [`GatewayPort`] against the podcore pub/sub REST endpoints:
//!
//! ```text
//!  Publish    POST <base>/podcore<publish_path>     body {"action": "<tag>"}
//!  Subscribe  GET  <base>/podcore<subscribe_path>?maxRecords=N
//! ```
//!
//! Both requests carry `Authorization: Bearer <token>` when a credential
//! was supplied.  The credential is owned by the caller; this adapter never
//! refreshes it.

use core::time::Duration;

use log::debug;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::app::ports::{Ack, GatewayPort};
use crate::config::GatewayConfig;
use crate::error::TransportError;
use crate::record::{Record, records_from_body};

/// Keys a publish response may carry the gateway's message id under.
const MESSAGE_ID_KEYS: &[&str] = &["message_id", "messageId", "MessageId", "id"];

pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
    token: Option<String>,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig, token: Option<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        debug!("HTTP gateway at {}", config.podcore_url());
        Ok(Self {
            client,
            config,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req.header(ACCEPT, "application/json");
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<String, TransportError> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        check_status(resp.status())?;
        resp.text()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))
    }
}

impl GatewayPort for HttpGateway {
    async fn publish(&self, topic: &str, payload: &Value) -> Result<Ack, TransportError> {
        let url = self.config.publish_url(topic);
        debug!("HTTP | POST {url}");
        let body = self.send(self.client.post(&url).json(payload)).await?;
        Ok(ack_from_body(&body))
    }

    async fn subscribe(
        &self,
        topic: &str,
        max_records: u32,
    ) -> Result<Vec<Record>, TransportError> {
        let url = self.config.subscribe_url(topic);
        debug!("HTTP | GET {url} maxRecords={max_records}");
        let req = self
            .client
            .get(&url)
            .query(&[("maxRecords", max_records)]);
        let body = self.send(req).await?;
        parse_records(&body)
    }
}

fn check_status(status: StatusCode) -> Result<(), TransportError> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(TransportError::Unauthorized),
        s if s.is_success() => Ok(()),
        s => Err(TransportError::Status(s.as_u16())),
    }
}

/// An empty or non-JSON publish body is still a successful ack.
fn ack_from_body(body: &str) -> Ack {
    let message_id = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        let obj = v.get("data").filter(|d| d.is_object()).unwrap_or(&v);
        MESSAGE_ID_KEYS.iter().find_map(|k| match obj.get(*k)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    });
    Ack { message_id }
}

/// An empty body means no records; anything else must be JSON.
fn parse_records(body: &str) -> Result<Vec<Record>, TransportError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: Value =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;
    Ok(records_from_body(value))
}
