//! Orchestrator configuration.
//!
//! All tunable timing and endpoint parameters.  Values load from a JSON
//! file through [`ConfigPort`](crate::app::ports::ConfigPort) and can be
//! overridden from the command line.  Every field has a default, so an
//! empty `{}` file is a valid config.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Used when neither the CLI nor the environment names a gateway.
pub const DEFAULT_BASE_URL: &str = "https://productionv36.qikpod.com";

/// Service prefix every pod endpoint lives under.
pub const PODCORE_PREFIX: &str = "/podcore";

/// Placeholder substituted with the pod id in endpoint path templates.
pub const TOPIC_PLACEHOLDER: &str = "{topic}";

const MAX_INTERVAL_MS: u64 = 10 * 60 * 1000;

static ORIGIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?://[^/]+\.com)").expect("static origin pattern"));

/// Core orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertConfig {
    /// Wait between publishing a command and first reading its result.
    pub settle_interval_ms: u64,
    /// How results are read back after the settle interval.
    pub poll: PollPolicy,
    /// Replaces every simulated test's built-in delay when set.
    pub simulated_delay_override_ms: Option<u64>,
    pub gateway: GatewayConfig,
}

impl Default for CertConfig {
    fn default() -> Self {
        Self {
            settle_interval_ms: 2000,
            poll: PollPolicy::SingleShot,
            simulated_delay_override_ms: None,
            gateway: GatewayConfig::default(),
        }
    }
}

/// Result-acquisition policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PollPolicy {
    /// One read after the settle interval; nothing there means failure.
    SingleShot,
    /// Keep reading with doubling waits until a conclusive record or the
    /// deadline.
    Backoff {
        initial_ms: u64,
        max_ms: u64,
        deadline_ms: u64,
    },
}

impl PollPolicy {
    /// A reasonable bounded-poll default: 250 ms doubling to 2 s, 15 s total.
    pub const fn default_backoff() -> Self {
        Self::Backoff {
            initial_ms: 250,
            max_ms: 2000,
            deadline_ms: 15_000,
        }
    }
}

/// Messaging gateway endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Raw base URL; normalised with [`resolve_base_url`].
    pub base_url: Option<String>,
    /// Publish path under `/podcore`; `{topic}` is the pod id.
    pub publish_path: String,
    /// Subscribe path under `/podcore`; `{topic}` is the pod id.
    pub subscribe_path: String,
    pub request_timeout_ms: u64,
    /// `maxRecords` sent with every Subscribe.
    pub max_records: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            publish_path: "/pubsub/{topic}/publish".to_owned(),
            subscribe_path: "/pubsub/{topic}/subscribe".to_owned(),
            request_timeout_ms: 10_000,
            max_records: 1,
        }
    }
}

impl GatewayConfig {
    /// `<origin>/podcore`, e.g. `https://productionv36.qikpod.com/podcore`.
    pub fn podcore_url(&self) -> String {
        format!(
            "{}{}",
            resolve_base_url(self.base_url.as_deref()),
            PODCORE_PREFIX
        )
    }

    pub fn publish_url(&self, topic: &str) -> String {
        format!(
            "{}{}",
            self.podcore_url(),
            self.publish_path.replace(TOPIC_PLACEHOLDER, topic)
        )
    }

    pub fn subscribe_url(&self, topic: &str) -> String {
        format!(
            "{}{}",
            self.podcore_url(),
            self.subscribe_path.replace(TOPIC_PLACEHOLDER, topic)
        )
    }
}

impl CertConfig {
    /// Reject values that would stall or break a certification run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settle_interval_ms > MAX_INTERVAL_MS {
            return Err(ConfigError::ValidationFailed(
                "settle_interval_ms exceeds 10 minutes",
            ));
        }
        if self
            .simulated_delay_override_ms
            .is_some_and(|ms| ms > MAX_INTERVAL_MS)
        {
            return Err(ConfigError::ValidationFailed(
                "simulated_delay_override_ms exceeds 10 minutes",
            ));
        }
        if let PollPolicy::Backoff {
            initial_ms,
            max_ms,
            deadline_ms,
        } = self.poll
        {
            if initial_ms == 0 {
                return Err(ConfigError::ValidationFailed(
                    "poll.initial_ms must be non-zero",
                ));
            }
            if initial_ms > max_ms {
                return Err(ConfigError::ValidationFailed(
                    "poll.initial_ms must not exceed poll.max_ms",
                ));
            }
            if deadline_ms < initial_ms || deadline_ms > MAX_INTERVAL_MS {
                return Err(ConfigError::ValidationFailed(
                    "poll.deadline_ms must be between initial_ms and 10 minutes",
                ));
            }
        }
        let gw = &self.gateway;
        if !gw.publish_path.contains(TOPIC_PLACEHOLDER)
            || !gw.subscribe_path.contains(TOPIC_PLACEHOLDER)
        {
            return Err(ConfigError::ValidationFailed(
                "gateway paths must contain {topic}",
            ));
        }
        if gw.max_records == 0 {
            return Err(ConfigError::ValidationFailed(
                "gateway.max_records must be at least 1",
            ));
        }
        if gw.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "gateway.request_timeout_ms must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Normalise a configured base URL to the gateway origin.
///
/// `https://host.example.com/anything` becomes `https://host.example.com`;
/// values that do not end their host in `.com` only lose a trailing
/// `/podcore` and slash.  `None` or blank yields [`DEFAULT_BASE_URL`].
pub fn resolve_base_url(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_BASE_URL.to_owned();
    };
    if let Some(m) = ORIGIN_RE.captures(raw).and_then(|c| c.get(1)) {
        return m.as_str().to_owned();
    }
    let trimmed = raw.trim_end_matches('/');
    trimmed
        .strip_suffix(PODCORE_PREFIX)
        .unwrap_or(trimmed)
        .to_owned()
}
