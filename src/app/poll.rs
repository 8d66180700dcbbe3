//! Result acquisition after a command has been published.
//!
//! Two policies, selected by [`PollPolicy`]:
//!
//! ```text
//!  SingleShot:  publish ─ settle ─ read ─▶ record?  ──▶ Conclusive / NoResponse
//!
//!  Backoff:     publish ─ settle ─ read ─▶ conclusive? ──yes──▶ Conclusive
//!                                   ▲          │no
//!                                   └─ wait ◀──┘  (250 → 500 → 1000 … ≤ max)
//!                                     until Σwait ≥ deadline ──▶ DeadlineExceeded
//! ```
//!
//! Under backoff a record is *conclusive* when it carries a status and its
//! test name, if present, matches the command tag.  Records without a
//! status (our own command echoed back on the shared topic) and records for
//! another test are skipped.  The deadline counts requested wait time, not
//! wall-clock time, so request latency extends a run slightly.

use core::time::Duration;

use log::{debug, warn};

use super::ports::{DelayPort, GatewayPort};
use crate::catalog::RemoteTest;
use crate::config::PollPolicy;
use crate::error::TransportError;
use crate::record::{Extracted, normalize};

/// What the read-back phase produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquired {
    /// A record to classify.
    Conclusive(Extracted),
    /// Single shot read nothing, or the read itself failed.
    NoResponse(Option<TransportError>),
    /// Backoff ran out of time.  `last` is the newest inconclusive record.
    DeadlineExceeded {
        attempts: u32,
        last: Option<Extracted>,
    },
}

/// Read the pod's answer to `test` on `topic` according to `policy`.
pub async fn acquire(
    policy: PollPolicy,
    test: &RemoteTest,
    topic: &str,
    max_records: u32,
    gateway: &impl GatewayPort,
    delay: &impl DelayPort,
) -> Acquired {
    match policy {
        PollPolicy::SingleShot => single_shot(test, topic, max_records, gateway).await,
        PollPolicy::Backoff {
            initial_ms,
            max_ms,
            deadline_ms,
        } => {
            let backoff = Backoff {
                initial: Duration::from_millis(initial_ms),
                max: Duration::from_millis(max_ms),
                deadline: Duration::from_millis(deadline_ms),
            };
            poll_with_backoff(backoff, test, topic, max_records, gateway, delay).await
        }
    }
}

async fn single_shot(
    test: &RemoteTest,
    topic: &str,
    max_records: u32,
    gateway: &impl GatewayPort,
) -> Acquired {
    match gateway.subscribe(topic, max_records).await {
        Ok(records) => match records.first() {
            Some(record) => Acquired::Conclusive(normalize(record, &test.fields)),
            None => {
                debug!("POLL | {topic}: no record");
                Acquired::NoResponse(None)
            }
        },
        Err(e) => {
            warn!("POLL | {topic}: subscribe failed: {e}");
            Acquired::NoResponse(Some(e))
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Backoff {
    initial: Duration,
    max: Duration,
    deadline: Duration,
}

async fn poll_with_backoff(
    backoff: Backoff,
    test: &RemoteTest,
    topic: &str,
    max_records: u32,
    gateway: &impl GatewayPort,
    delay: &impl DelayPort,
) -> Acquired {
    let mut wait = backoff.initial;
    let mut waited = Duration::ZERO;
    let mut attempts = 0u32;
    let mut last = None;

    loop {
        attempts += 1;
        match gateway.subscribe(topic, max_records).await {
            Ok(records) => {
                for record in &records {
                    let extracted = normalize(record, &test.fields);
                    if is_conclusive(&extracted, test.command_tag) {
                        debug!("POLL | {topic}: conclusive after {attempts} reads");
                        return Acquired::Conclusive(extracted);
                    }
                    last = Some(extracted);
                }
            }
            Err(e) => warn!("POLL | {topic}: read {attempts} failed: {e}"),
        }

        if waited >= backoff.deadline {
            warn!("POLL | {topic}: deadline reached after {attempts} reads");
            return Acquired::DeadlineExceeded { attempts, last };
        }
        let step = wait.min(backoff.deadline - waited);
        delay.sleep(step).await;
        waited += step;
        wait = (wait * 2).min(backoff.max);
    }
}

fn is_conclusive(extracted: &Extracted, command_tag: &str) -> bool {
    extracted.has_status()
        && extracted
            .test_name
            .as_deref()
            .is_none_or(|name| name.trim().eq_ignore_ascii_case(command_tag))
}
