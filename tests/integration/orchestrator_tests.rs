//! Integration tests for the run-test pipeline:
//! CertService → GatewayPort → normalisation → session.

use core::time::Duration;

use futures_lite::future::block_on;
use serde_json::json;

use podcert::app::events::CertEvent;
use podcert::app::service::{CertService, RunOutcome};
use podcert::catalog::TestId;
use podcert::config::{CertConfig, PollPolicy};
use podcert::error::{TestFailure, TransportError};
use podcert::session::{PodId, TestResult, TestStatus};

use crate::mock_gateway::{GatewayCall, MockGateway, RecordingDelay, RecordingSink};

fn service(config: CertConfig) -> CertService {
    CertService::new(config, PodId::new("QP-0042").unwrap())
}

fn backoff_config() -> CertConfig {
    CertConfig {
        poll: PollPolicy::Backoff {
            initial_ms: 100,
            max_ms: 400,
            deadline_ms: 1000,
        },
        ..CertConfig::default()
    }
}

// ── Remote pass ───────────────────────────────────────────────

#[test]
fn buzzer_completed_record_passes() {
    let svc = service(CertConfig::default());
    let gw = MockGateway::new().reply(json!([{"Test": "buzzer_test", "Test_Status": "Completed"}]));
    let delay = RecordingDelay::new();
    let mut sink = RecordingSink::new();

    let outcome = block_on(svc.run_test(TestId::Buzzer, &gw, &delay, &mut sink));

    assert_eq!(outcome, RunOutcome::Passed(TestResult::new("buzzer_test", "Completed")));
    let session = svc.session();
    assert_eq!(session.status(TestId::Buzzer), TestStatus::Success);
    assert_eq!(
        session.last_result(),
        Some(&TestResult::new("buzzer_test", "Completed"))
    );
    assert_eq!(session.running(), None);
}

#[test]
fn publish_then_settle_then_single_read() {
    let svc = service(CertConfig::default());
    let gw = MockGateway::new().reply(json!({"Test": "bay_door_test", "Test_Status": "completed"}));
    let delay = RecordingDelay::new();
    let mut sink = RecordingSink::new();

    block_on(svc.run_test(TestId::BayDoor, &gw, &delay, &mut sink));

    assert_eq!(
        *gw.calls.borrow(),
        vec![
            GatewayCall::Publish {
                topic: "QP-0042".into(),
                payload: json!({"action": "bay_door_test"}),
            },
            GatewayCall::Subscribe {
                topic: "QP-0042".into(),
                max_records: 1,
            },
        ]
    );
    assert_eq!(delay.millis(), vec![2000]);
}

#[test]
fn status_match_is_case_and_whitespace_insensitive() {
    let svc = service(CertConfig::default());
    let gw = MockGateway::new().reply(json!({"test": "buzzer_test", "status": "  COMPLETED "}));
    let delay = RecordingDelay::new();
    let mut sink = RecordingSink::new();

    let outcome = block_on(svc.run_test(TestId::Buzzer, &gw, &delay, &mut sink));

    assert!(outcome.is_passed());
    assert_eq!(svc.session().status(TestId::Buzzer), TestStatus::Success);
}

// ── Remote failure ────────────────────────────────────────────

#[test]
fn door_failure_carries_metric_and_raises_notice() {
    let svc = service(CertConfig::default());
    let gw = MockGateway::new()
        .reply(json!({"test": "door_test", "status": "failed", "doors_failed": 2}));
    let delay = RecordingDelay::new();
    let mut sink = RecordingSink::new();

    let outcome = block_on(svc.run_test(TestId::Doors, &gw, &delay, &mut sink));

    let RunOutcome::Failed { failure, result } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(
        failure,
        TestFailure::Incomplete {
            status: "failed".into()
        }
    );
    assert_eq!(result.doors_failed(), Some(2));

    let session = svc.session();
    assert_eq!(session.status(TestId::Doors), TestStatus::Failed);
    assert_eq!(session.last_result().and_then(TestResult::doors_failed), Some(2));

    let notices = sink.notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("Doors"), "{}", notices[0]);
    assert!(notices[0].contains("2 doors failed"), "{}", notices[0]);
}

#[test]
fn publish_fault_skips_subscribe() {
    let svc = service(CertConfig::default());
    let gw = MockGateway::failing_publish(TransportError::Status(503));
    let delay = RecordingDelay::new();
    let mut sink = RecordingSink::new();

    let outcome = block_on(svc.run_test(TestId::Buzzer, &gw, &delay, &mut sink));

    assert!(matches!(
        outcome,
        RunOutcome::Failed {
            failure: TestFailure::Transport(TransportError::Status(503)),
            ..
        }
    ));
    assert_eq!(gw.publishes(), 1);
    assert_eq!(gw.subscribes(), 0);
    assert!(delay.waits.borrow().is_empty(), "no settle after failed publish");
    assert_eq!(svc.session().status(TestId::Buzzer), TestStatus::Failed);
    assert_eq!(svc.session().running(), None);
}

#[test]
fn empty_read_fails_with_unknown_status() {
    let svc = service(CertConfig::default());
    let gw = MockGateway::new().reply(json!([]));
    let delay = RecordingDelay::new();
    let mut sink = RecordingSink::new();

    let outcome = block_on(svc.run_test(TestId::Doors, &gw, &delay, &mut sink));

    assert_eq!(
        outcome,
        RunOutcome::Failed {
            failure: TestFailure::NoResponse { cause: None },
            result: TestResult::new("door_test", "Unknown"),
        }
    );
    assert_eq!(svc.session().status(TestId::Doors), TestStatus::Failed);
    assert_eq!(
        svc.session().last_result().map(|r| r.test_status.as_str()),
        Some("Unknown")
    );
}

#[test]
fn subscribe_fault_is_no_response() {
    let svc = service(CertConfig::default());
    let gw = MockGateway::new().reply_err(TransportError::Unauthorized);
    let delay = RecordingDelay::new();
    let mut sink = RecordingSink::new();

    let outcome = block_on(svc.run_test(TestId::Buzzer, &gw, &delay, &mut sink));

    assert!(matches!(
        outcome,
        RunOutcome::Failed {
            failure: TestFailure::NoResponse {
                cause: Some(TransportError::Unauthorized)
            },
            ..
        }
    ));
}

#[test]
fn record_without_known_fields_fails_with_fallbacks() {
    let svc = service(CertConfig::default());
    let gw = MockGateway::new().reply(json!({"foo": "bar"}));
    let delay = RecordingDelay::new();
    let mut sink = RecordingSink::new();

    let outcome = block_on(svc.run_test(TestId::Buzzer, &gw, &delay, &mut sink));

    assert_eq!(
        outcome.result(),
        Some(&TestResult::new("buzzer_test", "Unknown"))
    );
    assert!(!outcome.is_passed());
}

#[test]
fn echoed_command_without_status_is_no_response() {
    let svc = service(CertConfig::default());
    let gw = MockGateway::new().reply(json!({"action": "buzzer_test"}));
    let delay = RecordingDelay::new();
    let mut sink = RecordingSink::new();

    let outcome = block_on(svc.run_test(TestId::Buzzer, &gw, &delay, &mut sink));

    assert_eq!(
        outcome,
        RunOutcome::Failed {
            failure: TestFailure::NoResponse { cause: None },
            result: TestResult::new("buzzer_test", "Unknown"),
        }
    );
    let notices = sink.notices();
    assert_eq!(notices, vec!["Buzzer test failed: no response from pod".to_owned()]);
    assert!(!notices[0].contains("reported status"));
}

// ── Simulated ─────────────────────────────────────────────────

#[test]
fn simulated_test_passes_without_network() {
    let svc = service(CertConfig::default());
    let gw = MockGateway::failing_publish(TransportError::NotConfigured);
    let delay = RecordingDelay::new();
    let mut sink = RecordingSink::new();

    let outcome = block_on(svc.run_test(TestId::Ups, &gw, &delay, &mut sink));

    assert_eq!(outcome, RunOutcome::Passed(TestResult::new("ups", "Completed")));
    assert_eq!(gw.call_count(), 0);
    assert_eq!(delay.total(), Duration::from_millis(1200));
    assert_eq!(svc.session().status(TestId::Ups), TestStatus::Success);
}

#[test]
fn simulated_delay_override_applies_to_every_simulated_test() {
    let svc = service(CertConfig {
        simulated_delay_override_ms: Some(5),
        ..CertConfig::default()
    });
    let gw = MockGateway::new();
    let delay = RecordingDelay::new();
    let mut sink = RecordingSink::new();

    block_on(svc.run_test(TestId::Ups, &gw, &delay, &mut sink));
    block_on(svc.run_test(TestId::NetworkSpeed, &gw, &delay, &mut sink));

    assert_eq!(delay.millis(), vec![5, 5]);
}

// ── Events ────────────────────────────────────────────────────

#[test]
fn started_then_passed_events() {
    let svc = service(CertConfig::default());
    let gw = MockGateway::new();
    let delay = RecordingDelay::new();
    let mut sink = RecordingSink::new();

    block_on(svc.run_test(TestId::NetworkSpeed, &gw, &delay, &mut sink));

    assert_eq!(
        sink.events,
        vec![
            CertEvent::TestStarted(TestId::NetworkSpeed),
            CertEvent::TestPassed {
                test: TestId::NetworkSpeed,
                result: TestResult::new("network_speed", "Completed"),
            },
        ]
    );
    assert!(sink.notices().is_empty());
}

// ── Backoff policy ────────────────────────────────────────────

#[test]
fn backoff_skips_echo_and_foreign_records() {
    let svc = service(backoff_config());
    let gw = MockGateway::new()
        .reply(json!({"action": "buzzer_test"}))
        .reply(json!({"Test": "door_test", "Test_Status": "Completed"}))
        .reply(json!({"Test": "buzzer_test", "Test_Status": "Completed"}));
    let delay = RecordingDelay::new();
    let mut sink = RecordingSink::new();

    let outcome = block_on(svc.run_test(TestId::Buzzer, &gw, &delay, &mut sink));

    assert!(outcome.is_passed(), "{outcome:?}");
    assert_eq!(gw.subscribes(), 3);
    assert_eq!(delay.millis(), vec![2000, 100, 200]);
}

#[test]
fn backoff_rides_out_transient_read_errors() {
    let svc = service(backoff_config());
    let gw = MockGateway::new()
        .reply_err(TransportError::Status(502))
        .reply(json!({"test": "door_test", "status": "failed", "doors_failed": 1}));
    let delay = RecordingDelay::new();
    let mut sink = RecordingSink::new();

    let outcome = block_on(svc.run_test(TestId::Doors, &gw, &delay, &mut sink));

    assert!(matches!(
        outcome,
        RunOutcome::Failed {
            failure: TestFailure::Incomplete { .. },
            ..
        }
    ));
    assert_eq!(outcome.result().and_then(TestResult::doors_failed), Some(1));
}

#[test]
fn backoff_deadline_is_distinct_from_pod_failure() {
    let svc = service(backoff_config());
    let gw = MockGateway::new();
    let delay = RecordingDelay::new();
    let mut sink = RecordingSink::new();

    let outcome = block_on(svc.run_test(TestId::BayDoor, &gw, &delay, &mut sink));

    let RunOutcome::Failed { failure, result } = outcome else {
        panic!("expected failure");
    };
    assert_eq!(failure, TestFailure::DeadlineExceeded { attempts: 5 });
    assert_eq!(failure.kind(), "deadline_exceeded");
    assert_eq!(result, TestResult::new("bay_door_test", "Unknown"));
    // settle, then 100 + 200 + 400 + 300 = 1000 ms of polling
    assert_eq!(delay.millis(), vec![2000, 100, 200, 400, 300]);
    assert_eq!(svc.session().status(TestId::BayDoor), TestStatus::Failed);
}
