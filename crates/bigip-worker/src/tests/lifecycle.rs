//! Message lifecycle tests: ack, status replies, notifications, reports.

use super::harness::{message, strings, DeviceCall, Event, TestHarness};
use crate::channel::{Phase, StatusUpdate};
use crate::error::WorkerError;
use crate::handler::Outcome;
use serde_json::json;

fn completed_argv(status: &StatusUpdate) -> Vec<String> {
    match status {
        StatusUpdate::Completed { data: Some(data) } => {
            serde_json::from_value(data["argv"].clone()).unwrap()
        }
        other => panic!("expected completed status with data, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_parameters_fails_with_one_report() {
    let harness = TestHarness::new();
    let msg = message("1-0", json!({"group": "test", "notify": {}}));

    let outcome = harness.handler().handle(&msg).await.unwrap();
    assert_eq!(outcome, Outcome::Failed);

    let recorder = &harness.recorder;
    assert_eq!(recorder.acks(), vec!["1-0".to_string()]);
    assert_eq!(
        recorder.statuses(),
        vec![StatusUpdate::Started, StatusUpdate::Failed]
    );

    let notifications = recorder.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "BigipWorker Failed");
    assert_eq!(notifications[0].phase, Phase::Failed);
    assert_eq!(notifications[0].correlation_id, "corr-1-0");
    assert!(notifications[0]
        .body
        .contains("Parameters dictionary not passed"));

    assert_eq!(recorder.reports().len(), 1);
    assert_eq!(recorder.reports()[0], notifications[0].body);
    assert!(harness.executor.calls().is_empty());
}

#[tokio::test]
async fn config_sync_runs_sync_once() {
    let harness = TestHarness::new();
    let msg = message(
        "2-0",
        json!({"parameters": {"subcommand": "ConfigSync", "envs": ["qa"]}}),
    );

    let outcome = harness.handler().handle(&msg).await.unwrap();
    assert_eq!(outcome, Outcome::Completed);

    assert_eq!(
        harness.executor.calls(),
        vec![DeviceCall::Sync(strings(&["qa"]))]
    );

    let statuses = harness.recorder.statuses();
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0], StatusUpdate::Started);
    assert_eq!(completed_argv(&statuses[1]), strings(&["sync", "-e", "qa"]));

    let notifications = harness.recorder.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "BigipWorker Executed Successfully");
    assert_eq!(
        notifications[0].body,
        "BigipWorker successfully executed bigip:ConfigSync qa. See logs."
    );
    assert_eq!(notifications[0].phase, Phase::Completed);
    assert!(harness.recorder.reports().is_empty());
}

#[tokio::test]
async fn in_rotation_keeps_host_order() {
    let harness = TestHarness::new();
    let msg = message(
        "3-0",
        json!({"parameters": {"subcommand": "InRotation", "hosts": ["web1", "web2"]}}),
    );

    harness.handler().handle(&msg).await.unwrap();

    let statuses = harness.recorder.statuses();
    assert_eq!(
        completed_argv(&statuses[1]),
        strings(&["state", "-e", "web1", "web2"])
    );
    assert_eq!(
        harness.executor.calls(),
        vec![DeviceCall::State {
            enabled: strings(&["web1", "web2"]),
            disabled: vec![],
        }]
    );
}

#[tokio::test]
async fn out_of_rotation_disables_hosts() {
    let harness = TestHarness::new();
    let msg = message(
        "4-0",
        json!({"parameters": {"subcommand": "OutOfRotation", "hosts": ["web3"]}}),
    );

    harness.handler().handle(&msg).await.unwrap();

    assert_eq!(
        harness.executor.calls(),
        vec![DeviceCall::State {
            enabled: vec![],
            disabled: strings(&["web3"]),
        }]
    );
}

#[tokio::test]
async fn ack_comes_first_and_once() {
    for body in [
        json!({}),
        json!({"parameters": {"subcommand": "Reboot"}}),
        json!({"parameters": {"subcommand": "InRotation", "hosts": ["web1"]}}),
    ] {
        let harness = TestHarness::new();
        let msg = message("5-0", body);

        harness.handler().handle(&msg).await.unwrap();

        let events = harness.recorder.events();
        assert_eq!(events[0], Event::Ack("5-0".to_string()));
        assert_eq!(harness.recorder.acks().len(), 1);
        assert!(matches!(
            &events[1],
            Event::Status {
                status: StatusUpdate::Started,
                ..
            }
        ));
    }
}

#[tokio::test]
async fn statuses_go_to_reply_destination() {
    let harness = TestHarness::new();
    let msg = message(
        "6-0",
        json!({"parameters": {"subcommand": "ConfigSync", "envs": ["qa"]}}),
    );

    harness.handler().handle(&msg).await.unwrap();

    for event in harness.recorder.events() {
        if let Event::Status {
            reply_to,
            correlation_id,
            ..
        } = event
        {
            assert_eq!(reply_to, "me");
            assert_eq!(correlation_id, "corr-6-0");
        }
    }
}

#[tokio::test]
async fn invalid_subcommand_reports_message_verbatim() {
    let harness = TestHarness::new();
    let msg = message(
        "7-0",
        json!({"parameters": {"command": "bigip", "subcommand": "invalidsubcommand"}}),
    );

    let outcome = harness.handler().handle(&msg).await.unwrap();
    assert_eq!(outcome, Outcome::Failed);

    assert_eq!(
        harness.recorder.notifications()[0].body,
        "Invalid subcommand: invalidsubcommand"
    );
    assert_eq!(
        harness.recorder.reports(),
        vec!["Invalid subcommand: invalidsubcommand".to_string()]
    );
}

#[tokio::test]
async fn executor_fault_is_reported_as_failed() {
    let harness = TestHarness::new();
    harness.executor.fail_with("pool member web1 not found");
    let msg = message(
        "8-0",
        json!({"parameters": {"subcommand": "InRotation", "hosts": ["web1"]}}),
    );

    let outcome = harness.handler().handle(&msg).await.unwrap();
    assert_eq!(outcome, Outcome::Failed);

    assert_eq!(harness.executor.calls().len(), 1);
    assert_eq!(
        harness.recorder.statuses(),
        vec![StatusUpdate::Started, StatusUpdate::Failed]
    );
    assert_eq!(
        harness.recorder.reports(),
        vec!["pool member web1 not found".to_string()]
    );
}

#[tokio::test]
async fn failure_ordering() {
    let harness = TestHarness::new();
    let msg = message("9-0", json!({"parameters": {"subcommand": "ConfigSync"}}));

    harness.handler().handle(&msg).await.unwrap();

    let kinds: Vec<&str> = harness
        .recorder
        .events()
        .iter()
        .map(|e| match e {
            Event::Ack(_) => "ack",
            Event::Status {
                status: StatusUpdate::Started,
                ..
            } => "started",
            Event::Status {
                status: StatusUpdate::Failed,
                ..
            } => "failed",
            Event::Status { .. } => "completed",
            Event::Notify(_) => "notify",
            Event::Report { .. } => "report",
        })
        .collect();

    assert_eq!(kinds, vec!["ack", "started", "failed", "notify", "report"]);
}

#[tokio::test]
async fn collaborator_failure_propagates_after_ack() {
    let harness = TestHarness::new();
    harness.channel.fail_status_replies();
    let msg = message(
        "10-0",
        json!({"parameters": {"subcommand": "ConfigSync", "envs": ["qa"]}}),
    );

    let err = harness.handler().handle(&msg).await.unwrap_err();
    assert!(matches!(err, WorkerError::Protocol(_)));

    assert_eq!(harness.recorder.acks(), vec!["10-0".to_string()]);
    assert!(harness.executor.calls().is_empty());
    assert!(harness.recorder.notifications().is_empty());
}

#[tokio::test]
async fn flag_like_hosts_never_reach_the_device() {
    for (subcommand, hosts) in [
        ("InRotation", json!(["web1", "-d", "web2"])),
        ("OutOfRotation", json!(["web1", "-v"])),
    ] {
        let harness = TestHarness::new();
        let msg = message(
            "11-0",
            json!({"parameters": {"subcommand": subcommand, "hosts": hosts}}),
        );

        let outcome = harness.handler().handle(&msg).await.unwrap();
        assert_eq!(outcome, Outcome::Failed);

        assert!(harness.executor.calls().is_empty());
        assert_eq!(
            harness.recorder.statuses(),
            vec![StatusUpdate::Started, StatusUpdate::Failed]
        );
        assert!(harness.recorder.reports()[0].contains("\"hosts\""));
    }
}
