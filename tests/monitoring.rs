//! Device monitoring and trap delivery between in-process agents and a manager.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use snmp_lab::device::DeviceStatus;
use snmp_lab::mib::oids;
use snmp_lab::trap::ChannelSink;
use snmp_lab::{Error, ErrorKind, Severity, Value};
use tokio::sync::mpsc;

#[tokio::test]
async fn test_agent_going_away_is_reported_offline() {
    let lab = Lab::start(&["agent-001", "agent-002"]);
    let mut status = lab.manager.subscribe_status();

    let transitions = lab.manager.poll_devices().await;
    assert_eq!(transitions.len(), 2);
    assert!(transitions.iter().all(|t| t.to == DeviceStatus::Online));

    // Steady state.
    assert!(lab.manager.poll_devices().await.is_empty());

    assert!(lab.engine.unbind_agent("agent-002", 161));
    let transitions = lab.manager.poll_devices().await;
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].device_id, "agent-002");
    assert_eq!(transitions[0].from, DeviceStatus::Online);
    assert_eq!(transitions[0].to, DeviceStatus::Offline);

    let device = lab.manager.device("agent-002").unwrap();
    assert_eq!(device.status, DeviceStatus::Offline);
    assert!(device.last_seen.is_some());

    let mut seen = Vec::new();
    while let Ok(t) = status.try_recv() {
        seen.push((t.device_id, t.to));
    }
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[2], ("agent-002".to_string(), DeviceStatus::Offline));

    lab.shutdown().await;
}

#[tokio::test]
async fn test_status_changes_reach_trap_listeners() {
    let lab = Lab::start(&["agent-001"]);
    let (tx, mut rx) = mpsc::channel(8);
    lab.manager
        .add_trap_sink(Arc::new(ChannelSink::new("test", tx)));

    lab.manager.poll_devices().await;
    let trap = rx.recv().await.unwrap();
    assert_eq!(trap.oid, oids::link_up());
    assert_eq!(trap.source_id, "agent-001");
    assert_eq!(trap.severity, Severity::Info);

    lab.shutdown().await;
}

#[tokio::test]
async fn test_agent_trap_reaches_manager_listeners() {
    let lab = Lab::start(&["agent-001"]);
    let (tx, mut rx) = mpsc::channel(8);
    lab.manager
        .add_trap_sink(Arc::new(ChannelSink::new("test", tx)));
    lab.manager
        .listen_loopback(&lab.engine, MANAGER_ADDRESS, 162, 16);

    let report = lab
        .agent("agent-001")
        .send_trap(
            oids::custom_trap(),
            Value::from("disk almost full"),
            Some("Disk usage 91%"),
            Severity::Critical,
        )
        .await;
    assert_eq!(report.delivered(), 1);

    let trap = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(trap.source_id, "agent-001");
    assert_eq!(trap.message, "Disk usage 91%");
    assert_eq!(trap.severity, Severity::Critical);
    assert_eq!(
        trap.variables.get(&oids::custom_trap()),
        Some(&Value::from("disk almost full"))
    );

    lab.shutdown().await;
}

#[tokio::test]
async fn test_trap_without_receiver_fails_per_destination() {
    let lab = Lab::start(&["agent-001"]);
    // Nobody listens on manager:162.
    let report = lab
        .agent("agent-001")
        .send_trap(oids::custom_trap(), Value::from("x"), None, Severity::Info)
        .await;
    assert_eq!(report.delivered(), 0);
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.outcomes[0].result,
        Err(Error::Delivery { .. })
    ));

    lab.shutdown().await;
}

#[tokio::test]
async fn test_failing_listener_does_not_block_others() {
    let lab = Lab::start(&["agent-001"]);
    lab.manager.add_trap_listener("broken", |_| {
        Err(Error::Delivery {
            destination: "broken".into(),
            reason: "listener crashed".into(),
        })
    });
    let (tx, mut rx) = mpsc::channel(8);
    lab.manager
        .add_trap_sink(Arc::new(ChannelSink::new("healthy", tx)));

    let event = snmp_lab::TrapEvent::new(
        "agent-001",
        oids::custom_trap(),
        Value::from("x"),
        "test",
        Severity::Warning,
    );
    let report = lab.manager.handle_trap(&event).await;
    assert_eq!(report.outcomes.len(), 2);
    assert!(report.outcomes[0].result.is_err());
    assert!(report.outcomes[1].result.is_ok());
    assert_eq!(rx.recv().await.unwrap().id, event.id);

    lab.shutdown().await;
}

#[tokio::test]
async fn test_no_listeners_reports_no_destinations() {
    let lab = Lab::start(&["agent-001"]);
    let event = snmp_lab::TrapEvent::new(
        "agent-001",
        oids::custom_trap(),
        Value::from("x"),
        "test",
        Severity::Info,
    );
    let report = lab.manager.handle_trap(&event).await;
    assert_eq!(report.error_kind(), Some(ErrorKind::NoDestinations));

    lab.shutdown().await;
}
