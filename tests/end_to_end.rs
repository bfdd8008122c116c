//! Manager operations against in-process agents over the loopback engine.

mod common;

use common::*;
use snmp_lab::mib::oids;
use snmp_lab::{ErrorKind, SnmpDevice, TypeTag, Value};

#[tokio::test]
async fn test_walk_if_index_returns_both_rows_in_order() {
    let lab = Lab::start(&["agent-001"]);

    let rows = lab
        .manager
        .walk("agent-001", &if_index_column(), None)
        .await;

    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.success));
    assert_eq!(rows[0].oid, if_index_column().child(1));
    assert_eq!(rows[1].oid, if_index_column().child(2));
    assert_eq!(rows[0].value, Some(Value::Integer(1)));
    assert_eq!(rows[1].value, Some(Value::Integer(2)));
    assert!(rows.iter().all(|r| !r.oid.starts_with(&if_descr_column())));

    lab.shutdown().await;
}

#[tokio::test]
async fn test_walk_system_group_respects_max_results() {
    let lab = Lab::start(&["agent-001"]);

    let all = lab
        .manager
        .walk("agent-001", &system_subtree(), None)
        .await;
    assert_eq!(all.len(), 6);
    assert!(all.windows(2).all(|w| w[0].oid < w[1].oid));

    let capped = lab
        .manager
        .walk("agent-001", &system_subtree(), Some(3))
        .await;
    assert_eq!(capped.len(), 3);
    assert_eq!(capped[0].oid, sys_descr());

    lab.shutdown().await;
}

#[tokio::test]
async fn test_walk_to_end_of_mib_is_clean() {
    let lab = Lab::start(&["agent-001"]);
    lab.add_device(SnmpDevice::v1("agent-001-v1", "agent-001", COMMUNITY_RO));

    for device in ["agent-001", "agent-001-v1"] {
        let rows = lab
            .manager
            .walk(device, &oids::enterprise(), None)
            .await;
        assert_eq!(rows.len(), 1, "{device}");
        assert!(rows[0].success);
        assert_eq!(rows[0].oid, oids::custom_trap());
    }

    lab.shutdown().await;
}

#[tokio::test]
async fn test_get_and_get_next() {
    let lab = Lab::start(&["agent-001"]);

    let result = lab.manager.get("agent-001", &sys_name()).await;
    assert!(result.success);
    assert_eq!(result.value, Some(Value::from("SNMP-Agent-agent-001")));
    assert_eq!(result.type_tag, Some(TypeTag::OctetString));
    assert_eq!(result.device.as_ref().unwrap().id, "agent-001");

    let result = lab.manager.get_next("agent-001", &sys_descr()).await;
    assert!(result.success);
    assert_eq!(result.oid, oids::sys_object_id());

    lab.shutdown().await;
}

#[tokio::test]
async fn test_missing_objects_are_not_found() {
    let lab = Lab::start(&["agent-001"]);
    lab.add_device(SnmpDevice::v1("agent-001-v1", "agent-001", COMMUNITY_RO));

    for device in ["agent-001", "agent-001-v1"] {
        let result = lab.manager.get(device, &nonexistent_oid()).await;
        assert!(!result.success);
        assert_eq!(result.error_kind(), Some(ErrorKind::NotFound), "{device}");

        let result = lab
            .manager
            .get(device, &if_descr_column().child(9))
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::NotFound), "{device}");
    }

    lab.shutdown().await;
}

#[tokio::test]
async fn test_set_read_write_entry() {
    let lab = Lab::start(&["agent-001"]);
    lab.add_device(SnmpDevice::v2c("agent-001-rw", "agent-001", COMMUNITY_RW));
    let store = lab.agent("agent-001").store().clone();
    let before = store.get(&sys_contact()).unwrap();

    let result = lab
        .manager
        .set("agent-001-rw", &sys_contact(), "noc@example.net", "string")
        .await;
    assert!(result.success, "{:?}", result.error);

    let after = store.get(&sys_contact()).unwrap();
    assert_eq!(after.value, Value::from("noc@example.net"));
    assert!(after.last_updated > before.last_updated);

    let read_back = lab.manager.get("agent-001", &sys_contact()).await;
    assert_eq!(read_back.value, Some(Value::from("noc@example.net")));

    lab.shutdown().await;
}

#[tokio::test]
async fn test_set_read_only_entry_is_denied_and_unchanged() {
    let lab = Lab::start(&["agent-001"]);
    lab.add_device(SnmpDevice::v2c("agent-001-rw", "agent-001", COMMUNITY_RW));
    let store = lab.agent("agent-001").store().clone();
    let before = store.get(&sys_descr()).unwrap();

    let result = lab
        .manager
        .set("agent-001-rw", &sys_descr(), "hacked", "string")
        .await;
    assert!(!result.success);
    assert_eq!(result.error_kind(), Some(ErrorKind::AccessDenied));

    let after = store.get(&sys_descr()).unwrap();
    assert_eq!(after.value, before.value);
    assert_eq!(after.last_updated, before.last_updated);

    lab.shutdown().await;
}

#[tokio::test]
async fn test_set_with_read_community_is_denied() {
    let lab = Lab::start(&["agent-001"]);

    let result = lab
        .manager
        .set("agent-001", &sys_contact(), "x", "string")
        .await;
    assert_eq!(result.error_kind(), Some(ErrorKind::AccessDenied));

    lab.shutdown().await;
}

#[tokio::test]
async fn test_set_wrong_type() {
    let lab = Lab::start(&["agent-001"]);
    lab.add_device(SnmpDevice::v2c("agent-001-rw", "agent-001", COMMUNITY_RW));

    let result = lab
        .manager
        .set("agent-001-rw", &sys_contact(), "42", "integer")
        .await;
    assert_eq!(result.error_kind(), Some(ErrorKind::WrongType));

    lab.shutdown().await;
}

#[tokio::test]
async fn test_v3_user_can_write() {
    let lab = Lab::start(&["agent-001"]);
    lab.add_device(SnmpDevice::v3("agent-001-v3", "agent-001", V3_USER, V3_AUTH_KEY));

    let result = lab
        .manager
        .set("agent-001-v3", &sys_name(), "core-01", "string")
        .await;
    assert!(result.success, "{:?}", result.error);

    lab.shutdown().await;
}

#[tokio::test]
async fn test_bad_credentials_time_out() {
    let lab = Lab::start(&["agent-001"]);
    lab.add_device(SnmpDevice::v2c("agent-001-bad", "agent-001", "wrong"));

    let result = lab.manager.get("agent-001-bad", &sys_descr()).await;
    let error = result.error.unwrap();
    assert_eq!(error.kind, ErrorKind::ProtocolError);
    assert!(error.detail.contains("timed out"), "{}", error.detail);

    lab.shutdown().await;
}

#[tokio::test]
async fn test_unknown_device_and_unbound_agent() {
    let lab = Lab::start(&["agent-001"]);

    let result = lab.manager.get("agent-404", &sys_descr()).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::NotFound));

    lab.add_device(SnmpDevice::v2c("ghost", "nowhere", COMMUNITY_RO));
    let result = lab.manager.get("ghost", &sys_descr()).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::ProtocolError));

    lab.shutdown().await;
}
