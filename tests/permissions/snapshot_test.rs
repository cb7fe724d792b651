/*!
 * Snapshot Tests
 * Persisted registry state survives a JSON round trip and is validated on load
 */

use call_order_control::permissions::ClientRecord;
use call_order_control::{
    CallGuard, ClientId, OperationId, PermissionRegistry, RegistryConfig, RegistrySnapshot,
    SnapshotError,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

const CLIENT1: ClientId = ClientId::new([0x11; 20]);
const CLIENT2: ClientId = ClientId::new([0x22; 20]);

#[test]
fn test_snapshot_json_roundtrip_continues_consumption() {
    let a = OperationId::from_signature("changeData(uint256)");
    let b = OperationId::from_signature("incrementData(uint256)");

    let registry = PermissionRegistry::new();
    registry.grant(CLIENT1, vec![a, b, a], true);
    registry.grant(CLIENT2, vec![a, b, a], false);
    registry.check_and_consume(CLIENT1, a).unwrap();
    registry.check_and_consume(CLIENT2, a).unwrap();

    let json = serde_json::to_string(&registry.snapshot()).unwrap();
    let snapshot: RegistrySnapshot = serde_json::from_str(&json).unwrap();
    let restored = PermissionRegistry::from_snapshot(snapshot, RegistryConfig::default()).unwrap();

    assert!(restored.check_and_consume(CLIENT1, a).is_err());
    restored.check_and_consume(CLIENT1, b).unwrap();
    restored.check_and_consume(CLIENT1, a).unwrap();

    restored.check_and_consume(CLIENT2, a).unwrap();
    assert!(restored.check_and_consume(CLIENT2, a).is_err());
    restored.check_and_consume(CLIENT2, b).unwrap();
}

#[test]
fn test_snapshot_record_layout() {
    let a = OperationId::from(0x0000_0001_u32);
    let registry = PermissionRegistry::new();
    registry.grant(CLIENT1, vec![a, a], false);
    registry.check_and_consume(CLIENT1, a).unwrap();

    let mut json = serde_json::to_value(registry.snapshot()).unwrap();
    let granted_at = json["clients"][0]
        .as_object_mut()
        .unwrap()
        .remove("granted_at")
        .unwrap();
    assert!(granted_at.is_i64());
    assert_eq!(
        json,
        serde_json::json!({
            "clients": [{
                "client": CLIENT1.to_string(),
                "allowed_calls": ["0x00000001", "0x00000001"],
                "is_sequence": false,
                "sequence_progress": 0,
                "remaining_counts": { "0x00000001": 1 }
            }]
        })
    );
}

#[test]
fn test_invalid_snapshot_rejected() {
    let a = OperationId::from(1_u32);
    let snapshot = RegistrySnapshot {
        clients: vec![ClientRecord {
            client: CLIENT1,
            allowed_calls: vec![a],
            is_sequence: false,
            sequence_progress: 0,
            remaining_counts: BTreeMap::from([(a, 5)]),
            granted_at: SystemTime::UNIX_EPOCH,
        }],
    };

    let err = PermissionRegistry::from_snapshot(snapshot, RegistryConfig::default())
        .err()
        .unwrap();
    assert_eq!(
        err,
        SnapshotError::CountOutOfRange {
            client: CLIENT1,
            operation: a,
            remaining: 5,
            granted: 1,
        }
    );
}

#[test]
fn test_granted_at_survives_json_roundtrip() {
    let a = OperationId::from(1_u32);
    let registry = PermissionRegistry::new();
    registry.grant(CLIENT1, vec![a], true);

    let mut snapshot = registry.snapshot();
    let issued = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    snapshot.clients[0].granted_at = issued;

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["clients"][0]["granted_at"], 1_700_000_000_i64);

    let restored = PermissionRegistry::from_snapshot(
        serde_json::from_value(json).unwrap(),
        RegistryConfig::default(),
    )
    .unwrap();
    assert_eq!(restored.granted_at(CLIENT1), Some(issued));

    restored.grant(CLIENT1, vec![a], true);
    assert!(restored.granted_at(CLIENT1).unwrap() > issued);
}
