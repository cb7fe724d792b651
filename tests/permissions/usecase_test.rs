/*!
 * Use Case Component Tests
 * Guarded counter operations driven by sequence and multiset grants
 */

use call_order_control::{
    CallError, ClientId, DenialReason, GrantProvider, PermissionRegistry, UseCaseComponent,
    UseCaseError,
};
use std::sync::Arc;

const DEPLOYER: ClientId = ClientId::new([0xde; 20]);
const CLIENT1: ClientId = ClientId::new([0xc1; 20]);
const CLIENT2: ClientId = ClientId::new([0xc2; 20]);

fn deploy() -> UseCaseComponent {
    UseCaseComponent::new(DEPLOYER, Arc::new(PermissionRegistry::new()))
}

fn assert_not_allowed(result: Result<(), UseCaseError>) {
    assert!(
        matches!(
            result,
            Err(UseCaseError::Call(CallError::NotAllowedCall { .. }))
        ),
        "expected NotAllowedCall, got {:?}",
        result
    );
}

#[test]
fn test_grant_through_component_is_visible() {
    let component = deploy();
    let change = UseCaseComponent::change_data_selector();

    component
        .call_allow_func_calls_for(DEPLOYER, CLIENT1, vec![change], true)
        .unwrap();
    assert_eq!(component.registry().allowed_calls(CLIENT1), vec![change]);
    assert!(component.registry().is_sequence(CLIENT1));

    component
        .call_allow_func_calls_for(DEPLOYER, CLIENT2, vec![change], false)
        .unwrap();
    assert_eq!(component.registry().allowed_calls(CLIENT2), vec![change]);
    assert!(!component.registry().is_sequence(CLIENT2));
}

#[test]
fn test_sequence_mode_component_flow() {
    let component = deploy();
    let change = UseCaseComponent::change_data_selector();
    let increment = UseCaseComponent::increment_data_selector();

    // No permission yet
    assert_not_allowed(component.change_data(CLIENT1, 1));

    component
        .call_allow_func_calls_for(DEPLOYER, CLIENT1, vec![change, increment, change], true)
        .unwrap();

    // Wrong order
    assert_not_allowed(component.increment_data(CLIENT1, 1));
    assert_eq!(component.number(), 0);

    component.change_data(CLIENT1, 1).unwrap();
    assert_eq!(component.number(), 1);
    component.increment_data(CLIENT1, 1).unwrap();
    assert_eq!(component.number(), 2);
    component.change_data(CLIENT1, 1).unwrap();
    assert_eq!(component.number(), 1);

    // Sequence used up
    assert_not_allowed(component.change_data(CLIENT1, 1));
    assert_not_allowed(component.increment_data(CLIENT1, 1));
    assert_not_allowed(component.change_data(CLIENT1, 1));
    assert_eq!(component.number(), 1);
}

#[test]
fn test_multiset_mode_component_flow() {
    let component = deploy();
    let change = UseCaseComponent::change_data_selector();
    let increment = UseCaseComponent::increment_data_selector();

    assert_not_allowed(component.change_data(CLIENT1, 1));

    component
        .call_allow_func_calls_for(DEPLOYER, CLIENT1, vec![change, increment, change], false)
        .unwrap();

    component.change_data(CLIENT1, 1).unwrap();
    assert_eq!(component.number(), 1);
    component.increment_data(CLIENT1, 1).unwrap();
    assert_eq!(component.number(), 2);
    component.change_data(CLIENT1, 1).unwrap();
    assert_eq!(component.number(), 1);

    assert_not_allowed(component.change_data(CLIENT1, 1));
    assert_not_allowed(component.increment_data(CLIENT1, 1));
    assert_not_allowed(component.change_data(CLIENT1, 1));
}

#[test]
fn test_multiset_regrant_resets_counts() {
    let component = deploy();
    let change = UseCaseComponent::change_data_selector();
    let increment = UseCaseComponent::increment_data_selector();
    let calls = vec![change, increment, change];

    component
        .call_allow_func_calls_for(DEPLOYER, CLIENT1, calls.clone(), false)
        .unwrap();
    component.change_data(CLIENT1, 1).unwrap();
    component.increment_data(CLIENT1, 1).unwrap();
    assert_eq!(component.number(), 2);

    // One changeData still unused; the new grant overwrites it
    component
        .call_allow_func_calls_for(DEPLOYER, CLIENT1, calls, false)
        .unwrap();

    component.change_data(CLIENT1, 1).unwrap();
    assert_eq!(component.number(), 1);
    component.change_data(CLIENT1, 1).unwrap();
    assert_eq!(component.number(), 1);
    assert_not_allowed(component.change_data(CLIENT1, 1));

    component.increment_data(CLIENT1, 1).unwrap();
    assert_eq!(component.number(), 2);
    assert_not_allowed(component.increment_data(CLIENT1, 1));
}

#[test]
fn test_non_owner_cannot_grant() {
    let component = deploy();
    let change = UseCaseComponent::change_data_selector();

    let result = component.call_allow_func_calls_for(CLIENT1, CLIENT1, vec![change], false);
    assert_eq!(result, Err(UseCaseError::NotOwner { caller: CLIENT1 }));
    assert_not_allowed(component.change_data(CLIENT1, 1));
}

#[test]
fn test_rejection_carries_reason() {
    let component = deploy();
    let change = UseCaseComponent::change_data_selector();
    let increment = UseCaseComponent::increment_data_selector();
    component
        .call_allow_func_calls_for(DEPLOYER, CLIENT1, vec![change], true)
        .unwrap();

    match component.increment_data(CLIENT1, 1) {
        Err(UseCaseError::Call(err)) => assert_eq!(
            err.reason(),
            DenialReason::OutOfOrder {
                expected: change,
                position: 0
            }
        ),
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(component.registry().remaining_calls(CLIENT1, increment), 0);
}
