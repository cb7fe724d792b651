/*!
 * Registry Concurrency Tests
 * Racing callers must never spend the same unit of permission twice
 */

use call_order_control::permissions::EventKind;
use call_order_control::{
    CallGuard, ClientId, GrantProvider, OperationId, PermissionRegistry, RegistryConfig,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

const THREADS: usize = 8;
const ATTEMPTS_PER_THREAD: usize = 200;

#[test]
fn test_concurrent_multiset_budget() {
    let registry = Arc::new(PermissionRegistry::new());
    let client = ClientId::new([0x33; 20]);
    let op = OperationId::from_signature("changeData(uint256)");
    let budget = 250;
    registry.grant(client, vec![op; budget], false);

    let successes = Arc::new(AtomicU64::new(0));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let successes = Arc::clone(&successes);
            thread::spawn(move || {
                for _ in 0..ATTEMPTS_PER_THREAD {
                    if registry.check_and_consume(client, op).is_ok() {
                        successes.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(successes.load(Ordering::Relaxed), budget as u64);
    assert_eq!(registry.remaining_calls(client, op), 0);
}

#[test]
fn test_concurrent_sequence_walk() {
    let registry = Arc::new(PermissionRegistry::new());
    let client = ClientId::new([0x44; 20]);
    let a = OperationId::from(1_u32);
    let b = OperationId::from(2_u32);
    let granted: Vec<_> = (0..100).map(|i| if i % 2 == 0 { a } else { b }).collect();
    registry.grant(client, granted.clone(), true);

    let successes = Arc::new(AtomicU64::new(0));
    let handles: Vec<_> = (0..THREADS)
        .map(|seed| {
            let registry = Arc::clone(&registry);
            let successes = Arc::clone(&successes);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed as u64);
                for _ in 0..ATTEMPTS_PER_THREAD {
                    let op = if rng.gen_bool(0.5) { a } else { b };
                    if registry.check_and_consume(client, op).is_ok() {
                        successes.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let progress = registry.sequence_progress(client).unwrap();
    assert_eq!(successes.load(Ordering::Relaxed), progress as u64);
    assert!(progress <= granted.len());
}

#[test]
fn test_concurrent_clients_do_not_interfere() {
    let registry = Arc::new(PermissionRegistry::new());
    let op = OperationId::from(7_u32);

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let client = ClientId::new([i as u8 + 1; 20]);
                registry.grant(client, vec![op; 10], false);
                let mut ok = 0;
                for _ in 0..20 {
                    if registry.check_and_consume(client, op).is_ok() {
                        ok += 1;
                    }
                }
                ok
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 10);
    }
    assert_eq!(registry.client_count(), THREADS);
}

#[test]
fn test_concurrent_grants_audit_matches_stored_grant() {
    let registry = Arc::new(PermissionRegistry::with_config(
        RegistryConfig::default().with_max_client_events(THREADS * ATTEMPTS_PER_THREAD),
    ));
    let client = ClientId::new([0x55; 20]);

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for n in 0..ATTEMPTS_PER_THREAD {
                    let op = OperationId::from((i * ATTEMPTS_PER_THREAD + n) as u32);
                    registry.grant(client, vec![op], i % 2 == 0);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let latest = registry.events().grants_for(client);
    assert_eq!(latest.len(), THREADS * ATTEMPTS_PER_THREAD);
    assert_eq!(
        latest[0].kind,
        EventKind::PermissionGranted {
            operations: registry.allowed_calls(client),
            sequence: registry.is_sequence(client),
        }
    );
}
