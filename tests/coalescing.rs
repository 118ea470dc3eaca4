// ==============================================
// REQUEST COALESCING TESTS (integration)
// ==============================================
//
// Concurrent misses on one key must collapse into a single load, both at the
// Flight layer and end to end through a Group.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

use peercache::flight::Flight;
use peercache::policy::PolicyKind;
use peercache::registry::{destroy_group, new_group};
use peercache::traits::SourceError;

// ==============================================
// Flight Layer
// ==============================================

#[test]
fn many_threads_one_execution() {
    const THREADS: usize = 16;

    let flight: Arc<Flight<Vec<u8>>> = Arc::new(Flight::new());
    let executions = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let flight = Arc::clone(&flight);
            let executions = Arc::clone(&executions);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                flight.do_call("hot-key", || {
                    executions.fetch_add(1, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(80));
                    Ok(b"payload".to_vec())
                })
            })
        })
        .collect();

    for handle in handles {
        let value = handle.join().unwrap().expect("coalesced load succeeds");
        assert_eq!(value, b"payload");
    }
    assert_eq!(
        executions.load(Ordering::SeqCst),
        1,
        "all concurrent missers must share one load"
    );
    assert_eq!(flight.inflight_len(), 0, "record removed after completion");
}

#[test]
fn coalesced_error_reaches_every_waiter() {
    const THREADS: usize = 8;

    let flight: Arc<Flight<Vec<u8>>> = Arc::new(Flight::new());
    let executions = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let flight = Arc::clone(&flight);
            let executions = Arc::clone(&executions);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                flight.do_call("doomed", || {
                    executions.fetch_add(1, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(40));
                    Err(peercache::CacheError::OriginUnavailable(
                        "backend down".into(),
                    ))
                })
            })
        })
        .collect();

    for handle in handles {
        let err = handle.join().unwrap().expect_err("load must fail");
        assert!(err.to_string().contains("backend down"));
    }
    assert_eq!(executions.load(Ordering::SeqCst), 1);
}

// ==============================================
// End To End Through A Group
// ==============================================

#[test]
fn concurrent_group_gets_hit_origin_once() {
    const THREADS: usize = 12;

    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let group = new_group(
        "coalescing-e2e",
        32,
        PolicyKind::Lru,
        Box::new(move |key: &str| -> Result<Vec<u8>, SourceError> {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(60));
            Ok(format!("value-{key}").into_bytes())
        }),
    );

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let group = Arc::clone(&group);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                group.get("shared")
            })
        })
        .collect();

    for handle in handles {
        let value = handle.join().unwrap().expect("get succeeds");
        assert_eq!(value.as_slice(), b"value-shared");
    }
    assert_eq!(
        loads.load(Ordering::SeqCst),
        1,
        "origin must be consulted exactly once for a hot key"
    );
    destroy_group("coalescing-e2e");
}

#[test]
fn distinct_keys_load_independently() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let group = new_group(
        "coalescing-distinct",
        32,
        PolicyKind::Lru,
        Box::new(move |key: &str| -> Result<Vec<u8>, SourceError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(key.as_bytes().to_vec())
        }),
    );

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let group = Arc::clone(&group);
            std::thread::spawn(move || group.get(&format!("key-{i}")))
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().expect("get succeeds");
    }
    assert_eq!(loads.load(Ordering::SeqCst), 6);
    destroy_group("coalescing-distinct");
}
