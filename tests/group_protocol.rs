// ==============================================
// GROUP READ PROTOCOL TESTS (integration)
// ==============================================
//
// Full read path through registry and group: local hit, remote hit, origin
// fallback, and the error surface a transport front end sees.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use peercache::policy::PolicyKind;
use peercache::registry::{destroy_group, get_group, new_group, serve};
use peercache::traits::{Fetcher, Getter, Picker, SourceError};
use peercache::CacheError;

/// Origin backed by a fixed score table, counting loads per key.
struct ScoreDb {
    loads: AtomicUsize,
}

impl ScoreDb {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            loads: AtomicUsize::new(0),
        })
    }

    fn getter(self: &Arc<Self>) -> Box<dyn Getter> {
        let db = Arc::clone(self);
        Box::new(move |key: &str| -> Result<Vec<u8>, SourceError> {
            db.loads.fetch_add(1, Ordering::SeqCst);
            match key {
                "Tom" => Ok(b"630".to_vec()),
                "Jack" => Ok(b"589".to_vec()),
                "Sam" => Ok(b"567".to_vec()),
                _ => Err(format!("{key} does not exist").into()),
            }
        })
    }
}

// ==============================================
// Origin Path
// ==============================================

#[test]
fn first_read_populates_then_serves_from_cache() {
    let db = ScoreDb::new();
    let group = new_group("protocol-origin", 16, PolicyKind::Lru, db.getter());

    for _ in 0..3 {
        assert_eq!(group.get("Tom").unwrap().as_slice(), b"630");
    }
    assert_eq!(db.loads.load(Ordering::SeqCst), 1, "one origin load only");
    assert_eq!(group.cache_len(), 1);

    // A second key loads independently.
    assert_eq!(group.get("Sam").unwrap().as_slice(), b"567");
    assert_eq!(db.loads.load(Ordering::SeqCst), 2);
    destroy_group("protocol-origin");
}

#[test]
fn origin_failure_is_reported_and_not_cached() {
    let db = ScoreDb::new();
    let group = new_group("protocol-fail", 16, PolicyKind::Lru, db.getter());

    for _ in 0..2 {
        let err = group.get("Unknown").unwrap_err();
        assert!(matches!(err, CacheError::OriginUnavailable(_)));
        assert!(err.to_string().contains("Unknown does not exist"));
    }
    assert_eq!(
        db.loads.load(Ordering::SeqCst),
        2,
        "failures are not negative-cached"
    );
    assert_eq!(group.cache_len(), 0);
    destroy_group("protocol-fail");
}

#[test]
fn empty_key_is_rejected_before_any_load() {
    let db = ScoreDb::new();
    let group = new_group("protocol-empty", 16, PolicyKind::Lru, db.getter());

    assert!(matches!(group.get(""), Err(CacheError::InvalidKey)));
    assert_eq!(db.loads.load(Ordering::SeqCst), 0);
    destroy_group("protocol-empty");
}

// ==============================================
// Remote Path
// ==============================================

struct PeerAnswer {
    calls: AtomicUsize,
}

impl Fetcher for PeerAnswer {
    fn fetch(&self, group: &str, key: &str) -> Result<Vec<u8>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{group}/{key}@peer").into_bytes())
    }
}

/// Routes keys with a "remote/" prefix to the peer, everything else local.
struct PrefixPicker {
    peer: Arc<PeerAnswer>,
}

impl Picker for PrefixPicker {
    fn pick(&self, key: &str) -> Option<Arc<dyn Fetcher>> {
        key.starts_with("remote/")
            .then(|| Arc::clone(&self.peer) as Arc<dyn Fetcher>)
    }
}

#[test]
fn remote_owner_serves_without_local_populate() {
    let db = ScoreDb::new();
    let group = new_group("protocol-remote", 16, PolicyKind::Lru, db.getter());
    let peer = Arc::new(PeerAnswer {
        calls: AtomicUsize::new(0),
    });
    group
        .register_picker(Box::new(PrefixPicker {
            peer: Arc::clone(&peer),
        }))
        .unwrap();

    let value = group.get("remote/alpha").unwrap();
    assert_eq!(value.as_slice(), b"protocol-remote/remote/alpha@peer");
    assert_eq!(db.loads.load(Ordering::SeqCst), 0, "origin untouched");
    assert_eq!(group.cache_len(), 0, "remote hits are not cached locally");

    // Every read of a remote key goes back to the owner.
    group.get("remote/alpha").unwrap();
    assert_eq!(peer.calls.load(Ordering::SeqCst), 2);

    // Locally owned keys still use the origin and populate.
    assert_eq!(group.get("Tom").unwrap().as_slice(), b"630");
    assert_eq!(group.cache_len(), 1);
    destroy_group("protocol-remote");
}

#[test]
fn picker_binds_exactly_once() {
    let db = ScoreDb::new();
    let group = new_group("protocol-picker", 16, PolicyKind::Lru, db.getter());
    let peer = Arc::new(PeerAnswer {
        calls: AtomicUsize::new(0),
    });

    group
        .register_picker(Box::new(PrefixPicker {
            peer: Arc::clone(&peer),
        }))
        .unwrap();
    let err = group
        .register_picker(Box::new(PrefixPicker { peer }))
        .unwrap_err();
    assert!(err.is_precondition());
    destroy_group("protocol-picker");
}

// ==============================================
// Registry Surface
// ==============================================

#[test]
fn serve_maps_group_and_key_errors() {
    let db = ScoreDb::new();
    new_group("protocol-serve", 16, PolicyKind::Arc, db.getter());

    assert_eq!(serve("protocol-serve", "Jack").unwrap().as_slice(), b"589");
    assert!(matches!(
        serve("protocol-serve", ""),
        Err(CacheError::InvalidKey)
    ));
    assert!(matches!(
        serve("no-such-namespace", "Jack"),
        Err(CacheError::GroupNotFound(name)) if name == "no-such-namespace"
    ));

    destroy_group("protocol-serve");
    assert!(get_group("protocol-serve").is_none());
}

#[test]
fn destroy_shuts_down_the_picker() {
    struct TrackingPicker {
        shutdowns: Arc<AtomicUsize>,
    }
    impl Picker for TrackingPicker {
        fn pick(&self, _key: &str) -> Option<Arc<dyn Fetcher>> {
            None
        }
        fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    let db = ScoreDb::new();
    let group = new_group("protocol-destroy", 16, PolicyKind::Lru, db.getter());
    let shutdowns = Arc::new(AtomicUsize::new(0));
    group
        .register_picker(Box::new(TrackingPicker {
            shutdowns: Arc::clone(&shutdowns),
        }))
        .unwrap();

    destroy_group("protocol-destroy");
    assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
}
