//! Group coordinator: namespace, local cache, and the miss protocol.
//!
//! A group ties one namespace to one origin [`Getter`], one eviction engine,
//! and at most one [`Picker`]. Every read funnels through [`Group::get`]:
//!
//! ```text
//!   get(key)
//!     │
//!     ├─ "" ────────────────────────────────► Err(InvalidKey)
//!     │
//!     ├─ local hit ─────────────────────────► ByteView (bumps policy order)
//!     │
//!     └─ miss ──► coalesced load(key)
//!                   │
//!                   ├─ picker bound, peer owns key
//!                   │     ├─ fetch ok ──────► ByteView (NOT cached locally)
//!                   │     └─ fetch err ─────► logged, fall through
//!                   │
//!                   └─ origin getter
//!                         ├─ ok ────────────► populate local cache, ByteView
//!                         └─ err ───────────► Err(OriginUnavailable)
//! ```
//!
//! Remote hits are deliberately not cached here: the owning peer caches the
//! value, and caching it on every reader would multiply residency across the
//! cluster.

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::byteview::ByteView;
use crate::error::{CacheError, Result};
use crate::flight::Flight;
use crate::policy::PolicyKind;
use crate::traits::{EvictionPolicy, Getter, Picker};

/// Policy-backed byte cache behind a read/write lock.
///
/// `get` and `add` mutate access order and take the write side; `peek` and
/// `len` take the read side.
struct MainCache {
    engine: RwLock<Box<dyn EvictionPolicy<String, ByteView> + Send + Sync>>,
}

impl MainCache {
    fn new(capacity: usize, kind: PolicyKind) -> Self {
        Self {
            engine: RwLock::new(kind.build(capacity, None)),
        }
    }

    fn get(&self, key: &str) -> Option<ByteView> {
        self.engine.write().get(&key.to_owned()).cloned()
    }

    fn add(&self, key: String, value: ByteView) {
        self.engine.write().add(key, value);
    }

    fn peek(&self, key: &str) -> Option<ByteView> {
        self.engine.read().peek(&key.to_owned()).cloned()
    }

    fn len(&self) -> usize {
        self.engine.read().len()
    }
}

/// A named cache namespace with its origin loader and optional peer routing.
///
/// Groups are created through [`registry::new_group`](crate::registry::new_group)
/// and shared as `Arc<Group>`; all methods take `&self`.
pub struct Group {
    name: String,
    getter: Box<dyn Getter>,
    cache: MainCache,
    picker: OnceCell<Box<dyn Picker>>,
    flight: Flight<ByteView>,
}

impl Group {
    pub(crate) fn new(
        name: impl Into<String>,
        capacity: usize,
        kind: PolicyKind,
        getter: Box<dyn Getter>,
    ) -> Self {
        Self {
            name: name.into(),
            getter,
            cache: MainCache::new(capacity, kind),
            picker: OnceCell::new(),
            flight: Flight::new(),
        }
    }

    /// The namespace this group serves.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of values resident in the local cache.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Looks up `key` without updating the eviction policy's access order.
    pub fn peek(&self, key: &str) -> Option<ByteView> {
        self.cache.peek(key)
    }

    /// Binds the picker that routes keys to peers. At most one may ever be
    /// bound; a second call fails and leaves the first in place.
    pub fn register_picker(&self, picker: Box<dyn Picker>) -> Result<()> {
        self.picker
            .set(picker)
            .map_err(|_| CacheError::Precondition("picker already registered for group"))
    }

    /// Reads `key`: local cache first, then the coalesced load path.
    ///
    /// The empty key is rejected before any cache or network activity.
    pub fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey);
        }

        if let Some(value) = self.cache.get(key) {
            debug!(group = %self.name, key, "cache hit");
            return Ok(value);
        }

        debug!(group = %self.name, key, "cache miss, loading");
        self.load(key)
    }

    /// Miss path: at most one load per key runs at a time; concurrent missers
    /// block and share the leader's result.
    fn load(&self, key: &str) -> Result<ByteView> {
        self.flight.do_call(key, || {
            // A coalesced waiter may race a populate from an earlier leader.
            if let Some(value) = self.cache.get(key) {
                return Ok(value);
            }

            if let Some(picker) = self.picker.get() {
                if let Some(fetcher) = picker.pick(key) {
                    match fetcher.fetch(&self.name, key) {
                        Ok(bytes) => {
                            debug!(group = %self.name, key, "loaded from peer");
                            return Ok(ByteView::from(bytes));
                        }
                        Err(err) => {
                            // Peer failure degrades to the origin, never to
                            // the caller.
                            let err = CacheError::RemoteUnavailable(err.to_string());
                            warn!(
                                group = %self.name,
                                key,
                                error = %err,
                                "peer fetch failed, falling back to origin"
                            );
                        }
                    }
                }
            }

            self.load_locally(key)
        })
    }

    /// Loads from the origin getter and populates the local cache.
    fn load_locally(&self, key: &str) -> Result<ByteView> {
        let bytes = self.getter.get(key).map_err(|err| {
            warn!(group = %self.name, key, error = %err, "origin load failed");
            CacheError::OriginUnavailable(err.to_string())
        })?;
        let value = ByteView::from(bytes);
        self.cache.add(key.to_owned(), value.clone());
        debug!(group = %self.name, key, "loaded from origin and cached");
        Ok(value)
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("cache_len", &self.cache.len())
            .field("picker_bound", &self.picker.get().is_some())
            .finish()
    }
}

impl Group {
    /// Releases peer resources ahead of unregistration.
    pub(crate) fn shutdown(&self) {
        if let Some(picker) = self.picker.get() {
            picker.shutdown();
        }
    }
}
