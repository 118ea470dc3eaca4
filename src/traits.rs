//! Capability traits for the cache-coordination stack.
//!
//! Two families live here:
//!
//! 1. **Eviction engine contract** — [`EvictionPolicy`] is the single
//!    interface the coordinator sees. LRU, LFU, and ARC all satisfy it; the
//!    policy is selected once at construction
//!    (see [`PolicyKind`](crate::policy::PolicyKind)) and never re-selected.
//!
//! 2. **External collaborators** — [`Getter`] (origin data source),
//!    [`Fetcher`] (remote peer lookup), and [`Picker`] (key → peer routing)
//!    are the seams where transport, discovery, and storage plug in. The core
//!    never sees a socket.
//!
//! ```text
//!                    ┌──────────────────────────────────┐
//!                    │        EvictionPolicy<K, V>      │
//!                    │                                  │
//!                    │  get(&mut, &K) → Option<&V>      │
//!                    │  add(&mut, K, V)                 │
//!                    │  peek / contains / remove        │
//!                    │  len / capacity / clear          │
//!                    └───────┬──────────┬──────────┬────┘
//!                            │          │          │
//!                         LruCache   LfuCache   ArcCache
//!
//!   Group ──pick(key)──► Picker ──Some──► Fetcher ──fetch──► remote peer
//!     │                     │
//!     │                   None ("this node owns the key")
//!     └────get(key)───► Getter ─────────────────────────► origin
//! ```

/// Boxed error produced by external collaborators (origin stores, RPC
/// clients). The core never inspects it beyond its message.
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Callback invoked synchronously with the evicted `(key, value)` whenever a
/// policy drops an entry under capacity pressure.
pub type EvictionCallback<K, V> = Box<dyn FnMut(K, V) + Send + Sync>;

/// Contract every eviction engine satisfies.
///
/// A capacity of `0` means unbounded: `add` never evicts. After any completed
/// `add` on a bounded engine, `len() <= capacity()` holds.
///
/// Engines are single-threaded by design; the coordinator wraps them in a
/// read/write lock (order-updating `get`/`add` take the write side, `peek`
/// and `len` the read side).
///
/// # Example
///
/// ```
/// use peercache::policy::lru::LruCache;
/// use peercache::traits::EvictionPolicy;
///
/// let mut cache: LruCache<String, u64> = LruCache::new(2, None);
/// cache.add("a".into(), 1);
/// cache.add("b".into(), 2);
/// cache.add("c".into(), 3); // evicts "a"
///
/// assert_eq!(cache.len(), 2);
/// assert!(!cache.contains(&"a".into()));
/// assert_eq!(cache.get(&"c".into()), Some(&3));
/// ```
pub trait EvictionPolicy<K, V> {
    /// Looks up `key`, updating the policy's access metadata on a hit
    /// (recency order, frequency count, or tier membership).
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Inserts a new entry or replaces the value of an existing one,
    /// bumping its metadata. Evicts per policy if capacity is exceeded.
    fn add(&mut self, key: K, value: V);

    /// Looks up `key` without touching any access metadata.
    fn peek(&self, key: &K) -> Option<&V>;

    /// Returns `true` if `key` is resident (ghost entries do not count).
    fn contains(&self, key: &K) -> bool;

    /// Removes `key`, returning its value. No eviction callback fires.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Number of live entries (for ARC: `|T1| + |T2|`, ghosts excluded).
    fn len(&self) -> usize;

    /// Returns `true` if no entries are resident.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity; `0` means unbounded.
    fn capacity(&self) -> usize;

    /// Drops every entry and resets policy state. No callbacks fire.
    fn clear(&mut self);
}

/// Origin data source, consulted only on a full cache miss.
///
/// Supplied once at group creation and immutable thereafter. Must be safe
/// for concurrent invocation: the coalescer may run loads for distinct keys
/// in parallel.
///
/// Closures implement `Getter` directly:
///
/// ```
/// use peercache::traits::{Getter, SourceError};
///
/// let getter = |key: &str| -> Result<Vec<u8>, SourceError> {
///     Ok(format!("value-for-{key}").into_bytes())
/// };
/// assert_eq!(getter.get("a").unwrap(), b"value-for-a");
/// ```
pub trait Getter: Send + Sync {
    /// Fetches the value for `key` from the backing source.
    fn get(&self, key: &str) -> std::result::Result<Vec<u8>, SourceError>;
}

impl<F> Getter for F
where
    F: Fn(&str) -> std::result::Result<Vec<u8>, SourceError> + Send + Sync,
{
    fn get(&self, key: &str) -> std::result::Result<Vec<u8>, SourceError> {
        self(key)
    }
}

/// Capability to pull a value from one remote peer.
///
/// Implemented over an RPC client by the transport layer. Any error,
/// transport failures and deadline expiries alike, is treated by the core as
/// "remote unavailable, fall back to the origin". Implementations own their
/// timeout policy (the reference transport uses a 10 second deadline).
pub trait Fetcher: Send + Sync {
    /// Fetches `key` from the peer, scoped to the named group.
    fn fetch(&self, group: &str, key: &str) -> std::result::Result<Vec<u8>, SourceError>;
}

/// Capability to resolve a key to the peer that owns it.
///
/// A group holds at most one picker, bound once via
/// [`Group::register_picker`](crate::group::Group::register_picker). The
/// picker is owned exclusively by its group; implementations must not
/// reference the group back.
pub trait Picker: Send + Sync {
    /// Resolves `key` to the owning peer's fetcher.
    ///
    /// Returns `None` when this node owns the key (use the local path).
    fn pick(&self, key: &str) -> Option<std::sync::Arc<dyn Fetcher>>;

    /// Releases network-facing peer resources. Called by
    /// [`destroy_group`](crate::registry::destroy_group) before the group is
    /// unregistered. Default is a no-op.
    fn shutdown(&self) {}
}
