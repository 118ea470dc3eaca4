//! Least-frequently-used eviction policy with recency tiebreak.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        LfuCache<K, V>                            │
//! │                                                                  │
//! │   index: FxHashMap<K, NonNull<Node>>     buckets by frequency    │
//! │                                                                  │
//! │   freq 0: head ─► [E] ◄──► [D] ◄─ tail   ◄── min_freq            │
//! │   freq 2: head ─► [B] ◄─ tail                                    │
//! │   freq 5: head ─► [A] ◄──► [C] ◄─ tail                           │
//! │                                                                  │
//! │   get/add-existing: move node from bucket f to front of f+1      │
//! │   evict: tail of the lowest non-empty bucket (LRU within LFU)    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Minimum-frequency invariant
//!
//! `min_freq` always names the lowest non-empty bucket. It is recomputed
//! eagerly on every event that empties the bucket it points to (promotion
//! move-out, removal, eviction) — never lazily. A stale minimum would evict
//! from the wrong bucket or dereference an empty one.
//!
//! New entries start at frequency 0, which resets `min_freq` to 0.

use std::hash::Hash;
use std::ptr::NonNull;

use rustc_hash::FxHashMap;

use crate::traits::{EvictionCallback, EvictionPolicy};

struct Node<K, V> {
    prev: Option<NonNull<Node<K, V>>>,
    next: Option<NonNull<Node<K, V>>>,
    freq: u64,
    key: K,
    value: V,
}

/// One frequency bucket: a recency-ordered list (head = most recent).
struct Bucket<K, V> {
    head: Option<NonNull<Node<K, V>>>,
    tail: Option<NonNull<Node<K, V>>>,
    len: usize,
}

impl<K, V> Bucket<K, V> {
    fn empty() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }
}

/// LFU cache: entries bucketed by access frequency, each bucket ordered by
/// recency. Eviction removes the least-recent entry of the lowest non-empty
/// frequency bucket.
///
/// Capacity `0` disables eviction.
///
/// # Example
///
/// ```
/// use peercache::policy::lfu::LfuCache;
/// use peercache::traits::EvictionPolicy;
///
/// let mut cache = LfuCache::new(2, None);
/// cache.add("hot", 1);
/// cache.add("cold", 2);
/// cache.get(&"hot"); // frequency 1 vs 0
///
/// cache.add("new", 3); // evicts "cold" (lowest frequency)
/// assert!(cache.contains(&"hot"));
/// assert!(!cache.contains(&"cold"));
/// ```
pub struct LfuCache<K, V> {
    index: FxHashMap<K, NonNull<Node<K, V>>>,
    buckets: FxHashMap<u64, Bucket<K, V>>,
    min_freq: u64,
    capacity: usize,
    on_evict: Option<EvictionCallback<K, V>>,
}

// SAFETY: same ownership discipline as LruCache; pointers never escape.
unsafe impl<K: Send, V: Send> Send for LfuCache<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for LfuCache<K, V> {}

impl<K, V> LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an LFU cache holding at most `capacity` entries (0 = unbounded).
    pub fn new(capacity: usize, on_evict: Option<EvictionCallback<K, V>>) -> Self {
        Self {
            index: FxHashMap::default(),
            buckets: FxHashMap::default(),
            min_freq: 0,
            capacity,
            on_evict,
        }
    }

    /// Current access frequency of `key`, if resident.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.index.get(key).map(|ptr| unsafe { ptr.as_ref().freq })
    }

    /// Lowest non-empty frequency (0 when empty). Exposed for invariant checks.
    pub fn min_frequency(&self) -> u64 {
        self.min_freq
    }

    /// Unlinks `ptr` from its bucket. Returns `true` if that bucket is now
    /// empty (and has been dropped from the bucket map).
    fn detach(&mut self, ptr: NonNull<Node<K, V>>) -> bool {
        unsafe {
            let node = ptr.as_ref();
            let bucket = self
                .buckets
                .get_mut(&node.freq)
                .expect("node's bucket must exist");

            match node.prev {
                Some(mut p) => p.as_mut().next = node.next,
                None => bucket.head = node.next,
            }
            match node.next {
                Some(mut n) => n.as_mut().prev = node.prev,
                None => bucket.tail = node.prev,
            }
            bucket.len -= 1;

            if bucket.len == 0 {
                self.buckets.remove(&node.freq);
                true
            } else {
                false
            }
        }
    }

    /// Links `ptr` at the front (most recent end) of the bucket for its
    /// current `freq`, creating the bucket if absent.
    fn attach_front(&mut self, mut ptr: NonNull<Node<K, V>>) {
        unsafe {
            let freq = ptr.as_ref().freq;
            let bucket = self.buckets.entry(freq).or_insert_with(Bucket::empty);

            let node = ptr.as_mut();
            node.prev = None;
            node.next = bucket.head;
            match bucket.head {
                Some(mut h) => h.as_mut().prev = Some(ptr),
                None => bucket.tail = Some(ptr),
            }
            bucket.head = Some(ptr);
            bucket.len += 1;
        }
    }

    /// Moves `ptr` from bucket `f` to the front of bucket `f + 1`, advancing
    /// `min_freq` eagerly if the move emptied the minimum bucket.
    fn bump(&mut self, mut ptr: NonNull<Node<K, V>>) {
        let old_freq = unsafe { ptr.as_ref().freq };
        let emptied = self.detach(ptr);
        unsafe {
            ptr.as_mut().freq = old_freq + 1;
        }
        self.attach_front(ptr);

        if emptied && self.min_freq == old_freq {
            self.recompute_min();
        }
    }

    /// Eagerly recomputes `min_freq` as the lowest occupied bucket. The
    /// bucket map never holds empty buckets, so this scans live frequencies
    /// only.
    fn recompute_min(&mut self) {
        self.min_freq = self.buckets.keys().copied().min().unwrap_or(0);
    }

    /// Evicts the least-recent entry of the minimum-frequency bucket.
    fn evict_least_used(&mut self) {
        let victim = match self.buckets.get(&self.min_freq).and_then(|b| b.tail) {
            Some(ptr) => ptr,
            None => return,
        };
        let emptied = self.detach(victim);
        let node = unsafe { Box::from_raw(victim.as_ptr()) };
        self.index.remove(&node.key);
        if emptied {
            self.recompute_min();
        }
        if let Some(cb) = self.on_evict.as_mut() {
            cb(node.key, node.value);
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let mut total = 0;
        for (&freq, bucket) in &self.buckets {
            assert!(bucket.len > 0, "empty bucket retained in map");
            assert!(freq >= self.min_freq, "bucket below min_freq");
            let mut walked = 0;
            let mut current = bucket.head;
            let mut prev: Option<NonNull<Node<K, V>>> = None;
            while let Some(ptr) = current {
                unsafe {
                    assert_eq!(ptr.as_ref().freq, freq, "node in wrong bucket");
                    assert_eq!(ptr.as_ref().prev, prev, "back-link mismatch");
                    prev = Some(ptr);
                    current = ptr.as_ref().next;
                }
                walked += 1;
                assert!(walked <= bucket.len, "cycle detected");
            }
            assert_eq!(walked, bucket.len);
            assert_eq!(bucket.tail, prev);
            total += bucket.len;
        }
        assert_eq!(total, self.index.len(), "bucket/index length mismatch");
        if !self.buckets.is_empty() {
            assert!(
                self.buckets.contains_key(&self.min_freq),
                "min_freq points at an empty bucket"
            );
        }
        if self.capacity != 0 {
            assert!(self.index.len() <= self.capacity, "capacity exceeded");
        }
    }
}

impl<K, V> EvictionPolicy<K, V> for LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        let ptr = *self.index.get(key)?;
        self.bump(ptr);
        unsafe { Some(&ptr.as_ref().value) }
    }

    fn add(&mut self, key: K, value: V) {
        if let Some(&ptr) = self.index.get(&key) {
            unsafe {
                let mut ptr = ptr;
                ptr.as_mut().value = value;
            }
            self.bump(ptr);
            return;
        }

        let node = Box::new(Node {
            prev: None,
            next: None,
            freq: 0,
            key: key.clone(),
            value,
        });
        let ptr = unsafe { NonNull::new_unchecked(Box::into_raw(node)) };
        self.index.insert(key, ptr);
        self.attach_front(ptr);
        self.min_freq = 0;

        if self.capacity != 0 && self.index.len() > self.capacity {
            self.evict_least_used();
        }
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.index
            .get(key)
            .map(|ptr| unsafe { &ptr.as_ref().value })
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let ptr = self.index.remove(key)?;
        let freq = unsafe { ptr.as_ref().freq };
        let emptied = self.detach(ptr);
        if emptied && self.min_freq == freq {
            self.recompute_min();
        }
        let node = unsafe { Box::from_raw(ptr.as_ptr()) };
        Some(node.value)
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        for bucket in self.buckets.values() {
            let mut current = bucket.head;
            while let Some(ptr) = current {
                unsafe {
                    current = ptr.as_ref().next;
                    drop(Box::from_raw(ptr.as_ptr()));
                }
            }
        }
        self.buckets.clear();
        self.index.clear();
        self.min_freq = 0;
    }
}

impl<K, V> Drop for LfuCache<K, V> {
    fn drop(&mut self) {
        for bucket in self.buckets.values() {
            let mut current = bucket.head;
            while let Some(ptr) = current {
                unsafe {
                    current = ptr.as_ref().next;
                    drop(Box::from_raw(ptr.as_ptr()));
                }
            }
        }
    }
}

impl<K, V> std::fmt::Debug for LfuCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LfuCache")
            .field("len", &self.index.len())
            .field("capacity", &self.capacity)
            .field("min_freq", &self.min_freq)
            .finish()
    }
}
