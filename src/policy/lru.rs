//! Least-recently-used eviction policy.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                       LruCache<K, V>                          │
//! │                                                               │
//! │   index: FxHashMap<K, NonNull<Node>>                          │
//! │   ┌─────────┬─────────┐      head ─► [C] ◄──► [B] ◄──► [A]    │
//! │   │  key A  │  ptr_a  │             MRU              LRU      │
//! │   │  key B  │  ptr_b  │                                       │
//! │   │  key C  │  ptr_c  │      get(B): detach B, attach front   │
//! │   └─────────┴─────────┘      overflow: evict tail (A)         │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Operation | Time | Notes |
//! |-----------|------|-------|
//! | `get`     | O(1) | hit promotes to MRU |
//! | `add`     | O(1) amortized | may evict the LRU tail |
//! | `remove`  | O(1) | no callback |
//!
//! Not thread-safe; the group coordinator wraps the engine in a read/write
//! lock.

use std::hash::Hash;
use std::ptr::NonNull;

use rustc_hash::FxHashMap;

use crate::traits::{EvictionCallback, EvictionPolicy};

struct Node<K, V> {
    prev: Option<NonNull<Node<K, V>>>,
    next: Option<NonNull<Node<K, V>>>,
    key: K,
    value: V,
}

/// LRU cache: doubly linked recency order plus a key→node index.
///
/// Capacity `0` disables eviction. The optional eviction callback is invoked
/// synchronously with the evicted `(key, value)` when an `add` pushes the
/// cache over capacity.
///
/// # Example
///
/// ```
/// use peercache::policy::lru::LruCache;
/// use peercache::traits::EvictionPolicy;
///
/// let mut cache = LruCache::new(2, None);
/// cache.add("a", 1);
/// cache.add("b", 2);
/// cache.get(&"a");     // "a" is now MRU
/// cache.add("c", 3);   // evicts "b", the least recently touched
///
/// assert!(cache.contains(&"a"));
/// assert!(!cache.contains(&"b"));
/// ```
pub struct LruCache<K, V> {
    index: FxHashMap<K, NonNull<Node<K, V>>>,
    head: Option<NonNull<Node<K, V>>>,
    tail: Option<NonNull<Node<K, V>>>,
    capacity: usize,
    on_evict: Option<EvictionCallback<K, V>>,
}

// SAFETY: node pointers are never shared outside the struct; &self methods
// only read. Thread-safety reduces to K, V, and the callback (already
// Send + Sync by construction).
unsafe impl<K: Send, V: Send> Send for LruCache<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for LruCache<K, V> {}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an LRU cache holding at most `capacity` entries (0 = unbounded).
    pub fn new(capacity: usize, on_evict: Option<EvictionCallback<K, V>>) -> Self {
        Self {
            index: FxHashMap::default(),
            head: None,
            tail: None,
            capacity,
            on_evict,
        }
    }

    fn detach(&mut self, ptr: NonNull<Node<K, V>>) {
        unsafe {
            let node = ptr.as_ref();
            match node.prev {
                Some(mut p) => p.as_mut().next = node.next,
                None => self.head = node.next,
            }
            match node.next {
                Some(mut n) => n.as_mut().prev = node.prev,
                None => self.tail = node.prev,
            }
        }
    }

    fn attach_front(&mut self, mut ptr: NonNull<Node<K, V>>) {
        unsafe {
            let node = ptr.as_mut();
            node.prev = None;
            node.next = self.head;
            match self.head {
                Some(mut h) => h.as_mut().prev = Some(ptr),
                None => self.tail = Some(ptr),
            }
            self.head = Some(ptr);
        }
    }

    /// Evicts the least-recently-used entry, firing the callback.
    fn evict_oldest(&mut self) {
        if let Some(ptr) = self.tail {
            self.detach(ptr);
            let node = unsafe { Box::from_raw(ptr.as_ptr()) };
            self.index.remove(&node.key);
            if let Some(cb) = self.on_evict.as_mut() {
                cb(node.key, node.value);
            }
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let mut walked = 0;
        let mut current = self.head;
        let mut prev: Option<NonNull<Node<K, V>>> = None;
        while let Some(ptr) = current {
            unsafe {
                assert_eq!(ptr.as_ref().prev, prev, "back-link mismatch");
                assert!(self.index.contains_key(&ptr.as_ref().key));
                prev = Some(ptr);
                current = ptr.as_ref().next;
            }
            walked += 1;
            assert!(walked <= self.index.len(), "cycle detected");
        }
        assert_eq!(walked, self.index.len());
        assert_eq!(self.tail, prev);
        if self.capacity != 0 {
            assert!(self.index.len() <= self.capacity, "capacity exceeded");
        }
    }
}

impl<K, V> EvictionPolicy<K, V> for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        let ptr = *self.index.get(key)?;
        self.detach(ptr);
        self.attach_front(ptr);
        unsafe { Some(&ptr.as_ref().value) }
    }

    fn add(&mut self, key: K, value: V) {
        if let Some(&ptr) = self.index.get(&key) {
            unsafe {
                let mut ptr = ptr;
                ptr.as_mut().value = value;
            }
            self.detach(ptr);
            self.attach_front(ptr);
            return;
        }

        let node = Box::new(Node {
            prev: None,
            next: None,
            key: key.clone(),
            value,
        });
        let ptr = unsafe { NonNull::new_unchecked(Box::into_raw(node)) };
        self.index.insert(key, ptr);
        self.attach_front(ptr);

        if self.capacity != 0 && self.index.len() > self.capacity {
            self.evict_oldest();
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
        self.detach(ptr);
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
        let mut current = self.head;
        while let Some(ptr) = current {
            unsafe {
                current = ptr.as_ref().next;
                drop(Box::from_raw(ptr.as_ptr()));
            }
        }
        self.head = None;
        self.tail = None;
        self.index.clear();
    }
}

impl<K, V> Drop for LruCache<K, V> {
    fn drop(&mut self) {
        let mut current = self.head;
        while let Some(ptr) = current {
            unsafe {
                current = ptr.as_ref().next;
                drop(Box::from_raw(ptr.as_ptr()));
            }
        }
    }
}

impl<K, V> std::fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.index.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
