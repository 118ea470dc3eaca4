//! Adaptive Replacement Cache (ARC) eviction policy.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                         ArcCache<K, V>                             │
//! │                                                                    │
//! │   T1 (seen once, recency)          T2 (seen repeatedly, frequency) │
//! │   head ─► [...] ◄─ tail            head ─► [...] ◄─ tail           │
//! │    MRU          evict→B1            MRU          evict→B2          │
//! │                                                                    │
//! │   B1 ghost keys (no values)        B2 ghost keys (no values)       │
//! │                                                                    │
//! │   p ∈ [0, capacity]: target size for T1                            │
//! │   • hit in B1 → T1 was undersized → p grows                        │
//! │   • hit in B2 → T2 was undersized → p shrinks                      │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The replace rule is the adaptive core: when room is needed, evict the LRU
//! end of T1 into B1 if `|T1| > 0` and (`|T1| > p` or the trigger was a B2
//! ghost hit); otherwise evict the LRU end of T2 into B2. Ghost hits steer
//! `p`, continuously rebalancing capacity between recency and frequency.
//!
//! The ghost-ratio delta is `max(1, |other ghost| / |hit ghost|)`, with an
//! empty denominator treated as ratio 1 so the adjustment never divides by
//! zero.
//!
//! ## References
//!
//! - Megiddo & Modha, "ARC: A Self-Tuning, Low Overhead Replacement Cache",
//!   FAST 2003

use std::hash::Hash;
use std::ptr::NonNull;

use rustc_hash::FxHashMap;

use crate::ds::GhostList;
use crate::traits::{EvictionCallback, EvictionPolicy};

/// Which real segment an entry resides in.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Segment {
    T1,
    T2,
}

struct Node<K, V> {
    prev: Option<NonNull<Node<K, V>>>,
    next: Option<NonNull<Node<K, V>>>,
    segment: Segment,
    key: K,
    value: V,
}

/// ARC cache: two real segments (T1 recency, T2 frequency) bounded together
/// by `capacity`, plus two ghost segments (B1, B2) remembering evicted keys
/// to steer the adaptive partition target `p`.
///
/// `len()` counts `|T1| + |T2|` only; ghosts hold no values and are invisible
/// to the [`EvictionPolicy`] contract. Capacity `0` disables eviction and
/// ghost tracking entirely.
///
/// # Example
///
/// ```
/// use peercache::policy::arc::ArcCache;
/// use peercache::traits::EvictionPolicy;
///
/// let mut cache = ArcCache::new(100, None);
/// cache.add("page", "content");     // enters T1
/// cache.get(&"page");               // repeat interest: promoted to T2
///
/// assert_eq!(cache.len(), 1);
/// assert_eq!(cache.t2_len(), 1);
/// ```
pub struct ArcCache<K, V> {
    index: FxHashMap<K, NonNull<Node<K, V>>>,

    t1_head: Option<NonNull<Node<K, V>>>,
    t1_tail: Option<NonNull<Node<K, V>>>,
    t1_len: usize,

    t2_head: Option<NonNull<Node<K, V>>>,
    t2_tail: Option<NonNull<Node<K, V>>>,
    t2_len: usize,

    b1: GhostList<K>,
    b2: GhostList<K>,

    /// Adaptive target size for T1, always within `[0, capacity]`.
    p: usize,
    capacity: usize,
    on_evict: Option<EvictionCallback<K, V>>,
}

// SAFETY: same ownership discipline as LruCache; pointers never escape.
unsafe impl<K: Send, V: Send> Send for ArcCache<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for ArcCache<K, V> {}

/// Ghost adaptation step: `max(1, other / hit)`, empty hit list counts as 1.
fn ghost_delta(other: usize, hit: usize) -> usize {
    if hit == 0 {
        1
    } else {
        (other / hit).max(1)
    }
}

impl<K, V> ArcCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an ARC cache bounding `|T1| + |T2|` at `capacity`
    /// (0 = unbounded). `p` starts at 0: a cold cache favors pure recency
    /// until ghost hits prove otherwise.
    pub fn new(capacity: usize, on_evict: Option<EvictionCallback<K, V>>) -> Self {
        Self {
            index: FxHashMap::default(),
            t1_head: None,
            t1_tail: None,
            t1_len: 0,
            t2_head: None,
            t2_tail: None,
            t2_len: 0,
            b1: GhostList::new(),
            b2: GhostList::new(),
            p: 0,
            capacity,
            on_evict,
        }
    }

    /// Current adaptive partition target for T1.
    pub fn p_value(&self) -> usize {
        self.p
    }

    /// Entries in T1 (seen exactly once).
    pub fn t1_len(&self) -> usize {
        self.t1_len
    }

    /// Entries in T2 (seen more than once).
    pub fn t2_len(&self) -> usize {
        self.t2_len
    }

    /// Keys remembered in ghost B1 (evicted from T1).
    pub fn b1_len(&self) -> usize {
        self.b1.len()
    }

    /// Keys remembered in ghost B2 (evicted from T2).
    pub fn b2_len(&self) -> usize {
        self.b2.len()
    }

    fn detach(&mut self, ptr: NonNull<Node<K, V>>) {
        unsafe {
            let node = ptr.as_ref();
            let (head, tail, len) = match node.segment {
                Segment::T1 => (&mut self.t1_head, &mut self.t1_tail, &mut self.t1_len),
                Segment::T2 => (&mut self.t2_head, &mut self.t2_tail, &mut self.t2_len),
            };
            match node.prev {
                Some(mut p) => p.as_mut().next = node.next,
                None => *head = node.next,
            }
            match node.next {
                Some(mut n) => n.as_mut().prev = node.prev,
                None => *tail = node.prev,
            }
            *len -= 1;
        }
    }

    fn attach_head(&mut self, mut ptr: NonNull<Node<K, V>>, segment: Segment) {
        unsafe {
            let node = ptr.as_mut();
            node.prev = None;
            node.segment = segment;
            let (head, tail, len) = match segment {
                Segment::T1 => (&mut self.t1_head, &mut self.t1_tail, &mut self.t1_len),
                Segment::T2 => (&mut self.t2_head, &mut self.t2_tail, &mut self.t2_len),
            };
            node.next = *head;
            match *head {
                Some(mut h) => h.as_mut().prev = Some(ptr),
                None => *tail = Some(ptr),
            }
            *head = Some(ptr);
            *len += 1;
        }
    }

    fn insert_node(&mut self, key: K, value: V, segment: Segment) {
        let node = Box::new(Node {
            prev: None,
            next: None,
            segment,
            key: key.clone(),
            value,
        });
        let ptr = unsafe { NonNull::new_unchecked(Box::into_raw(node)) };
        self.index.insert(key, ptr);
        self.attach_head(ptr, segment);
    }

    /// Evicts one entry to make room, choosing the segment adaptively.
    ///
    /// `from_b2_hit` marks that the triggering add was a B2 ghost hit, which
    /// biases the choice toward evicting from T1.
    fn replace(&mut self, from_b2_hit: bool) {
        let from_t1 = if self.t1_len > 0 && (self.t1_len > self.p || from_b2_hit) {
            true
        } else if self.t2_len > 0 {
            false
        } else {
            self.t1_len > 0
        };

        let victim = if from_t1 { self.t1_tail } else { self.t2_tail };
        let ptr = match victim {
            Some(ptr) => ptr,
            None => return,
        };

        self.detach(ptr);
        let node = unsafe { Box::from_raw(ptr.as_ptr()) };
        self.index.remove(&node.key);
        if from_t1 {
            self.b1.record(node.key.clone());
        } else {
            self.b2.record(node.key.clone());
        }
        if let Some(cb) = self.on_evict.as_mut() {
            cb(node.key, node.value);
        }
    }

    fn is_full(&self) -> bool {
        self.capacity != 0 && self.t1_len + self.t2_len >= self.capacity
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.index.len(), self.t1_len + self.t2_len);
        if self.capacity != 0 {
            assert!(self.t1_len + self.t2_len <= self.capacity, "over capacity");
            assert!(self.p <= self.capacity, "p out of range");
        }
        let mut walked = 0;
        for (start, segment, expect_len) in [
            (self.t1_head, Segment::T1, self.t1_len),
            (self.t2_head, Segment::T2, self.t2_len),
        ] {
            let mut count = 0;
            let mut current = start;
            while let Some(ptr) = current {
                unsafe {
                    assert_eq!(ptr.as_ref().segment, segment, "segment tag mismatch");
                    assert!(self.index.contains_key(&ptr.as_ref().key));
                    current = ptr.as_ref().next;
                }
                count += 1;
                walked += 1;
                assert!(walked <= self.index.len(), "cycle detected");
            }
            assert_eq!(count, expect_len, "segment length mismatch");
        }
        for key in self.index.keys() {
            assert!(!self.b1.contains(key), "live key in ghost B1");
            assert!(!self.b2.contains(key), "live key in ghost B2");
        }
        self.b1.debug_validate_invariants();
        self.b2.debug_validate_invariants();
    }
}

impl<K, V> EvictionPolicy<K, V> for ArcCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        let ptr = *self.index.get(key)?;
        // A T1 hit proves repeat interest: promote to T2. A T2 hit refreshes
        // its position there.
        self.detach(ptr);
        self.attach_head(ptr, Segment::T2);
        unsafe { Some(&ptr.as_ref().value) }
    }

    fn add(&mut self, key: K, value: V) {
        // Case 1 & 2: key already resident. T1 → promote to T2; T2 → refresh.
        if let Some(&ptr) = self.index.get(&key) {
            unsafe {
                let mut ptr = ptr;
                ptr.as_mut().value = value;
            }
            self.detach(ptr);
            self.attach_head(ptr, Segment::T2);
            return;
        }

        // Case 3: ghost hit in B1 — T1 was undersized, grow p.
        if self.b1.contains(&key) {
            let delta = ghost_delta(self.b2.len(), self.b1.len());
            self.p = (self.p + delta).min(self.capacity);
            if self.is_full() {
                self.replace(false);
            }
            self.b1.remove(&key);
            self.insert_node(key, value, Segment::T2);
            return;
        }

        // Case 4: ghost hit in B2 — T2 was undersized, shrink p.
        if self.b2.contains(&key) {
            let delta = ghost_delta(self.b1.len(), self.b2.len());
            self.p = self.p.saturating_sub(delta);
            if self.is_full() {
                self.replace(true);
            }
            self.b2.remove(&key);
            self.insert_node(key, value, Segment::T2);
            return;
        }

        // Case 5: unseen anywhere. Make room, trim ghosts to their adaptive
        // bounds, insert into T1.
        if self.is_full() {
            self.replace(false);
        }
        if self.capacity != 0 {
            while self.b1.len() > self.capacity - self.p {
                self.b1.pop_oldest();
            }
            while self.b2.len() > self.p {
                self.b2.pop_oldest();
            }
        }
        self.insert_node(key, value, Segment::T1);
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
        self.t1_len + self.t2_len
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        for start in [self.t1_head, self.t2_head] {
            let mut current = start;
            while let Some(ptr) = current {
                unsafe {
                    current = ptr.as_ref().next;
                    drop(Box::from_raw(ptr.as_ptr()));
                }
            }
        }
        self.index.clear();
        self.t1_head = None;
        self.t1_tail = None;
        self.t1_len = 0;
        self.t2_head = None;
        self.t2_tail = None;
        self.t2_len = 0;
        self.b1.clear();
        self.b2.clear();
        self.p = 0;
    }
}

impl<K, V> Drop for ArcCache<K, V> {
    fn drop(&mut self) {
        for start in [self.t1_head, self.t2_head] {
            let mut current = start;
            while let Some(ptr) = current {
                unsafe {
                    current = ptr.as_ref().next;
                    drop(Box::from_raw(ptr.as_ptr()));
                }
            }
        }
    }
}

impl<K, V> std::fmt::Debug for ArcCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArcCache")
            .field("capacity", &self.capacity)
            .field("t1_len", &self.t1_len)
            .field("t2_len", &self.t2_len)
            .field("b1_len", &self.b1.len())
            .field("b2_len", &self.b2.len())
            .field("p", &self.p)
            .finish()
    }
}
