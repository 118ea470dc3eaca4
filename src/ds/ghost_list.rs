//! Recency-ordered list of ghost entries.
//!
//! A ghost entry is a key-only record of a recently evicted cache item, kept
//! so an adaptive policy (ARC) can detect that it evicted the wrong thing.
//! No values are stored; the owning policy decides when to trim.
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<K, NonNull<Node>>      list: head ─► [C] ◄──► [B] ◄──► [A] ◄─ tail
//!   ┌─────────┬─────────┐                          MRU                        LRU
//!   │  key A  │  ptr_a  │
//!   │  key B  │  ptr_b  │       record(k): move k to MRU (insert if absent)
//!   │  key C  │  ptr_c  │       pop_oldest(): detach LRU end
//!   └─────────┴─────────┘
//! ```
//!
//! ## Performance
//!
//! - `record` / `remove` / `contains` / `pop_oldest`: O(1) average

use std::hash::Hash;
use std::ptr::NonNull;

use rustc_hash::FxHashMap;

struct Node<K> {
    prev: Option<NonNull<Node<K>>>,
    next: Option<NonNull<Node<K>>>,
    key: K,
}

/// Unbounded recency list of keys (no values) for ARC-style ghost tracking.
///
/// The caller bounds it by draining [`pop_oldest`](GhostList::pop_oldest);
/// ARC trims B1 against `capacity - p` and B2 against `p`.
pub struct GhostList<K> {
    index: FxHashMap<K, NonNull<Node<K>>>,
    head: Option<NonNull<Node<K>>>,
    tail: Option<NonNull<Node<K>>>,
}

// SAFETY: the raw node pointers are owned exclusively by this list and only
// reachable through &mut methods; thread-safety reduces to K's.
unsafe impl<K: Send> Send for GhostList<K> {}
unsafe impl<K: Sync> Sync for GhostList<K> {}

impl<K> GhostList<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty ghost list.
    pub fn new() -> Self {
        Self {
            index: FxHashMap::default(),
            head: None,
            tail: None,
        }
    }

    /// Returns the number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Records `key` as most-recently-evicted, moving it to the front if it
    /// is already tracked.
    pub fn record(&mut self, key: K) {
        if let Some(&ptr) = self.index.get(&key) {
            self.detach(ptr);
            self.attach_front(ptr);
            return;
        }

        let node = Box::new(Node {
            prev: None,
            next: None,
            key: key.clone(),
        });
        // Box::into_raw never returns null.
        let ptr = unsafe { NonNull::new_unchecked(Box::into_raw(node)) };
        self.index.insert(key, ptr);
        self.attach_front(ptr);
    }

    /// Removes `key`; returns `true` if it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        let ptr = match self.index.remove(key) {
            Some(ptr) => ptr,
            None => return false,
        };
        self.detach(ptr);
        unsafe {
            drop(Box::from_raw(ptr.as_ptr()));
        }
        true
    }

    /// Detaches and returns the least-recently-recorded key.
    pub fn pop_oldest(&mut self) -> Option<K> {
        let ptr = self.tail?;
        self.detach(ptr);
        let node = unsafe { Box::from_raw(ptr.as_ptr()) };
        self.index.remove(&node.key);
        Some(node.key)
    }

    /// Drops every tracked key.
    pub fn clear(&mut self) {
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

    fn attach_front(&mut self, mut ptr: NonNull<Node<K>>) {
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

    fn detach(&mut self, ptr: NonNull<Node<K>>) {
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

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let mut walked = 0;
        let mut current = self.head;
        let mut prev: Option<NonNull<Node<K>>> = None;
        while let Some(ptr) = current {
            unsafe {
                assert_eq!(ptr.as_ref().prev, prev, "back-link mismatch");
                assert!(
                    self.index.contains_key(&ptr.as_ref().key),
                    "list key missing from index"
                );
                prev = Some(ptr);
                current = ptr.as_ref().next;
            }
            walked += 1;
            assert!(walked <= self.index.len(), "cycle detected");
        }
        assert_eq!(walked, self.index.len(), "list/index length mismatch");
        assert_eq!(self.tail, prev, "tail mismatch");
    }
}

impl<K> Default for GhostList<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Drop for GhostList<K> {
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

impl<K> std::fmt::Debug for GhostList<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GhostList")
            .field("len", &self.index.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_recency_order() {
        let mut ghost = GhostList::new();
        ghost.record("a");
        ghost.record("b");
        ghost.record("c");
        ghost.debug_validate_invariants();

        assert_eq!(ghost.len(), 3);
        assert_eq!(ghost.pop_oldest(), Some("a"));
        assert_eq!(ghost.pop_oldest(), Some("b"));
        assert_eq!(ghost.pop_oldest(), Some("c"));
        assert_eq!(ghost.pop_oldest(), None);
    }

    #[test]
    fn record_existing_moves_to_front() {
        let mut ghost = GhostList::new();
        ghost.record("a");
        ghost.record("b");
        ghost.record("a");
        ghost.debug_validate_invariants();

        assert_eq!(ghost.len(), 2);
        assert_eq!(ghost.pop_oldest(), Some("b"));
        assert_eq!(ghost.pop_oldest(), Some("a"));
    }

    #[test]
    fn remove_existing_and_missing() {
        let mut ghost = GhostList::new();
        ghost.record("a");
        ghost.record("b");

        assert!(ghost.remove(&"a"));
        assert!(!ghost.contains(&"a"));
        assert!(!ghost.remove(&"missing"));
        ghost.debug_validate_invariants();
        assert_eq!(ghost.len(), 1);
    }

    #[test]
    fn clear_resets_state() {
        let mut ghost = GhostList::new();
        ghost.record(1);
        ghost.record(2);
        ghost.clear();

        assert!(ghost.is_empty());
        assert_eq!(ghost.pop_oldest(), None);
        ghost.debug_validate_invariants();
    }

    #[test]
    fn reuse_after_pop_keeps_links_consistent() {
        let mut ghost = GhostList::new();
        for i in 0..10 {
            ghost.record(i);
        }
        for _ in 0..5 {
            ghost.pop_oldest();
        }
        ghost.record(3);
        ghost.record(42);
        ghost.debug_validate_invariants();
        assert_eq!(ghost.len(), 7);
    }
}
