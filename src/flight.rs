//! Request coalescing for concurrent cache misses.
//!
//! When many threads miss on the same key at once, only one of them (the
//! leader) performs the expensive load; the rest block until the leader
//! finishes and then receive a clone of the same result. Without this, a
//! popular key expiring under load turns into a thundering herd against the
//! origin.
//!
//! ```text
//!   thread A ── miss "k" ──► no record ──► leader: runs the load
//!   thread B ── miss "k" ──► record found ──► waits on the call
//!   thread C ── miss "k" ──► record found ──► waits on the call
//!                                │
//!   leader finishes ─► removes record, publishes result, wakes waiters
//!   A, B, C all observe the identical Result
//! ```
//!
//! The leader removes the in-flight record before publishing, so a caller
//! arriving after completion starts a fresh load rather than observing a
//! stale result.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;

use crate::error::{CacheError, Result};

/// One in-flight load, shared between the leader and its waiters.
struct Call<T> {
    slot: Mutex<Option<Result<T>>>,
    done: Condvar,
}

impl<T: Clone> Call<T> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn wait(&self) -> Result<T> {
        let mut slot = self.slot.lock();
        while slot.is_none() {
            self.done.wait(&mut slot);
        }
        // Invariant: once set, the slot is never cleared.
        slot.as_ref().cloned().unwrap_or(Err(CacheError::Precondition(
            "in-flight call completed without a result",
        )))
    }

    fn complete(&self, result: Result<T>) {
        let mut slot = self.slot.lock();
        *slot = Some(result);
        self.done.notify_all();
    }
}

/// Coalesces concurrent loads of the same key into a single execution.
///
/// Keys are compared by exact string equality. Results must be `Clone`
/// because every waiter receives its own copy; the group coordinator uses
/// [`ByteView`](crate::ByteView), which clones by reference count.
pub struct Flight<T> {
    inflight: Mutex<FxHashMap<String, Arc<Call<T>>>>,
}

impl<T: Clone> Flight<T> {
    /// Creates a coalescer with no loads in flight.
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(FxHashMap::default()),
        }
    }

    /// Runs `load` for `key`, unless a load for the same key is already in
    /// flight, in which case blocks and returns that load's result instead.
    ///
    /// Errors propagate to every coalesced caller identically.
    pub fn do_call<F>(&self, key: &str, load: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let call = {
            let mut inflight = self.inflight.lock();
            if let Some(existing) = inflight.get(key) {
                let existing = Arc::clone(existing);
                drop(inflight);
                return existing.wait();
            }
            let call = Arc::new(Call::new());
            inflight.insert(key.to_owned(), Arc::clone(&call));
            call
        };

        let result = load();

        // Remove the record before publishing so late arrivals load fresh.
        self.inflight.lock().remove(key);
        call.complete(result.clone());
        result
    }

    /// Number of loads currently in flight. Test and introspection hook.
    pub fn inflight_len(&self) -> usize {
        self.inflight.lock().len()
    }
}

impl<T: Clone> Default for Flight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Flight<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flight")
            .field("inflight", &self.inflight.lock().len())
            .finish()
    }
}
