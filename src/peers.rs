//! Peer membership and key routing.
//!
//! [`PeerSet`] is the default [`Picker`]: it owns a consistent-hash ring plus
//! a fetcher per known peer, and resolves each key to the peer owning it. The
//! node's own address is a member of the ring, so ownership is symmetric
//! across the cluster; a key this node owns resolves to `None` and the caller
//! takes the local path.
//!
//! Membership updates replace the ring and fetcher table wholesale. The set
//! carries no transport itself; `set_peers` takes a connect function that
//! builds a [`Fetcher`] per peer address, keeping the RPC client at the edge.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::ring::{HashFn, HashRing, DEFAULT_REPLICAS};
use crate::traits::{Fetcher, Picker};

struct PeerState {
    ring: HashRing,
    fetchers: FxHashMap<String, Arc<dyn Fetcher>>,
}

/// Ring-backed peer picker.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use peercache::peers::PeerSet;
/// use peercache::traits::{Fetcher, Picker, SourceError};
///
/// struct NullClient;
/// impl Fetcher for NullClient {
///     fn fetch(&self, _g: &str, _k: &str) -> Result<Vec<u8>, SourceError> {
///         Err("unreachable in this example".into())
///     }
/// }
///
/// let peers = PeerSet::new("a:9000", None, None);
/// peers.set_peers(
///     &["a:9000".into(), "b:9000".into()],
///     |_addr| Arc::new(NullClient),
/// );
///
/// // Every key resolves: either to b:9000's fetcher or to None (self).
/// let _ = peers.pick("some-key");
/// ```
pub struct PeerSet {
    self_addr: String,
    replicas: usize,
    hash: Option<HashFn>,
    state: RwLock<PeerState>,
}

impl PeerSet {
    /// Creates a picker for the node at `self_addr` with an empty ring.
    ///
    /// `replicas` defaults to [`DEFAULT_REPLICAS`], `hash` to CRC32.
    pub fn new(self_addr: impl Into<String>, replicas: Option<usize>, hash: Option<HashFn>) -> Self {
        let replicas = replicas.unwrap_or(DEFAULT_REPLICAS);
        Self {
            self_addr: self_addr.into(),
            replicas,
            hash,
            state: RwLock::new(PeerState {
                ring: HashRing::new(replicas, hash),
                fetchers: FxHashMap::default(),
            }),
        }
    }

    /// This node's own address as registered on the ring.
    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    /// Replaces the entire membership with `peers`, building one fetcher per
    /// address via `connect`. No fetcher is built for this node's own address.
    pub fn set_peers<F>(&self, peers: &[String], connect: F)
    where
        F: Fn(&str) -> Arc<dyn Fetcher>,
    {
        let mut ring = HashRing::new(self.replicas, self.hash);
        ring.register(peers);

        let mut fetchers = FxHashMap::default();
        for peer in peers {
            if *peer != self.self_addr {
                fetchers.insert(peer.clone(), connect(peer));
            }
        }

        debug!(
            self_addr = %self.self_addr,
            peers = peers.len(),
            "peer membership replaced"
        );
        let mut state = self.state.write();
        state.ring = ring;
        state.fetchers = fetchers;
    }

    /// Number of remote peers with a live fetcher.
    pub fn remote_count(&self) -> usize {
        self.state.read().fetchers.len()
    }
}

impl Picker for PeerSet {
    fn pick(&self, key: &str) -> Option<Arc<dyn Fetcher>> {
        let state = self.state.read();
        let owner = state.ring.get_peer(key)?;
        if owner == self.self_addr {
            debug!(key, "key owned locally");
            return None;
        }
        let fetcher = state.fetchers.get(owner).cloned();
        if fetcher.is_some() {
            debug!(key, owner, "key routed to remote peer");
        }
        fetcher
    }

    fn shutdown(&self) {
        let mut state = self.state.write();
        state.ring = HashRing::new(self.replicas, self.hash);
        state.fetchers.clear();
        debug!(self_addr = %self.self_addr, "peer set shut down");
    }
}

impl std::fmt::Debug for PeerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerSet")
            .field("self_addr", &self.self_addr)
            .field("replicas", &self.replicas)
            .field("remotes", &self.state.read().fetchers.len())
            .finish()
    }
}
