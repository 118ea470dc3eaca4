//! Consistent-hash ring for key-to-peer ownership.
//!
//! Every peer is hashed at multiple virtual points so load spreads evenly and
//! membership changes move only the keys between a departed peer's points and
//! their successors.
//!
//! ```text
//!        hash space 0..=u32::MAX, sorted points
//!
//!   ... ──► h("0A") ──► h("3B") ──► h("1A") ──► h("2B") ──► wraps to first
//!              │                        │
//!              └── owner A              └── owner A
//!
//!   lookup(key): first point >= hash(key), wrapping past the end
//! ```
//!
//! The hash function is pluggable for deterministic tests; production uses
//! CRC32.

use rustc_hash::FxHashMap;

/// Hash function mapping bytes onto the ring's coordinate space.
pub type HashFn = fn(&[u8]) -> u32;

/// Virtual points placed on the ring per registered peer.
pub const DEFAULT_REPLICAS: usize = 50;

/// Maps keys to owning peers with minimal disruption on membership change.
///
/// # Example
///
/// ```
/// use peercache::ring::HashRing;
///
/// let mut ring = HashRing::new(50, None);
/// ring.register(&["peer-a:9000", "peer-b:9000"]);
///
/// let owner = ring.get_peer("user/42").unwrap();
/// assert!(owner.ends_with(":9000"));
/// ```
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    /// Sorted virtual point hashes.
    points: Vec<u32>,
    /// Virtual point hash → owning peer name.
    owners: FxHashMap<u32, String>,
}

impl HashRing {
    /// Creates an empty ring with `replicas` virtual points per peer.
    /// `hash` defaults to CRC32 when `None`.
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Self {
        Self {
            hash: hash.unwrap_or(crc32fast::hash),
            replicas: replicas.max(1),
            points: Vec::new(),
            owners: FxHashMap::default(),
        }
    }

    /// Adds peers to the ring, placing `replicas` virtual points for each.
    ///
    /// Point `i` of peer `p` hashes the string `"{i}{p}"`. Registering the
    /// same peer twice re-places the same points, which is harmless.
    pub fn register<S: AsRef<str>>(&mut self, peers: &[S]) {
        for peer in peers {
            let peer = peer.as_ref();
            for i in 0..self.replicas {
                let point = (self.hash)(format!("{i}{peer}").as_bytes());
                self.points.push(point);
                self.owners.insert(point, peer.to_owned());
            }
        }
        self.points.sort_unstable();
        self.points.dedup();
    }

    /// Returns the peer owning `key`, or `None` if the ring is empty.
    pub fn get_peer(&self, key: &str) -> Option<&str> {
        if self.points.is_empty() {
            return None;
        }
        let target = (self.hash)(key.as_bytes());
        // First point at or past the key's hash, wrapping to the start.
        let idx = self.points.partition_point(|&p| p < target) % self.points.len();
        self.owners.get(&self.points[idx]).map(String::as_str)
    }

    /// True if no peers are registered.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of virtual points currently on the ring.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

impl std::fmt::Debug for HashRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("points", &self.points.len())
            .finish()
    }
}
