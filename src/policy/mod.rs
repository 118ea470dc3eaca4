//! Eviction policies for the per-node local cache.
//!
//! Three interchangeable engines sit behind the
//! [`EvictionPolicy`](crate::traits::EvictionPolicy) contract:
//!
//! | Policy | Evicts | Best for |
//! |--------|--------|----------|
//! | [`LruCache`] | least recently touched | temporal locality |
//! | [`LfuCache`] | least frequent, then least recent | stable hot spots |
//! | [`ArcCache`] | adaptively between recency and frequency | mixed or shifting workloads |
//!
//! The policy is a closed set selected by name once, at group construction;
//! there is no runtime re-selection.

pub mod arc;
pub mod lfu;
pub mod lru;

pub use arc::ArcCache;
pub use lfu::LfuCache;
pub use lru::LruCache;

use std::hash::Hash;
use std::str::FromStr;

use crate::error::CacheError;
use crate::traits::{EvictionCallback, EvictionPolicy};

/// Eviction policy selector.
///
/// # Example
///
/// ```
/// use peercache::policy::PolicyKind;
///
/// let kind: PolicyKind = "arc".parse().unwrap();
/// assert_eq!(kind, PolicyKind::Arc);
/// assert_eq!(PolicyKind::default(), PolicyKind::Lru);
/// assert!("mru".parse::<PolicyKind>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolicyKind {
    /// Least-recently-used.
    #[default]
    Lru,
    /// Least-frequently-used with recency tiebreak.
    Lfu,
    /// Adaptive replacement cache.
    Arc,
}

impl PolicyKind {
    /// Builds the selected engine behind the uniform contract.
    ///
    /// `capacity == 0` means unbounded. The optional callback fires
    /// synchronously with each entry evicted under capacity pressure.
    pub fn build<K, V>(
        self,
        capacity: usize,
        on_evict: Option<EvictionCallback<K, V>>,
    ) -> Box<dyn EvictionPolicy<K, V> + Send + Sync>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        match self {
            PolicyKind::Lru => Box::new(LruCache::new(capacity, on_evict)),
            PolicyKind::Lfu => Box::new(LfuCache::new(capacity, on_evict)),
            PolicyKind::Arc => Box::new(ArcCache::new(capacity, on_evict)),
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Lru => "lru",
            PolicyKind::Lfu => "lfu",
            PolicyKind::Arc => "arc",
        }
    }
}

impl FromStr for PolicyKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lru" => Ok(PolicyKind::Lru),
            "lfu" => Ok(PolicyKind::Lfu),
            "arc" => Ok(PolicyKind::Arc),
            _ => Err(CacheError::Precondition("unknown eviction policy")),
        }
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
