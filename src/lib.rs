//! peercache: a distributed, in-process read-through cache node.
//!
//! Each node holds a partition of cached values behind a pluggable eviction
//! engine (LRU, LFU, or ARC). Keys are routed to their owning peer by a
//! consistent-hash ring, concurrent loads for one key are coalesced into a
//! single in-flight call, and misses fall back from the remote owner to the
//! origin data source.
//!
//! ## Architecture
//!
//! ```text
//!   caller ──► Group::get(key)
//!                 │
//!                 ├── local cache hit ──────────────────────► ByteView
//!                 │
//!                 └── miss ──► Flight::do_call(key, load)
//!                                 │  (one load per key; waiters share it)
//!                                 │
//!                                 ├── Picker resolves remote owner
//!                                 │     └── Fetcher::fetch ──► ByteView
//!                                 │          (local cache NOT populated)
//!                                 │
//!                                 └── fallback: Getter::get (origin)
//!                                       └── populate local cache ──► ByteView
//! ```
//!
//! Wire transport, service discovery, and the origin store stay outside this
//! crate; the core consumes them through the [`traits::Getter`],
//! [`traits::Fetcher`], and [`traits::Picker`] capabilities.

pub use byteview::ByteView;
pub use error::{CacheError, Result};
pub use group::Group;
pub use policy::PolicyKind;

pub mod byteview;
pub mod ds;
pub mod error;
pub mod flight;
pub mod group;
pub mod peers;
pub mod policy;
pub mod prelude;
pub mod registry;
pub mod ring;
pub mod traits;
