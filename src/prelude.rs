//! Single-import surface for typical callers.
//!
//! ```
//! use peercache::prelude::*;
//!
//! let group = new_group(
//!     "prelude-doc",
//!     64,
//!     PolicyKind::Lru,
//!     Box::new(|key: &str| -> Result<Vec<u8>, SourceError> {
//!         Ok(key.as_bytes().to_vec())
//!     }),
//! );
//! assert_eq!(group.get("k").unwrap().as_slice(), b"k");
//! # destroy_group("prelude-doc");
//! ```

pub use crate::byteview::ByteView;
pub use crate::error::CacheError;
pub use crate::flight::Flight;
pub use crate::group::Group;
pub use crate::peers::PeerSet;
pub use crate::policy::{ArcCache, LfuCache, LruCache, PolicyKind};
pub use crate::registry::{destroy_group, get_group, new_group, serve};
pub use crate::ring::{HashRing, DEFAULT_REPLICAS};
pub use crate::traits::{EvictionPolicy, Fetcher, Getter, Picker, SourceError};
