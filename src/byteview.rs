//! Immutable view over a cached byte payload.
//!
//! Values enter the cache exactly once (from an origin fetch or a remote peer
//! response) and are never mutated in place. [`ByteView`] enforces that at the
//! type level: the backing buffer is a refcounted immutable [`Bytes`], so every
//! extraction hands the caller a view that cannot reach back into the cache.
//!
//! ## Key Components
//!
//! - [`ByteView`]: cheap-to-clone, immutable byte container
//!
//! ## Example Usage
//!
//! ```
//! use peercache::byteview::ByteView;
//!
//! let view = ByteView::from("630");
//! assert_eq!(view.len(), 3);
//! assert_eq!(view.as_slice(), b"630");
//! assert_eq!(view.to_string(), "630");
//!
//! // Extractions are independent copies; mutating one cannot touch the cache.
//! let owned: Vec<u8> = view.to_vec();
//! assert_eq!(owned, b"630");
//! ```

use std::fmt;

use bytes::Bytes;

/// Immutable byte value as stored in and returned from a cache group.
///
/// Cloning is O(1) (refcount bump); the payload itself is shared but can
/// never be mutated through any `ByteView`.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ByteView {
    data: Bytes,
}

impl ByteView {
    /// Wraps an owned byte buffer without copying.
    #[inline]
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Returns the payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrows the payload as a byte slice.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Copies the payload into a fresh owned vector.
    #[inline]
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Returns the shared backing buffer (still immutable).
    #[inline]
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl fmt::Display for ByteView {
    /// Renders the payload as UTF-8, replacing invalid sequences.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.data))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteView")
            .field("len", &self.data.len())
            .finish()
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(data: Vec<u8>) -> Self {
        Self { data: data.into() }
    }
}

impl From<&[u8]> for ByteView {
    fn from(data: &[u8]) -> Self {
        Self {
            data: Bytes::copy_from_slice(data),
        }
    }
}

impl From<&str> for ByteView {
    fn from(data: &str) -> Self {
        Self {
            data: Bytes::copy_from_slice(data.as_bytes()),
        }
    }
}

impl From<String> for ByteView {
    fn from(data: String) -> Self {
        Self { data: data.into() }
    }
}
