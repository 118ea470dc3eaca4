//! Error types for the peercache library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: the single error taxonomy every public operation speaks.
//!
//! Errors are `Clone` on purpose: the request coalescer delivers one load
//! result, success or failure, to every caller waiting on the same key.
//!
//! ## Classes
//!
//! | Variant | Class | Retry the key? |
//! |---------|-------|----------------|
//! | [`CacheError::InvalidKey`] | caller error | no |
//! | [`CacheError::GroupNotFound`] | caller error | no |
//! | [`CacheError::OriginUnavailable`] | transient | yes |
//! | [`CacheError::RemoteUnavailable`] | transient, absorbed internally | yes |
//! | [`CacheError::Precondition`] | programmer error | never |
//!
//! `RemoteUnavailable` is recovered inside the load protocol by falling back
//! to the origin getter; callers of [`Group::get`](crate::group::Group::get)
//! never observe it.
//!
//! ## Example Usage
//!
//! ```
//! use peercache::error::CacheError;
//!
//! let err = CacheError::OriginUnavailable("db offline".into());
//! assert!(err.is_retryable());
//! assert!(err.to_string().contains("db offline"));
//!
//! assert!(!CacheError::InvalidKey.is_retryable());
//! ```

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Error taxonomy for cache-group operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The caller passed an empty key. Never reaches the coalescer.
    #[error("key is required")]
    InvalidKey,

    /// Registry lookup missed: no group registered under this name.
    #[error("group not found: {0}")]
    GroupNotFound(String),

    /// The origin getter failed. Propagated verbatim to every caller
    /// coalesced on the key; nothing is cached, the key is safe to retry.
    #[error("origin fetch failed: {0}")]
    OriginUnavailable(String),

    /// A remote peer fetch failed or timed out. Absorbed by the load
    /// protocol, which falls back to the origin within the same call.
    #[error("remote peer unavailable: {0}")]
    RemoteUnavailable(String),

    /// Precondition violated: programmer error, not recoverable. Covers
    /// operating on an eviction engine before its policy is constructed,
    /// re-registering a picker, and unknown policy names.
    #[error("precondition violated: {0}")]
    Precondition(&'static str),
}

impl CacheError {
    /// Returns `true` if retrying the same key may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CacheError::OriginUnavailable(_) | CacheError::RemoteUnavailable(_)
        )
    }

    /// Returns `true` for the programmer-error class.
    pub fn is_precondition(&self) -> bool {
        matches!(self, CacheError::Precondition(_))
    }
}
