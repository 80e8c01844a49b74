//! Error types for memoir cache operations.

use thiserror::Error;

/// Boxed error type for failures raised by memoized functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Cache layer errors.
///
/// Only [`CacheError::InvalidKey`] indicates a programmer-usage error and
/// fails fast before any storage is touched. Storage-level trouble is
/// recovered inside the backends wherever possible: a corrupt store reads
/// as empty, and a failed value flush is logged and swallowed so that the
/// computed result still reaches the caller.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A versioned operation received a key without the `name:version` delimiter.
    #[error("cache key must include a version, e.g. \"myCache:0\" (got {key:?})")]
    InvalidKey { key: String },

    /// Value or arguments could not be encoded/decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SQLite statement or connection failure.
    #[error("database error during {op}: {reason}")]
    Database { op: &'static str, reason: String },

    /// Filesystem failure surfaced where not deliberately swallowed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection mutex was poisoned by a panicking thread.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// The wrapped or fallback function failed. Nothing was persisted for
    /// the call; the source error is carried unchanged.
    #[error("memoized function failed")]
    Fallback(#[source] BoxError),
}

impl CacheError {
    /// Shorthand for a [`CacheError::Database`] with the given operation label.
    pub fn database(op: &'static str, e: impl std::fmt::Display) -> Self {
        Self::Database {
            op,
            reason: e.to_string(),
        }
    }
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
