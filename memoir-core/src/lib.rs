//! memoir-core - key model and error types for the memoir cache.
//!
//! Defines the versioned-key contract shared by every storage backend.
//! The backends themselves live in `memoir-cache`.

pub mod error;
pub mod key;

pub use error::{BoxError, CacheError, CacheResult};
pub use key::{
    args_key, effective_key, family_prefix, DELIMITER, EMPTY_ARGS_KEY, VALUE_SLOT,
};
