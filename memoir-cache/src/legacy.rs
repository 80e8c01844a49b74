//! Deprecated function-style cache, kept for backward compatibility.

use std::sync::Arc;

use memoir_core::CacheResult;

use crate::json_store::{JsonStore, DEFAULT_JSON_CACHE_FILE};
use crate::store::{CacheStore, Memoized};

/// Memoize `func` under an already-versioned `name`, persisting to
/// `cache.json` in the current directory.
///
/// This is a thin adapter over the JSON backend: `name` must already
/// include the delimiter (there is no separate version parameter), and the
/// document path is the historical ambient default, frozen here for
/// compatibility.
///
/// # Errors
///
/// Returns [`memoir_core::CacheError::InvalidKey`] when `name` carries no
/// delimiter.
///
/// # Migration
///
/// ```ignore
/// // Old usage:
/// let cached = cache("name:1", my_function)?;
///
/// // New usage:
/// let store = Arc::new(JsonStore::new("cache.json"));
/// let cached = store.wrap("name:1", my_function, None)?;
/// ```
#[deprecated(since = "0.1.0", note = "use JsonStore::wrap instead")]
pub fn cache<F>(name: &str, func: F) -> CacheResult<Memoized<JsonStore, F>> {
    Arc::new(JsonStore::new(DEFAULT_JSON_CACHE_FILE)).wrap(name, func, None)
}
