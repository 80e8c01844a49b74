//! The storage-backend contract shared by every cache medium.
//!
//! [`CacheStore`] is both the capability contract and the facade:
//! application code is written once against the trait and can swap the
//! backing medium (JSON document, SQLite file) without change. Backends
//! implement the raw per-medium primitives; the versioned operations
//! (`get`, `set`, `get_with_fallback`, `wrap`) are provided on top of them
//! with identical observable semantics regardless of medium.
//!
//! # Family cleanup
//!
//! Every successful miss-write through [`CacheStore::get_with_fallback`] or
//! a [`Memoized`] call triggers family cleanup: all stored keys sharing the
//! new key's prefix, except the new key itself, are purged. Last version
//! wins; no historical versions are retained. Cleanup never runs on hits.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use memoir_core::{
    args_key, effective_key, BoxError, CacheError, CacheResult,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Pluggable persistence contract for cache entries.
///
/// Entries are keyed by `(cache_key, args_key)`. The *direct* interface
/// (`get`/`set`/`has`/`delete`) operates on a single backend-chosen
/// arguments scope; multi-argument memoization via [`Memoized`] stores one
/// entry per distinct argument serialization under the same cache key.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up the raw value stored at `(key, args_key)`.
    ///
    /// Returns `Ok(None)` on a miss, including when the stored bytes cannot
    /// be parsed (a corrupt entry degrades to a miss, it never fails the
    /// calling operation).
    async fn get_raw(&self, key: &str, args_key: &str) -> CacheResult<Option<serde_json::Value>>;

    /// Insert-or-replace the value at `(key, args_key)` with a fresh
    /// timestamp and flush to the medium.
    ///
    /// A failure to write the medium is logged and swallowed: memoization
    /// must not crash the caller's business logic over a lost flush.
    async fn put_raw(&self, key: &str, args_key: &str, value: serde_json::Value)
        -> CacheResult<()>;

    /// Existence check for `key`, without deserializing any value.
    async fn has(&self, key: &str) -> CacheResult<bool>;

    /// Remove all entries under `key`, across every arguments scope.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Empty the entire store unconditionally.
    async fn clear(&self) -> CacheResult<()>;

    /// Delete every stored key in `new_key`'s family except `new_key`
    /// itself. Returns the number of purged keys.
    async fn remove_family(&self, new_key: &str) -> CacheResult<u64>;

    /// The arguments scope the direct interface reads and writes.
    fn direct_scope(&self) -> &'static str;

    /// Look up the value stored under exactly `key` by the direct interface.
    ///
    /// Returns `Ok(None)` if missing or unparsable as `T`.
    async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get_raw(key, self.direct_scope()).await? {
            Some(raw) => match serde_json::from_value(raw) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!(key, error = %e, "stored value unparsable; treating as miss");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Insert-or-replace the direct-interface entry for `key`.
    async fn set<T>(&self, key: &str, value: &T) -> CacheResult<()>
    where
        T: Serialize + Sync,
    {
        let raw = serde_json::to_value(value)?;
        self.put_raw(key, self.direct_scope(), raw).await
    }

    /// Return the cached value for the effective key, or compute, persist,
    /// and return it via `fallback`.
    ///
    /// The effective key is `key:version` when a version is supplied,
    /// otherwise `key` as-is; it must contain the delimiter or the call
    /// fails with [`CacheError::InvalidKey`] before storage or `fallback`
    /// is touched. On a miss the fallback's result is persisted under the
    /// effective key and older versions of the same family are purged.
    ///
    /// A fallback failure propagates as [`CacheError::Fallback`]; nothing
    /// is persisted for that call.
    async fn get_with_fallback<T, F, Fut>(
        &self,
        key: &str,
        fallback: F,
        version: Option<&str>,
    ) -> CacheResult<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, BoxError>> + Send,
    {
        let key = effective_key(key, version)?;

        if let Some(raw) = self.get_raw(&key, self.direct_scope()).await? {
            match serde_json::from_value(raw) {
                Ok(value) => {
                    debug!(key = %key, "cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "stored value unparsable; recomputing");
                }
            }
        }

        debug!(key = %key, "cache miss");
        let result = fallback().await.map_err(CacheError::Fallback)?;

        let raw = serde_json::to_value(&result)?;
        self.put_raw(&key, self.direct_scope(), raw).await?;
        self.remove_family(&key).await?;

        Ok(result)
    }

    /// Wrap `func` into a [`Memoized`] callable persisting per-argument
    /// results under `name` (joined with `version` when supplied).
    ///
    /// Key validation happens here, once; an unversioned effective key is
    /// rejected with [`CacheError::InvalidKey`] before any call is made.
    fn wrap<F>(
        self: Arc<Self>,
        name: &str,
        func: F,
        version: Option<&str>,
    ) -> CacheResult<Memoized<Self, F>>
    where
        Self: Sized,
    {
        Memoized::new(self, name, func, version)
    }
}

/// A memoized function bound to a cache store and a versioned key.
///
/// Each invocation serializes the argument tuple into an arguments key and
/// looks up `(key, args_key)`: a hit returns the stored value without
/// calling the inner function; a miss calls it, persists the result, and
/// purges older versions of the key's family.
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(SqliteStore::open("cache.db")?);
/// let greet = store.wrap(
///     "greet",
///     |(name, age): (String, u32)| async move {
///         Ok(format!("Hello {name}, you are {age} years old"))
///     },
///     Some("1"),
/// )?;
///
/// let message: String = greet.call(("Alice".to_string(), 30)).await?;
/// ```
pub struct Memoized<S, F> {
    store: Arc<S>,
    key: String,
    func: F,
}

// The inner function is opaque; show the key it persists under.
impl<S, F> fmt::Debug for Memoized<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<S, F> Memoized<S, F>
where
    S: CacheStore,
{
    /// Bind `func` to `store` under the effective key formed from `name`
    /// and `version`.
    pub fn new(store: Arc<S>, name: &str, func: F, version: Option<&str>) -> CacheResult<Self> {
        let key = effective_key(name, version)?;
        Ok(Self { store, key, func })
    }

    /// The effective key this wrapper persists under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Invoke the memoized function with the given argument tuple.
    ///
    /// A failure of the inner function propagates as
    /// [`CacheError::Fallback`] and persists nothing.
    pub async fn call<A, T, Fut>(&self, args: A) -> CacheResult<T>
    where
        F: Fn(A) -> Fut,
        A: Serialize,
        Fut: Future<Output = Result<T, BoxError>>,
        T: Serialize + DeserializeOwned,
    {
        let args_key = args_key(&args)?;

        if let Some(raw) = self.store.get_raw(&self.key, &args_key).await? {
            match serde_json::from_value(raw) {
                Ok(value) => {
                    debug!(key = %self.key, args = %args_key, "cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(
                        key = %self.key,
                        args = %args_key,
                        error = %e,
                        "stored value unparsable; recomputing"
                    );
                }
            }
        }

        debug!(key = %self.key, args = %args_key, "cache miss");
        let result = (self.func)(args).await.map_err(CacheError::Fallback)?;

        let raw = serde_json::to_value(&result)?;
        self.store.put_raw(&self.key, &args_key, raw).await?;
        self.store.remove_family(&self.key).await?;

        Ok(result)
    }
}
