//! memoir-cache - key-versioned, persistent memoization.
//!
//! A small cache layer for avoiding recomputation of expensive,
//! side-effecting operations (browser page loads, LLM calls). Entries are
//! stored under versioned keys (`name:version`); bumping the version
//! invalidates the previous one, and only the newest version of a key
//! family is ever retained.
//!
//! Two interchangeable backends implement the [`CacheStore`] contract:
//!
//! - [`JsonStore`]: one flat JSON document file, rewritten on every write.
//! - [`SqliteStore`]: one embedded SQLite file, indexed for cleanup scans.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use memoir_cache::{CacheStore, SqliteStore};
//!
//! let store = Arc::new(SqliteStore::open("cache.db")?);
//!
//! let load_html = store.wrap(
//!     "loadHTML",
//!     |(url,): (String,)| async move { fetch_page(&url).await },
//!     Some("0"),
//! )?;
//!
//! // First call fetches and persists; later calls with the same URL are
//! // served from the cache, across process runs.
//! let html: String = load_html.call(("https://example.com".into(),)).await?;
//! ```

pub mod json_store;
pub mod legacy;
pub mod sqlite_store;
pub mod store;

pub use json_store::{JsonStore, DEFAULT_JSON_CACHE_FILE};
pub use sqlite_store::SqliteStore;
pub use store::{CacheStore, Memoized};

#[allow(deprecated)]
pub use legacy::cache;

pub use memoir_core::{BoxError, CacheError, CacheResult};
