//! Flat JSON document backend.
//!
//! The whole store is one pretty-printed JSON object mapping cache keys to
//! inner maps of arguments keys to values. Values written through the
//! direct interface land in the reserved `"value"` slot of the inner map;
//! both shapes coexist in the same file:
//!
//! ```json
//! {
//!   "user:1": { "value": { "id": 1, "name": "User 1" } },
//!   "greet:1": { "[\"Alice\",30]": "Hello Alice, you are 30 years old" }
//! }
//! ```
//!
//! Every read parses the whole document and every write rewrites it. A
//! missing or corrupt document reads as an empty store; a failed write is
//! logged and swallowed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use memoir_core::{family_prefix, CacheResult, DELIMITER, VALUE_SLOT};
use tracing::{debug, warn};

use crate::store::CacheStore;

/// Conventional document file name, joined to a caller-chosen directory.
/// The store itself never derives a path from ambient process state.
pub const DEFAULT_JSON_CACHE_FILE: &str = "cache.json";

type Document = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

/// Cache store backed by a single JSON document file.
///
/// Created lazily: the file is only touched on first access. The document
/// persists across process runs and is never implicitly deleted except by
/// [`CacheStore::clear`].
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Create a store over the document at `path`. Does not touch the
    /// filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The document path this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Document {
        if !self.path.exists() {
            return Document::new();
        }
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "error reading cache; treating as empty");
                return Document::new();
            }
        };
        match serde_json::from_str(&text) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt cache document; treating as empty");
                Document::new()
            }
        }
    }

    fn write_document(&self, doc: &Document) {
        let text = match serde_json::to_string_pretty(doc) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "error encoding cache document");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, text) {
            warn!(path = %self.path.display(), error = %e, "error writing cache; result not persisted");
        }
    }
}

#[async_trait]
impl CacheStore for JsonStore {
    async fn get_raw(&self, key: &str, args_key: &str) -> CacheResult<Option<serde_json::Value>> {
        let doc = self.read_document();
        Ok(doc.get(key).and_then(|entry| entry.get(args_key)).cloned())
    }

    async fn put_raw(
        &self,
        key: &str,
        args_key: &str,
        value: serde_json::Value,
    ) -> CacheResult<()> {
        let mut doc = self.read_document();
        doc.entry(key.to_string())
            .or_default()
            .insert(args_key.to_string(), value);
        self.write_document(&doc);
        Ok(())
    }

    async fn has(&self, key: &str) -> CacheResult<bool> {
        Ok(self.read_document().contains_key(key))
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut doc = self.read_document();
        if doc.remove(key).is_some() {
            self.write_document(&doc);
        }
        Ok(())
    }

    async fn clear(&self) -> CacheResult<()> {
        self.write_document(&Document::new());
        Ok(())
    }

    async fn remove_family(&self, new_key: &str) -> CacheResult<u64> {
        let prefix = family_prefix(new_key);
        if prefix.is_empty() {
            return Ok(0);
        }
        let prefix = format!("{prefix}{DELIMITER}");
        let mut doc = self.read_document();

        let old_versions: Vec<String> = doc
            .keys()
            .filter(|key| key.starts_with(&prefix) && key.as_str() != new_key)
            .cloned()
            .collect();

        if old_versions.is_empty() {
            return Ok(0);
        }
        for key in &old_versions {
            debug!(key = %key, "cleaning up old cache version");
            doc.remove(key);
        }
        self.write_document(&doc);
        Ok(old_versions.len() as u64)
    }

    fn direct_scope(&self) -> &'static str {
        VALUE_SLOT
    }
}
