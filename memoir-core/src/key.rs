//! Versioned cache-key model.
//!
//! A cache key joins a logical name and a version tag with [`DELIMITER`],
//! e.g. `"loadHTML:0"`. The portion before the first delimiter is the key's
//! *family*; backends retain at most one version per family, purging older
//! siblings when a new version is written.
//!
//! Keys used by versioned operations MUST contain the delimiter. Absence is
//! a programmer error reported immediately via [`CacheError::InvalidKey`],
//! never stored.

use serde::Serialize;

use crate::error::{CacheError, CacheResult};

/// Separator between a key's logical name and its version tag.
pub const DELIMITER: char = ':';

/// Canonical arguments key for the direct (argument-less) interface on the
/// relational backend: the serialization of an empty argument list.
pub const EMPTY_ARGS_KEY: &str = "[]";

/// Reserved inner-map slot used by the document backend for values written
/// through the direct interface (`{ key: { "value": v } }`).
pub const VALUE_SLOT: &str = "value";

/// Builds the effective storage key from a logical name and an optional
/// version tag.
///
/// With a version, the result is `name:version`; without one, the name is
/// used as-is and must already carry a delimiter.
///
/// # Errors
///
/// Returns [`CacheError::InvalidKey`] if the effective key lacks the
/// delimiter. The check runs before any storage is touched.
pub fn effective_key(name: &str, version: Option<&str>) -> CacheResult<String> {
    let key = match version {
        Some(v) => format!("{name}{DELIMITER}{v}"),
        None => name.to_string(),
    };
    if !key.contains(DELIMITER) {
        return Err(CacheError::InvalidKey { key });
    }
    Ok(key)
}

/// Returns the family prefix of a key: the portion before the first
/// delimiter, or the whole key when no delimiter is present.
pub fn family_prefix(key: &str) -> &str {
    match key.find(DELIMITER) {
        Some(idx) => &key[..idx],
        None => key,
    }
}

/// Deterministically serializes a call's argument tuple into an arguments
/// key. Tuples serialize as JSON arrays, so `("Alice", 30)` becomes
/// `["Alice",30]`.
pub fn args_key<A: Serialize>(args: &A) -> CacheResult<String> {
    Ok(serde_json::to_string(args)?)
}
