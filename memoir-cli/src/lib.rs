//! memoir-cli - project scaffolding for memoir-cached scripts.
//!
//! The binary creates a scratch project wired up with the cache library:
//! a manifest with the fixed starter dependencies, a starter program, an
//! empty cache document, and a `.env` copied from `~/.memoir` when that
//! dotfile exists.

pub mod scaffold;
