//! Stash Core - key taxonomy, domain models and errors
//!
//! This crate provides the foundational types shared by the cache
//! coordinator and the resource definitions:
//!
//! - [`QueryKey`] / [`KeyToken`]: hierarchical, structurally compared cache keys
//! - [`KeyFactory`]: per-resource builders for `all`, `list` and `detail` keys
//! - [`model`]: todo, meal and employee payloads
//! - [`StashError`]: the error taxonomy shared by every fetch and mutation

pub mod error;
pub mod key;
pub mod model;

pub use error::{Result, StashError};
pub use key::{KeyFactory, KeyToken, QueryKey};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
