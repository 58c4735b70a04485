//! Hierarchical cache keys.
//!
//! A [`QueryKey`] is an ordered tuple of [`KeyToken`]s. Keys form a
//! hierarchy per resource:
//!
//! ```text
//! [todos]
//! ├── [todos, "list"]
//! │   └── [todos, "list", {filters: "limit:30,skip:0"}]
//! └── [todos, "detail"]
//!     └── [todos, "detail", 5]
//! ```
//!
//! Invalidating a shorter tuple invalidates every longer tuple that
//! starts with it.

mod factory;
mod token;

pub use factory::KeyFactory;
pub use token::{KeyToken, QueryKey};
