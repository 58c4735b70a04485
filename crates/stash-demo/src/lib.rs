//! Stash Demo - command-line driver for the query cache
//!
//! Wires [`StashSettings`] into a [`stash_cache::QueryClient`] and runs the
//! resource flows of [`flows`].

pub mod cli;
pub mod flows;
pub mod settings;
pub mod telemetry;

pub use cli::{Cli, Command};
pub use flows::{Resources, run};
pub use settings::StashSettings;
