//! Layered demo settings.

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use stash_cache::CacheConfig;
use stash_resources::HttpConfig;

/// Prefix of the environment variables read by [`StashSettings::load`].
pub const ENV_PREFIX: &str = "STASH";

/// Settings of one demo run.
///
/// Sources, lowest priority first: defaults, the optional TOML file,
/// then `STASH_*` variables (`STASH_CACHE__RETRY=5`,
/// `STASH_HTTP__TIMEOUT=3s`, `STASH_OFFLINE=true`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StashSettings {
    pub cache: CacheConfig,
    pub http: HttpConfig,
    /// Use the in-memory transports instead of the public APIs.
    pub offline: bool,
}

impl StashSettings {
    /// Loads settings from `file` (if given and present) and the process environment.
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::load_with(file, Environment::with_prefix(ENV_PREFIX))
    }

    /// Like [`load`](Self::load) with an explicit environment source.
    pub fn load_with(file: Option<&Path>, env: Environment) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
