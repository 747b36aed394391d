// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from an optional file (YAML or JSON), then apply
/// environment overrides with the `HEALTH` prefix, e.g.
/// `HEALTH__BROKER__PASSWORD=secret`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_ref()).required(false))
        .add_source(config::Environment::with_prefix("HEALTH").separator("__"))
        .build()
        .context("Failed to read configuration")?;

    let config: Config = settings
        .try_deserialize()
        .context("Failed to parse configuration")?;

    config.validate()?;
    Ok(config)
}
