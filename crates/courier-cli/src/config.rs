//! Operations file discovery for the CLI
//!
//! The file comes from `--config` / `COURIER_CONFIG`, or else the first of
//! the default locations that exists:
//! - `./courier.toml`, `./courier.yaml`, `./courier.json`
//! - `~/.config/courier/operations.{toml,yaml,json}`

use crate::error::{Error, Result};
use courier_core::ConfigResolver;
use std::path::{Path, PathBuf};

const EXTENSIONS: [&str; 3] = ["toml", "yaml", "json"];

/// Default operations file locations, in lookup order
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = EXTENSIONS
        .iter()
        .map(|ext| PathBuf::from(format!("courier.{}", ext)))
        .collect();

    if let Some(home_dir) = dirs::home_dir() {
        let courier_dir = home_dir.join(".config").join("courier");
        paths.extend(EXTENSIONS.iter().map(|ext| courier_dir.join(format!("operations.{}", ext))));
    }

    paths
}

/// Resolve the operations file path
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let searched = default_config_paths();
    searched
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .ok_or(Error::ConfigNotFound { searched })
}

/// Load the operations file into a resolver
pub fn load(explicit: Option<&Path>) -> Result<ConfigResolver> {
    let path = locate(explicit)?;
    tracing::info!(path = %path.display(), "Loading operations file");
    Ok(ConfigResolver::from_file(&path)?)
}
