// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hub config loading.

use accord_core::{ConfigError, HubConfig};
use std::path::Path;

/// Read and validate `config.yaml`. Any error here is fatal at startup.
pub fn load_hub_config(path: &Path) -> Result<HubConfig, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
        Ok(text) => text,
    };
    let config: HubConfig =
        serde_yaml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
