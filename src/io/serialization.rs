// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Configuration file serialization and deserialization.
//!
//! This module reads application configuration from YAML or JSON files,
//! choosing the format from the file extension, and renders the active
//! configuration back to YAML.

use crate::config::AppConfig;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Render configuration as YAML.
pub fn export_yaml(config: &AppConfig) -> Result<String> {
    Ok(serde_yaml::to_string(config)?)
}

/// Import configuration from YAML format.
pub fn import_yaml(path: &Path) -> Result<AppConfig> {
    let yaml = std::fs::read_to_string(path)?;
    let config = serde_yaml::from_str(&yaml)?;
    Ok(config)
}

/// Import configuration from JSON format.
pub fn import_json(path: &Path) -> Result<AppConfig> {
    let json = std::fs::read_to_string(path)?;
    let config = serde_json::from_str(&json)?;
    Ok(config)
}

/// Import configuration, picking the parser from the file extension.
pub fn import_config(path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|s| s.to_str());
    let config = match extension {
        Some("yaml") | Some("yml") => import_yaml(path),
        Some("json") => import_json(path),
        _ => bail!("Unsupported config extension: {:?}", extension),
    }
    .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    log::info!("Loaded configuration from {}", path.display());
    Ok(config)
}
