//! Engine configuration loading from engine.toml
//!
//! The only tunable the engine exposes is sale-number generation; every
//! lifecycle rule and the visibility policy are fixed at design time on
//! purpose. Embedders without a config file get [`EngineConfig::default`].

use serde::Deserialize;
use std::path::Path;

use crate::errors::{Error, Result};

/// Configuration structure representing the entire engine.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sale number generation settings
    pub sale_numbering: SaleNumberingConfig,
}

/// Settings for human-readable sale number generation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SaleNumberingConfig {
    /// Prefix on every sale number, e.g. "SO" for "SO-20260807-1A2B3C"
    pub prefix: String,
    /// Whether to include the UTC date stamp segment
    pub date_stamp: bool,
}

impl Default for SaleNumberingConfig {
    fn default() -> Self {
        Self {
            prefix: "SO".to_string(),
            date_stamp: true,
        }
    }
}

/// Loads engine configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses engine configuration from a TOML string
pub fn parse_config(contents: &str) -> Result<EngineConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse engine.toml: {e}"),
    })
}
