// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the universe configuration.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The base-2 logarithm of the slot-table capacity a production node
/// runs with: 16 777 216 slots, a 768 MiB table.
pub const DEFAULT_UNIVERSE_DEPTH: u32 = 24;

#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("toml deserialization failed: {0}")]
    TomlDeserialization(toml::de::Error),
}

/// Configuration of the asset universe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    /// The base-2 logarithm of the slot-table capacity. Valid values are
    /// 6 to 30; capacity must be provisioned well above the maximum live
    /// record population, since the probe discipline never tolerates a
    /// full table.
    pub depth: u32,
    /// The directory the `universe.NNN` snapshot files are written to.
    pub snapshot_dir: PathBuf,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_UNIVERSE_DEPTH,
            snapshot_dir: PathBuf::from("."),
        }
    }
}

impl UniverseConfig {
    /// Reads a configuration file in `.toml` format.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        fs::read_to_string(&path)
            .map_err(ConfigError::FileRead)
            .and_then(|contents| toml::from_str::<Self>(&contents).map_err(ConfigError::TomlDeserialization))
    }

    /// The path of the snapshot file written at the end of `epoch`.
    pub fn snapshot_path(&self, epoch: u32) -> PathBuf {
        self.snapshot_dir.join(crate::universe::snapshot_file_name(epoch))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn config_file_conformity() -> Result<(), ConfigError> {
        let config = UniverseConfig::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.toml"))?;
        assert_eq!(config, UniverseConfig::default());

        Ok(())
    }

    #[test]
    fn default_is_production_sized() {
        let config = UniverseConfig::default();
        assert_eq!(config.depth, 24);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: UniverseConfig = toml::from_str("depth = 10").unwrap();
        assert_eq!(config.depth, 10);
        assert_eq!(config.snapshot_dir, PathBuf::from("."));
    }

    #[test]
    fn snapshot_path_joins_dir_and_epoch() {
        let config: UniverseConfig = toml::from_str("snapshot_dir = \"/data\"").unwrap();
        assert_eq!(config.snapshot_path(88), PathBuf::from("/data/universe.088"));
    }
}
