//! Loading `LedgerConfig` from TOML text or files.

use std::path::Path;

use tracing::debug;

use bmo_contracts::error::{BmoError, BmoResult};

use crate::settings::LedgerConfig;

impl LedgerConfig {
    /// Parse `s` as TOML and validate the result.
    ///
    /// Returns `BmoError::ConfigError` if the TOML is malformed, contains
    /// unknown keys, or carries an invalid value.
    pub fn from_toml_str(s: &str) -> BmoResult<Self> {
        let config: LedgerConfig = toml::from_str(s).map_err(|e| BmoError::ConfigError {
            reason: format!("failed to parse ledger config TOML: {}", e),
        })?;
        config.validate()?;

        debug!(
            algorithm = ?config.hashing.algorithm,
            max_depth = config.serializer.max_depth,
            "ledger configuration loaded"
        );

        Ok(config)
    }

    /// Read the file at `path` and parse it as ledger configuration.
    pub fn from_file(path: &Path) -> BmoResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| BmoError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load `path` when given, otherwise fall back to defaults.
    pub fn load(path: Option<&Path>) -> BmoResult<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> BmoResult<()> {
        if self.serializer.max_depth == 0 {
            return Err(BmoError::ConfigError {
                reason: "serializer.max_depth must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
