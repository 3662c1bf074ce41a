//! Configuration schema deserialized from TOML.
//!
//! Every section and field has a default, so an empty document is a valid
//! configuration:
//!
//! ```toml
//! [hashing]
//! algorithm = "auto"      # "auto" | "sha3-256" | "sha256"
//!
//! [serializer]
//! max_depth = 64
//! ```

use serde::{Deserialize, Serialize};

use bmo_contracts::digest::AlgorithmPreference;
pub use bmo_contracts::limits::DEFAULT_MAX_DEPTH;

/// Digest selection. Resolved once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HashingConfig {
    #[serde(default)]
    pub algorithm: AlgorithmPreference,
}

/// Limits applied by the stable serializer to decision payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerializerConfig {
    /// Maximum array/object nesting; deeper payloads are rejected.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

/// The top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    #[serde(default)]
    pub hashing: HashingConfig,

    #[serde(default)]
    pub serializer: SerializerConfig,
}
