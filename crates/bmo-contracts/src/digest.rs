//! Digest algorithm identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BmoError;

/// A concrete 256-bit digest algorithm used to build hash chains.
///
/// Which one is active is decided once per process. Hashes produced under one
/// algorithm are never comparable with hashes produced under the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    #[serde(rename = "sha3-256")]
    Sha3_256,
    #[serde(rename = "sha256")]
    Sha256,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha3_256 => "sha3-256",
            DigestAlgorithm::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the operator asked for in configuration.
///
/// `Auto` prefers SHA3-256 and falls back to SHA-256 when the build lacks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlgorithmPreference {
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "sha3-256")]
    Sha3_256,
    #[serde(rename = "sha256")]
    Sha256,
}

impl FromStr for AlgorithmPreference {
    type Err = BmoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(AlgorithmPreference::Auto),
            "sha3-256" | "sha3_256" | "sha3" => Ok(AlgorithmPreference::Sha3_256),
            "sha256" | "sha-256" => Ok(AlgorithmPreference::Sha256),
            other => Err(BmoError::ConfigError {
                reason: format!("unknown digest algorithm '{other}'"),
            }),
        }
    }
}
