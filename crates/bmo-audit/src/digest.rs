//! SHA3-256 / SHA-256 digest selection.
//!
//! The algorithm is resolved exactly once, when the process builds its
//! `ShaDigester`, and never re-probed per call. SHA3-256 is preferred; builds
//! compiled without the `sha3` feature fall back to SHA-256.

use sha2::{Digest, Sha256};
#[cfg(feature = "sha3")]
use sha3::Sha3_256;
use tracing::info;

use bmo_contracts::{
    digest::{AlgorithmPreference, DigestAlgorithm},
    error::{BmoError, BmoResult},
};
use bmo_core::traits::Digester;

/// True when this build can compute SHA3-256.
pub const fn sha3_available() -> bool {
    cfg!(feature = "sha3")
}

/// A digest primitive bound to one algorithm for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaDigester {
    algorithm: DigestAlgorithm,
}

impl ShaDigester {
    /// Resolve `preference` against what this build supports.
    ///
    /// Returns `BmoError::UnsupportedAlgorithm` when SHA3-256 is requested
    /// explicitly but not compiled in. Callers should treat that as fatal at
    /// startup.
    pub fn from_preference(preference: AlgorithmPreference) -> BmoResult<Self> {
        let algorithm = match preference {
            AlgorithmPreference::Auto if sha3_available() => DigestAlgorithm::Sha3_256,
            AlgorithmPreference::Auto => DigestAlgorithm::Sha256,
            AlgorithmPreference::Sha3_256 => DigestAlgorithm::Sha3_256,
            AlgorithmPreference::Sha256 => DigestAlgorithm::Sha256,
        };
        let digester = Self::new(algorithm)?;

        info!(
            preference = ?preference,
            algorithm = %algorithm,
            "digest algorithm resolved"
        );

        Ok(digester)
    }

    /// Bind to a specific algorithm, e.g. the one recorded on a stored decision.
    pub fn new(algorithm: DigestAlgorithm) -> BmoResult<Self> {
        if algorithm == DigestAlgorithm::Sha3_256 && !sha3_available() {
            return Err(BmoError::UnsupportedAlgorithm {
                algorithm: algorithm.to_string(),
            });
        }
        Ok(Self { algorithm })
    }
}

impl Digester for ShaDigester {
    fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    fn digest_hex(&self, input: &[u8]) -> String {
        match self.algorithm {
            #[cfg(feature = "sha3")]
            DigestAlgorithm::Sha3_256 => hex::encode(Sha3_256::digest(input)),
            #[cfg(not(feature = "sha3"))]
            DigestAlgorithm::Sha3_256 => unreachable!("ShaDigester::new rejects SHA3-256 without the sha3 feature"),
            DigestAlgorithm::Sha256 => hex::encode(Sha256::digest(input)),
        }
    }
}
