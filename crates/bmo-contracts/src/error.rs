//! Error types for the BMO decision audit ledger.
//!
//! Every fallible ledger operation returns `BmoResult<T>`. A broken hash
//! chain is NOT an error: verification reports it as a value so callers can
//! act on it.

use thiserror::Error;

/// The unified error type for the ledger crates.
#[derive(Debug, Error)]
pub enum BmoError {
    /// A payload could not be turned into its stable text form.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// The requested digest algorithm is not compiled into this build.
    ///
    /// Raised once at startup while resolving the hasher; never per call.
    #[error("digest algorithm '{algorithm}' is not available in this build")]
    UnsupportedAlgorithm { algorithm: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// No decision with this identifier is known to the store.
    #[error("decision '{decision_id}' not found")]
    DecisionNotFound { decision_id: String },

    /// A decision with this identifier was already recorded.
    #[error("decision '{decision_id}' already exists")]
    DuplicateDecision { decision_id: String },

    /// Another append reached the chain first.
    ///
    /// The caller computed its link from `expected` but the chain tail is now
    /// `actual`. Persisting anyway would fork the chain.
    #[error("chain conflict on decision '{decision_id}': expected tail {expected}, found {actual}")]
    ChainConflict {
        decision_id: String,
        expected: String,
        actual: String,
    },

    /// A decision payload or event input failed validation.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The backing store could not complete the operation.
    #[error("store failure: {reason}")]
    StoreFailed { reason: String },
}

/// Convenience alias used throughout the ledger crates.
pub type BmoResult<T> = Result<T, BmoError>;
