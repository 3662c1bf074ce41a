//! Integrity verification results.

use serde::{Deserialize, Serialize};

use crate::{decision::DecisionId, digest::DigestAlgorithm};

/// Outcome of replaying a chain of events against its anchor.
///
/// A broken chain is an expected business outcome (tampering detected), so it
/// is reported here rather than as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainVerification {
    pub valid: bool,

    /// Zero-based index of the first event whose link does not recompute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broken_at: Option<usize>,
}

impl ChainVerification {
    pub fn intact() -> Self {
        Self { valid: true, broken_at: None }
    }

    pub fn broken(index: usize) -> Self {
        Self { valid: false, broken_at: Some(index) }
    }
}

/// The full integrity check of one decision, as shown to compliance tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub decision_id: DecisionId,

    pub algorithm: DigestAlgorithm,

    /// True when re-hashing the stored payload reproduces the stored anchor.
    pub anchor_valid: bool,

    pub chain: ChainVerification,

    pub event_count: usize,
}

impl IntegrityReport {
    /// True only when both the anchor and every chain link check out.
    pub fn is_intact(&self) -> bool {
        self.anchor_valid && self.chain.valid
    }
}
