//! Decision records: the anchors of every audit chain.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::DigestAlgorithm;

/// Unique identifier of a decision record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecisionId(pub uuid::Uuid);

impl DecisionId {
    /// Create a new, unique decision ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for DecisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A finalized governance or validation decision (arbitration ruling,
/// payment validation, ...).
///
/// Immutable once created. `hash` is the digest of the stable serialization
/// of `payload`, computed exactly once when the record is created; it is the
/// anchor every subsequent `AuditEvent` chains from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRecord {
    pub id: DecisionId,

    /// The actor who took the decision.
    pub decided_by: String,

    /// Free-form structured decision content: option chosen, motif, timestamp.
    pub payload: serde_json::Value,

    /// Anchor hash (lowercase hex) over `payload` only.
    pub hash: String,

    /// The digest algorithm that produced `hash` and every link after it.
    pub algorithm: DigestAlgorithm,

    /// Wall-clock creation time (UTC). Not covered by `hash`.
    pub created_at: DateTime<Utc>,
}
