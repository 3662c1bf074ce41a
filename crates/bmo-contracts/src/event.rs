//! Audit events appended to a decision's hash chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decision::DecisionId;

/// The hashed content of one audit event.
///
/// Serializes as `{"action", "actorName", "details"}`. `details` is opaque
/// free text; when absent it serializes as `null` and the key stays present,
/// so an event with and without details never hash the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFields {
    /// What happened: "commented", "resolved", "escalated", ...
    pub action: String,
    /// Display name of the actor, e.g. "A. DIALLO".
    pub actor_name: String,
    #[serde(default)]
    pub details: Option<String>,
}

impl EventFields {
    pub fn new(action: impl Into<String>, actor_name: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            actor_name: actor_name.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// One link in a decision's audit chain.
///
/// Invariant: `chain_hash == hash_chain(previous, fields)` where `previous` is
/// the preceding event's `chain_hash`, or the decision's anchor hash for the
/// first event. Only `fields` and the predecessor feed the hash; the other
/// attributes are storage metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Zero-based position in the chain.
    pub sequence: u64,

    pub decision_id: DecisionId,

    #[serde(flatten)]
    pub fields: EventFields,

    /// Lowercase hex link hash.
    pub chain_hash: String,

    pub created_at: DateTime<Utc>,
}
