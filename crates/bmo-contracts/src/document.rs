//! Portable JSON form of one decision and its audit chain.

use serde::{Deserialize, Serialize};

use crate::{decision::DecisionRecord, event::AuditEvent};

/// A decision record together with its ordered audit events.
///
/// This is what gets written to disk by the CLI and what administrative
/// tooling exchanges. Loading a document does not verify it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerDocument {
    pub decision: DecisionRecord,

    /// Events in chain order (sequence 0 first).
    #[serde(default)]
    pub events: Vec<AuditEvent>,
}

impl LedgerDocument {
    /// The hash the next appended event must chain from.
    pub fn tail_hash(&self) -> &str {
        self.events
            .last()
            .map(|e| e.chain_hash.as_str())
            .unwrap_or(self.decision.hash.as_str())
    }
}
