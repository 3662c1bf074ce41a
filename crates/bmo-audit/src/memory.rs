//! In-memory implementation of `AuditStore`.
//!
//! `InMemoryAuditStore` keeps every decision and its chain behind one
//! `Mutex`. The tail check and the push in `append()` happen under the same
//! lock, which is what serializes "read tail, compute link, persist" per
//! decision: a writer that computed its link from a stale tail is rejected
//! with `ChainConflict` instead of forking the chain.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use bmo_contracts::{
    decision::{DecisionId, DecisionRecord},
    document::LedgerDocument,
    error::{BmoError, BmoResult},
    event::AuditEvent,
};
use bmo_core::traits::{AuditStore, ChainTail};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct StoredChain {
    pub(crate) record: DecisionRecord,
    /// Events in append order.
    pub(crate) events: Vec<AuditEvent>,
}

impl StoredChain {
    fn tail_hash(&self) -> &str {
        self.events
            .last()
            .map(|e| e.chain_hash.as_str())
            .unwrap_or(self.record.hash.as_str())
    }
}

// ── Public store ──────────────────────────────────────────────────────────────

/// An append-only, in-process decision store.
///
/// Clones share the same underlying state.
#[derive(Clone, Default)]
pub struct InMemoryAuditStore {
    pub(crate) state: Arc<Mutex<HashMap<DecisionId, StoredChain>>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a previously exported document as-is.
    ///
    /// The chain is NOT verified on import: a tampered document loads fine
    /// and is only reported as broken when verified.
    pub fn import(&self, document: LedgerDocument) -> BmoResult<()> {
        let mut state = self.lock()?;
        let id = document.decision.id;
        if state.contains_key(&id) {
            return Err(BmoError::DuplicateDecision { decision_id: id.to_string() });
        }

        debug!(decision_id = %id, event_count = document.events.len(), "ledger document imported");

        state.insert(
            id,
            StoredChain { record: document.decision, events: document.events },
        );
        Ok(())
    }

    /// Build a store holding a single imported document.
    pub fn from_document(document: LedgerDocument) -> BmoResult<Self> {
        let store = Self::new();
        store.import(document)?;
        Ok(store)
    }

    /// Number of decisions currently held.
    pub fn len(&self) -> BmoResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> BmoResult<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> BmoResult<MutexGuard<'_, HashMap<DecisionId, StoredChain>>> {
        self.state.lock().map_err(|e| BmoError::StoreFailed {
            reason: format!("audit store lock poisoned: {}", e),
        })
    }
}

fn not_found(id: &DecisionId) -> BmoError {
    BmoError::DecisionNotFound { decision_id: id.to_string() }
}

// ── AuditStore impl ───────────────────────────────────────────────────────────

impl AuditStore for InMemoryAuditStore {
    fn insert_decision(&self, record: DecisionRecord) -> BmoResult<()> {
        let mut state = self.lock()?;
        if state.contains_key(&record.id) {
            return Err(BmoError::DuplicateDecision { decision_id: record.id.to_string() });
        }
        state.insert(record.id, StoredChain { record, events: Vec::new() });
        Ok(())
    }

    fn decision(&self, id: &DecisionId) -> BmoResult<DecisionRecord> {
        let state = self.lock()?;
        state.get(id).map(|c| c.record.clone()).ok_or_else(|| not_found(id))
    }

    fn tail(&self, id: &DecisionId) -> BmoResult<ChainTail> {
        let state = self.lock()?;
        let chain = state.get(id).ok_or_else(|| not_found(id))?;
        Ok(ChainTail {
            hash: chain.tail_hash().to_string(),
            next_sequence: chain.events.len() as u64,
        })
    }

    /// Append `event` if the chain tail is still `expected_previous`.
    ///
    /// The event's `sequence` must also be the next free position; a caller
    /// that skipped or reused a position is treated like a stale tail.
    fn append(&self, expected_previous: &str, event: AuditEvent) -> BmoResult<()> {
        let mut state = self.lock()?;
        let id = event.decision_id;
        let chain = state.get_mut(&id).ok_or_else(|| not_found(&id))?;

        let actual = chain.tail_hash();
        if actual != expected_previous || event.sequence != chain.events.len() as u64 {
            warn!(
                decision_id = %id,
                expected = %expected_previous,
                actual = %actual,
                sequence = event.sequence,
                "append rejected: chain tail moved"
            );
            return Err(BmoError::ChainConflict {
                decision_id: id.to_string(),
                expected: expected_previous.to_string(),
                actual: actual.to_string(),
            });
        }

        chain.events.push(event);
        Ok(())
    }

    fn events(&self, id: &DecisionId) -> BmoResult<Vec<AuditEvent>> {
        let state = self.lock()?;
        state.get(id).map(|c| c.events.clone()).ok_or_else(|| not_found(id))
    }
}
