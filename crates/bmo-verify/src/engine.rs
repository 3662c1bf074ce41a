//! Chain replay verification.
//!
//! The verifier walks the stored events from oldest to newest:
//!
//! 1. `running = anchor_hash`
//! 2. for each event `i`: `expected = hash_chain(running, fields_i)`; if it
//!    differs from the stored `chain_hash`, the chain is broken at `i`
//! 3. otherwise `running = chain_hash_i` and continue
//!
//! Older tooling described this check as a walk from the newest event back
//! to the oldest. Both directions test the same per-link invariant; the
//! forward walk is used here and reports the earliest broken index.
//!
//! Detected: edited action/actor/details, reordered events, a removed
//! interior event, events forged without `hash_chain`. Not detected: removal
//! of the last N events, since the shorter chain is still well formed.

use std::sync::Arc;

use tracing::{debug, warn};

use bmo_contracts::{event::AuditEvent, verify::ChainVerification};
use bmo_core::traits::{ChainHasher, ChainVerifier};

/// Replay `events` against `anchor_hash` with `hasher`.
///
/// An empty sequence is trivially valid.
pub fn verify_chain(hasher: &dyn ChainHasher, anchor_hash: &str, events: &[AuditEvent]) -> ChainVerification {
    let mut running = anchor_hash;

    for (index, event) in events.iter().enumerate() {
        let expected = hasher.hash_chain(running, &event.fields);
        if expected != event.chain_hash {
            warn!(
                decision_id = %event.decision_id,
                index,
                sequence = event.sequence,
                "chain link does not recompute"
            );
            return ChainVerification::broken(index);
        }
        running = event.chain_hash.as_str();
    }

    debug!(event_count = events.len(), "chain replay complete");
    ChainVerification::intact()
}

/// A `ChainVerifier` that replays links with a shared `ChainHasher`.
///
/// Use the same hasher instance (and therefore the same algorithm) the chain
/// was built with.
pub struct ForwardChainVerifier {
    hasher: Arc<dyn ChainHasher>,
}

impl ForwardChainVerifier {
    pub fn new(hasher: Arc<dyn ChainHasher>) -> Self {
        Self { hasher }
    }
}

impl ChainVerifier for ForwardChainVerifier {
    fn verify(&self, anchor_hash: &str, events: &[AuditEvent]) -> ChainVerification {
        verify_chain(self.hasher.as_ref(), anchor_hash, events)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
