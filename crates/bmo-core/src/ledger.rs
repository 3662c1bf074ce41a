//! The decision ledger: anchors decisions and appends chained audit events.
//!
//! Every operation follows the same order:
//!
//!   Validate → Hash → Persist (conditional on the tail) → Log
//!
//! The ledger never decides which digest algorithm is active; it uses the
//! one its `ChainHasher` was built with and refuses to mix algorithms within
//! one decision's chain.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use bmo_contracts::{
    decision::{DecisionId, DecisionRecord},
    document::LedgerDocument,
    error::{BmoError, BmoResult},
    event::{AuditEvent, EventFields},
    verify::IntegrityReport,
};

use crate::traits::{AuditStore, ChainHasher, ChainVerifier, InputValidator};

/// Wires a hasher, a store and a verifier into the decision audit workflow.
///
/// The hasher is shared (`Arc`) because verifiers usually replay links with
/// the very same instance.
pub struct DecisionLedger {
    hasher: Arc<dyn ChainHasher>,
    store: Box<dyn AuditStore>,
    verifier: Box<dyn ChainVerifier>,
    validator: Option<Box<dyn InputValidator>>,
}

impl DecisionLedger {
    /// Create a ledger without input validation.
    pub fn new(
        hasher: Arc<dyn ChainHasher>,
        store: Box<dyn AuditStore>,
        verifier: Box<dyn ChainVerifier>,
    ) -> Self {
        Self { hasher, store, verifier, validator: None }
    }

    /// Validate every decision payload and event before hashing it.
    pub fn with_validator(mut self, validator: Box<dyn InputValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Anchor a finalized decision.
    ///
    /// Computes `hash_decision(payload)` once and persists the new record.
    /// The anchor is never recomputed afterwards except to verify it.
    pub fn record_decision(
        &self,
        decided_by: impl Into<String>,
        payload: Value,
    ) -> BmoResult<DecisionRecord> {
        if let Some(validator) = &self.validator {
            validator.validate_decision(&payload)?;
        }

        let hash = self.hasher.hash_decision(&payload)?;
        let record = DecisionRecord {
            id: DecisionId::new(),
            decided_by: decided_by.into(),
            payload,
            hash,
            algorithm: self.hasher.algorithm(),
            created_at: Utc::now(),
        };

        self.store.insert_decision(record.clone())?;

        info!(
            decision_id = %record.id,
            decided_by = %record.decided_by,
            algorithm = %record.algorithm,
            anchor = %record.hash,
            "decision anchored"
        );

        Ok(record)
    }

    /// Append one audit event to a decision's chain.
    ///
    /// Reads the current tail, links the event to it, and persists the event
    /// only if the tail has not moved in the meantime. A concurrent append
    /// surfaces as `BmoError::ChainConflict`; no retry happens here.
    pub fn append_event(&self, decision_id: &DecisionId, fields: EventFields) -> BmoResult<AuditEvent> {
        if let Some(validator) = &self.validator {
            validator.validate_event(&fields)?;
        }

        let record = self.store.decision(decision_id)?;
        self.ensure_same_algorithm(&record)?;

        let tail = self.store.tail(decision_id)?;
        let chain_hash = self.hasher.hash_chain(&tail.hash, &fields);

        debug!(
            decision_id = %decision_id,
            sequence = tail.next_sequence,
            action = %fields.action,
            previous = %tail.hash,
            "linking audit event"
        );

        let event = AuditEvent {
            sequence: tail.next_sequence,
            decision_id: *decision_id,
            fields,
            chain_hash,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.append(&tail.hash, event.clone()) {
            if matches!(e, BmoError::ChainConflict { .. }) {
                warn!(decision_id = %decision_id, error = %e, "concurrent append rejected");
            }
            return Err(e);
        }

        info!(
            decision_id = %decision_id,
            sequence = event.sequence,
            action = %event.fields.action,
            actor = %event.fields.actor_name,
            "audit event appended"
        );

        Ok(event)
    }

    /// Check a decision's anchor and replay its whole chain.
    ///
    /// Tampering is reported in the returned `IntegrityReport`; `Err` means
    /// the check itself could not run (unknown decision, algorithm mismatch,
    /// store failure).
    pub fn verify_decision(&self, decision_id: &DecisionId) -> BmoResult<IntegrityReport> {
        let record = self.store.decision(decision_id)?;
        self.ensure_same_algorithm(&record)?;

        let anchor_valid = self.hasher.anchor_matches(&record.payload, &record.hash);
        let events = self.store.events(decision_id)?;
        let chain = self.verifier.verify(&record.hash, &events);

        let report = IntegrityReport {
            decision_id: *decision_id,
            algorithm: record.algorithm,
            anchor_valid,
            chain,
            event_count: events.len(),
        };

        if report.is_intact() {
            debug!(
                decision_id = %decision_id,
                event_count = report.event_count,
                "decision chain verified"
            );
        } else {
            warn!(
                decision_id = %decision_id,
                anchor_valid,
                broken_at = ?chain.broken_at,
                event_count = report.event_count,
                "decision chain integrity check failed"
            );
        }

        Ok(report)
    }

    /// Export a decision with its events, e.g. for persistence to disk.
    pub fn export(&self, decision_id: &DecisionId) -> BmoResult<LedgerDocument> {
        self.store.document(decision_id)
    }

    fn ensure_same_algorithm(&self, record: &DecisionRecord) -> BmoResult<()> {
        let active = self.hasher.algorithm();
        if record.algorithm != active {
            return Err(BmoError::ConfigError {
                reason: format!(
                    "decision '{}' was hashed with {} but this process uses {}",
                    record.id, record.algorithm, active
                ),
            });
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use serde_json::{json, Value};

    use bmo_contracts::{
        decision::{DecisionId, DecisionRecord},
        digest::DigestAlgorithm,
        error::{BmoError, BmoResult},
        event::{AuditEvent, EventFields},
        verify::ChainVerification,
    };

    use crate::traits::{AuditStore, ChainHasher, ChainTail, ChainVerifier, InputValidator};

    use super::DecisionLedger;

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// A transparent "hasher" that builds readable strings instead of digests.
    struct MockHasher {
        algorithm: DigestAlgorithm,
    }

    impl ChainHasher for MockHasher {
        fn algorithm(&self) -> DigestAlgorithm {
            self.algorithm
        }

        fn hash_decision(&self, payload: &Value) -> BmoResult<String> {
            Ok(format!("anchor({payload})"))
        }

        fn anchor_matches(&self, payload: &Value, anchor_hash: &str) -> bool {
            format!("anchor({payload})") == anchor_hash
        }

        fn hash_chain(&self, previous_hash: &str, fields: &EventFields) -> String {
            format!("{previous_hash}>{}", fields.action)
        }
    }

    /// An in-memory store that records every append for later inspection.
    #[derive(Default)]
    struct MockStore {
        decisions: Mutex<HashMap<DecisionId, DecisionRecord>>,
        events: Arc<Mutex<Vec<AuditEvent>>>,
        /// When set, `append` reports this tail instead of the real one.
        moved_tail: Option<String>,
    }

    impl AuditStore for MockStore {
        fn insert_decision(&self, record: DecisionRecord) -> BmoResult<()> {
            self.decisions.lock().unwrap().insert(record.id, record);
            Ok(())
        }

        fn decision(&self, id: &DecisionId) -> BmoResult<DecisionRecord> {
            self.decisions
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| BmoError::DecisionNotFound { decision_id: id.to_string() })
        }

        fn tail(&self, id: &DecisionId) -> BmoResult<ChainTail> {
            let record = self.decision(id)?;
            let events = self.events.lock().unwrap();
            Ok(ChainTail {
                hash: events.last().map(|e| e.chain_hash.clone()).unwrap_or(record.hash),
                next_sequence: events.len() as u64,
            })
        }

        fn append(&self, expected_previous: &str, event: AuditEvent) -> BmoResult<()> {
            if let Some(actual) = &self.moved_tail {
                return Err(BmoError::ChainConflict {
                    decision_id: event.decision_id.to_string(),
                    expected: expected_previous.to_string(),
                    actual: actual.clone(),
                });
            }
            self.events.lock().unwrap().push(event);
            Ok(())
        }

        fn events(&self, _id: &DecisionId) -> BmoResult<Vec<AuditEvent>> {
            Ok(self.events.lock().unwrap().clone())
        }
    }

    /// A verifier that returns a fixed outcome and remembers what it saw.
    struct MockVerifier {
        outcome: ChainVerification,
        seen: Arc<Mutex<Vec<(String, usize)>>>,
    }

    impl ChainVerifier for MockVerifier {
        fn verify(&self, anchor_hash: &str, events: &[AuditEvent]) -> ChainVerification {
            self.seen.lock().unwrap().push((anchor_hash.to_string(), events.len()));
            self.outcome
        }
    }

    /// Rejects any event whose action is empty.
    struct MockValidator;

    impl InputValidator for MockValidator {
        fn validate_decision(&self, payload: &Value) -> BmoResult<()> {
            if payload.is_object() {
                Ok(())
            } else {
                Err(BmoError::InvalidInput { reason: "payload must be an object".to_string() })
            }
        }

        fn validate_event(&self, fields: &EventFields) -> BmoResult<()> {
            if fields.action.is_empty() {
                Err(BmoError::InvalidInput { reason: "action is empty".to_string() })
            } else {
                Ok(())
            }
        }
    }

    fn make_ledger(store: MockStore, outcome: ChainVerification) -> (DecisionLedger, Arc<Mutex<Vec<(String, usize)>>>) {
        let seen = Arc::new(Mutex::new(vec![]));
        let ledger = DecisionLedger::new(
            Arc::new(MockHasher { algorithm: DigestAlgorithm::Sha3_256 }),
            Box::new(store),
            Box::new(MockVerifier { outcome, seen: seen.clone() }),
        );
        (ledger, seen)
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    /// A recorded decision carries the hasher's anchor and algorithm.
    #[test]
    fn test_record_decision_anchors_payload() {
        let (ledger, _) = make_ledger(MockStore::default(), ChainVerification::intact());

        let record = ledger
            .record_decision("Direction BMO", json!({ "option": "A" }))
            .unwrap();

        assert_eq!(record.hash, r#"anchor({"option":"A"})"#);
        assert_eq!(record.algorithm, DigestAlgorithm::Sha3_256);
        assert_eq!(record.decided_by, "Direction BMO");

        let exported = ledger.export(&record.id).unwrap();
        assert_eq!(exported.decision.hash, record.hash);
        assert!(exported.events.is_empty());
    }

    /// Each appended event chains from the previous tail, starting at the anchor.
    #[test]
    fn test_append_chains_from_tail() {
        let store = MockStore::default();
        let events = store.events.clone();
        let (ledger, _) = make_ledger(store, ChainVerification::intact());

        let record = ledger.record_decision("DG", json!({ "option": "B" })).unwrap();
        let first = ledger
            .append_event(&record.id, EventFields::new("commented", "A. DIALLO"))
            .unwrap();
        let second = ledger
            .append_event(&record.id, EventFields::new("resolved", "M. KANE"))
            .unwrap();

        assert_eq!(first.chain_hash, format!("{}>commented", record.hash));
        assert_eq!(second.chain_hash, format!("{}>resolved", first.chain_hash));
        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 1);
        assert_eq!(events.lock().unwrap().len(), 2);
    }

    /// Appending to an unknown decision fails without touching the store.
    #[test]
    fn test_append_unknown_decision() {
        let store = MockStore::default();
        let events = store.events.clone();
        let (ledger, _) = make_ledger(store, ChainVerification::intact());

        let err = ledger
            .append_event(&DecisionId::new(), EventFields::new("commented", "X"))
            .unwrap_err();

        assert!(matches!(err, BmoError::DecisionNotFound { .. }));
        assert!(events.lock().unwrap().is_empty());
    }

    /// A store-side conflict is propagated unchanged.
    #[test]
    fn test_append_conflict_propagates() {
        let store = MockStore {
            moved_tail: Some("someone-else".to_string()),
            ..MockStore::default()
        };
        let (ledger, _) = make_ledger(store, ChainVerification::intact());

        let record = ledger.record_decision("DG", json!({ "option": "C" })).unwrap();
        let err = ledger
            .append_event(&record.id, EventFields::new("escalated", "B. SOW"))
            .unwrap_err();

        match err {
            BmoError::ChainConflict { expected, actual, .. } => {
                assert_eq!(expected, record.hash);
                assert_eq!(actual, "someone-else");
            }
            other => panic!("expected ChainConflict, got {:?}", other),
        }
    }

    /// Verification hands the anchor and all events to the verifier.
    #[test]
    fn test_verify_uses_anchor_and_events() {
        let (ledger, seen) = make_ledger(MockStore::default(), ChainVerification::intact());

        let record = ledger.record_decision("DG", json!({ "option": "A" })).unwrap();
        ledger.append_event(&record.id, EventFields::new("commented", "A")).unwrap();
        ledger.append_event(&record.id, EventFields::new("resolved", "B")).unwrap();

        let report = ledger.verify_decision(&record.id).unwrap();

        assert!(report.is_intact());
        assert!(report.anchor_valid);
        assert_eq!(report.event_count, 2);
        assert_eq!(seen.lock().unwrap().as_slice(), &[(record.hash.clone(), 2)]);
    }

    /// A broken chain is a report, not an error.
    #[test]
    fn test_verify_reports_broken_chain() {
        let (ledger, _) = make_ledger(MockStore::default(), ChainVerification::broken(1));

        let record = ledger.record_decision("DG", json!({ "option": "A" })).unwrap();
        let report = ledger.verify_decision(&record.id).unwrap();

        assert!(!report.is_intact());
        assert_eq!(report.chain.broken_at, Some(1));
    }

    /// Altering the stored payload invalidates the anchor.
    #[test]
    fn test_verify_detects_payload_change() {
        let store = MockStore::default();
        let (ledger, _) = make_ledger(store, ChainVerification::intact());
        let record = ledger.record_decision("DG", json!({ "option": "A" })).unwrap();

        // Rebuild a ledger over a store holding a modified payload.
        let tampered = MockStore::default();
        let mut forged = record.clone();
        forged.payload = json!({ "option": "B" });
        tampered.insert_decision(forged).unwrap();
        let (ledger, _) = make_ledger(tampered, ChainVerification::intact());

        let report = ledger.verify_decision(&record.id).unwrap();
        assert!(!report.anchor_valid);
        assert!(!report.is_intact());
    }

    /// A decision hashed under another algorithm cannot be extended or checked.
    #[test]
    fn test_algorithm_mismatch_is_config_error() {
        let store = MockStore::default();
        store
            .insert_decision(DecisionRecord {
                id: DecisionId::new(),
                decided_by: "DG".to_string(),
                payload: json!({}),
                hash: "h".to_string(),
                algorithm: DigestAlgorithm::Sha256,
                created_at: chrono::Utc::now(),
            })
            .unwrap();
        let id = *store.decisions.lock().unwrap().keys().next().unwrap();
        let (ledger, _) = make_ledger(store, ChainVerification::intact());

        let err = ledger.verify_decision(&id).unwrap_err();
        assert!(matches!(err, BmoError::ConfigError { .. }));

        let err = ledger.append_event(&id, EventFields::new("commented", "A")).unwrap_err();
        assert!(matches!(err, BmoError::ConfigError { .. }));
    }

    /// The validator runs before anything is hashed or stored.
    #[test]
    fn test_validator_rejects_bad_input() {
        let store = MockStore::default();
        let events = store.events.clone();
        let (ledger, _) = make_ledger(store, ChainVerification::intact());
        let ledger = ledger.with_validator(Box::new(MockValidator));

        let err = ledger.record_decision("DG", json!("not an object")).unwrap_err();
        assert!(matches!(err, BmoError::InvalidInput { .. }));

        let record = ledger.record_decision("DG", json!({ "option": "A" })).unwrap();
        let err = ledger.append_event(&record.id, EventFields::new("", "A")).unwrap_err();
        assert!(matches!(err, BmoError::InvalidInput { .. }));
        assert!(events.lock().unwrap().is_empty());
    }
}
