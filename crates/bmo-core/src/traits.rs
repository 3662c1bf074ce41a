//! Trait definitions for the decision audit chain.
//!
//! - `Digester`       — raw digest primitive (SHA3-256 or SHA-256)
//! - `ChainHasher`    — anchor and link computation over stable serializations
//! - `AuditStore`     — append-only persistence with optimistic concurrency
//! - `ChainVerifier`  — replays a stored chain against its anchor
//! - `InputValidator` — rejects malformed payloads before they are anchored
//!
//! Hashing and verification are pure and may be called from any thread.
//! Ordering of appends to one decision is the store's job, not the hasher's.

use serde_json::Value;

use bmo_contracts::{
    decision::{DecisionId, DecisionRecord},
    digest::DigestAlgorithm,
    document::LedgerDocument,
    error::BmoResult,
    event::{AuditEvent, EventFields},
    verify::ChainVerification,
};

/// A digest primitive whose algorithm was fixed when it was constructed.
pub trait Digester: Send + Sync {
    /// The algorithm every call to `digest_hex` uses.
    fn algorithm(&self) -> DigestAlgorithm;

    /// Digest `input` and return the lowercase hex encoding.
    fn digest_hex(&self, input: &[u8]) -> String;
}

/// Computes anchor hashes and chain links.
///
/// Implementations must be deterministic: identical arguments always yield
/// identical output for the lifetime of the process.
pub trait ChainHasher: Send + Sync {
    fn algorithm(&self) -> DigestAlgorithm;

    /// `digest(stable_serialize(payload))`, the anchor of a new decision.
    ///
    /// Fails only when the payload cannot be serialized (e.g. nesting too deep).
    fn hash_decision(&self, payload: &Value) -> BmoResult<String>;

    /// True when `payload` still hashes to `anchor_hash`.
    ///
    /// Unlike `hash_decision`, no depth limit applies: a payload accepted when
    /// it was anchored stays checkable after the limit is lowered.
    fn anchor_matches(&self, payload: &Value, anchor_hash: &str) -> bool;

    /// `digest(previous_hash + "|" + stable_serialize(fields))`.
    fn hash_chain(&self, previous_hash: &str, fields: &EventFields) -> String;
}

/// The hash an append must chain from, and the sequence it will occupy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTail {
    pub hash: String,
    pub next_sequence: u64,
}

/// Append-only persistence for decisions and their audit events.
///
/// # Concurrency
///
/// "Read tail, compute link, persist" must be serialized per decision or two
/// appends can chain from the same predecessor and silently fork the chain.
/// Stores enforce this optimistically: `append` must fail with
/// `BmoError::ChainConflict` unless `expected_previous` is still the tail.
pub trait AuditStore: Send + Sync {
    /// Persist a new decision. Fails if the identifier already exists.
    fn insert_decision(&self, record: DecisionRecord) -> BmoResult<()>;

    fn decision(&self, id: &DecisionId) -> BmoResult<DecisionRecord>;

    fn tail(&self, id: &DecisionId) -> BmoResult<ChainTail>;

    /// Append `event` if and only if the chain tail still equals
    /// `expected_previous`.
    fn append(&self, expected_previous: &str, event: AuditEvent) -> BmoResult<()>;

    /// All events for the decision, oldest first.
    fn events(&self, id: &DecisionId) -> BmoResult<Vec<AuditEvent>>;

    /// Export one decision and its chain.
    fn document(&self, id: &DecisionId) -> BmoResult<LedgerDocument> {
        Ok(LedgerDocument {
            decision: self.decision(id)?,
            events: self.events(id)?,
        })
    }
}

/// Replays a chain of events against its anchor hash.
///
/// Never fails: a broken link is reported in the returned value.
pub trait ChainVerifier: Send + Sync {
    fn verify(&self, anchor_hash: &str, events: &[AuditEvent]) -> ChainVerification;
}

/// Structural checks on inputs before anything is hashed.
///
/// Returns `BmoError::InvalidInput` describing every violation found.
pub trait InputValidator: Send + Sync {
    fn validate_decision(&self, payload: &Value) -> BmoResult<()>;

    fn validate_event(&self, fields: &EventFields) -> BmoResult<()>;
}
