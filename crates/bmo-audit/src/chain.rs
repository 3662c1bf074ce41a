//! Hash-chain primitives: anchor and link computation.
//!
//! Hash inputs (UTF-8 text):
//!   anchor: stable_serialize(payload)
//!   link:   previous_hash + "|" + stable_serialize({action, actorName, details})
//!
//! `previous_hash` is the decision's anchor for the first event and the
//! preceding event's `chain_hash` afterwards.

use std::sync::Arc;

use serde_json::{json, Value};

use bmo_contracts::{digest::DigestAlgorithm, error::BmoResult, event::EventFields};
use bmo_core::traits::{ChainHasher, Digester};

use crate::canonical::{stable_serialize, stable_serialize_bounded, DEFAULT_MAX_DEPTH};

/// Separator between the previous link and the serialized event fields.
pub const LINK_SEPARATOR: char = '|';

/// The JSON object hashed for an event. `details` is always present.
pub fn event_fields_value(fields: &EventFields) -> Value {
    json!({
        "action": fields.action,
        "actorName": fields.actor_name,
        "details": fields.details,
    })
}

/// Builds anchors and links with one digester and a payload depth limit.
#[derive(Clone)]
pub struct ChainBuilder {
    digester: Arc<dyn Digester>,
    max_depth: usize,
}

impl ChainBuilder {
    pub fn new(digester: Arc<dyn Digester>) -> Self {
        Self { digester, max_depth: DEFAULT_MAX_DEPTH }
    }

    /// Override the nesting limit for decision payloads.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl ChainHasher for ChainBuilder {
    fn algorithm(&self) -> DigestAlgorithm {
        self.digester.algorithm()
    }

    fn hash_decision(&self, payload: &Value) -> BmoResult<String> {
        let text = stable_serialize_bounded(payload, self.max_depth)?;
        Ok(self.digester.digest_hex(text.as_bytes()))
    }

    fn anchor_matches(&self, payload: &Value, anchor_hash: &str) -> bool {
        self.digester.digest_hex(stable_serialize(payload).as_bytes()) == anchor_hash
    }

    fn hash_chain(&self, previous_hash: &str, fields: &EventFields) -> String {
        let serialized = stable_serialize(&event_fields_value(fields));
        let mut input = String::with_capacity(previous_hash.len() + 1 + serialized.len());
        input.push_str(previous_hash);
        input.push(LINK_SEPARATOR);
        input.push_str(&serialized);
        self.digester.digest_hex(input.as_bytes())
    }
}
