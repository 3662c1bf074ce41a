//! JSON Schema validation of ledger inputs.
//!
//! `SchemaValidator` implements the `InputValidator` trait from `bmo-core`.
//! Schemas are compiled once at construction; every violation found in an
//! input is collected into a single `InvalidInput` error so operators see the
//! full failure set in one pass.

use serde_json::{json, Value};
use tracing::{debug, warn};

use bmo_contracts::{
    error::{BmoError, BmoResult},
    event::EventFields,
};
use bmo_core::traits::InputValidator;

/// Decision payloads: any JSON object with at least one property.
pub fn default_decision_schema() -> Value {
    json!({
        "type": "object",
        "minProperties": 1
    })
}

/// Event inputs: `{action, actorName, details?}` and nothing else.
pub fn event_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "action": { "type": "string", "minLength": 1 },
            "actorName": { "type": "string", "minLength": 1 },
            "details": { "type": ["string", "null"] }
        },
        "required": ["action", "actorName"],
        "additionalProperties": false
    })
}

/// Validates decision payloads and event inputs against JSON Schemas.
pub struct SchemaValidator {
    decision: jsonschema::Validator,
    event: jsonschema::Validator,
}

impl SchemaValidator {
    /// Build a validator with the default decision schema.
    pub fn new() -> BmoResult<Self> {
        Self::with_decision_schema(&default_decision_schema())
    }

    /// Build a validator with a caller-supplied decision payload schema.
    ///
    /// Returns `BmoError::ConfigError` if the schema document does not compile.
    pub fn with_decision_schema(schema: &Value) -> BmoResult<Self> {
        Ok(Self {
            decision: compile("decision", schema)?,
            event: compile("event", &event_schema())?,
        })
    }

    /// Validate a raw event input, e.g. the body of an administrative request.
    pub fn validate_event_value(&self, input: &Value) -> BmoResult<()> {
        check("event", &self.event, input)
    }
}

fn compile(name: &str, schema: &Value) -> BmoResult<jsonschema::Validator> {
    jsonschema::validator_for(schema).map_err(|e| BmoError::ConfigError {
        reason: format!("invalid {name} JSON Schema: {e}"),
    })
}

fn check(name: &str, validator: &jsonschema::Validator, instance: &Value) -> BmoResult<()> {
    let violations: Vec<String> = validator
        .iter_errors(instance)
        .map(|error| format!("{} at '{}': {}", name, error.instance_path, error))
        .collect();

    if violations.is_empty() {
        debug!(input = name, "input validated");
        return Ok(());
    }

    warn!(input = name, violation_count = violations.len(), "input rejected");
    Err(BmoError::InvalidInput {
        reason: violations.join("; "),
    })
}

impl InputValidator for SchemaValidator {
    fn validate_decision(&self, payload: &Value) -> BmoResult<()> {
        check("decision", &self.decision, payload)
    }

    fn validate_event(&self, fields: &EventFields) -> BmoResult<()> {
        let value = serde_json::to_value(fields).map_err(|e| BmoError::Serialization {
            reason: format!("failed to encode event fields: {e}"),
        })?;
        self.validate_event_value(&value)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
