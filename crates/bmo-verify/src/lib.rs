//! # bmo-verify
//!
//! Verification for the BMO decision audit ledger.
//!
//! This crate provides:
//!
//! 1. [`engine::ForwardChainVerifier`], which implements
//!    [`bmo_core::traits::ChainVerifier`] by replaying every link from the
//!    anchor forward and reporting the first one that does not recompute.
//! 2. [`schema::SchemaValidator`], which implements
//!    [`bmo_core::traits::InputValidator`] with JSON Schema checks on decision
//!    payloads and event inputs.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use bmo_verify::{ForwardChainVerifier, SchemaValidator};
//!
//! let verifier = ForwardChainVerifier::new(hasher.clone());
//! let report = verifier.verify(&decision.hash, &events);
//! if !report.valid {
//!     eprintln!("tampering detected at event {:?}", report.broken_at);
//! }
//! ```

pub mod engine;
pub mod schema;

pub use engine::{verify_chain, ForwardChainVerifier};
pub use schema::SchemaValidator;

// ── Tests ─────────────────────────────────────────────────────────────────────
