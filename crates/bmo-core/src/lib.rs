//! # bmo-core
//!
//! The decision ledger service for BMO's hash-chained audit trail.
//!
//! This crate provides:
//! - The trait seams (`Digester`, `ChainHasher`, `AuditStore`,
//!   `ChainVerifier`, `InputValidator`)
//! - The `DecisionLedger` that wires them together so that every append is
//!   chained from the tail the store actually holds
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bmo_core::{DecisionLedger, traits::{AuditStore, ChainHasher, ChainVerifier}};
//! ```

pub mod ledger;
pub mod traits;

pub use ledger::DecisionLedger;
