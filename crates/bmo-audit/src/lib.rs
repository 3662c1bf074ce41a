//! # bmo-audit
//!
//! Append-only, hash-chained audit trail for BMO decisions.
//!
//! ## Overview
//!
//! A decision is anchored by hashing the stable serialization of its payload.
//! Every later action on it (comment, resolution, escalation) is linked to
//! its predecessor with `digest(previous + "|" + stable_serialize(fields))`.
//! Changing, reordering or removing an interior event breaks the chain at a
//! detectable position.
//!
//! The digest is SHA3-256 when the `sha3` feature is compiled in (the
//! default) and SHA-256 otherwise, chosen once per process.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bmo_audit::{ChainBuilder, InMemoryAuditStore, ShaDigester};
//! use bmo_contracts::digest::AlgorithmPreference;
//!
//! let digester = ShaDigester::from_preference(AlgorithmPreference::Auto)?;
//! let hasher = Arc::new(ChainBuilder::new(Arc::new(digester)));
//! let store = InMemoryAuditStore::new();
//! ```
//!
//! ## Known limitation
//!
//! A hash chain cannot detect truncation of its tail: deleting the last N
//! events leaves a shorter chain that still verifies. Detecting that needs an
//! externally held "last known length" or tail hash.

pub mod canonical;
pub mod chain;
pub mod digest;
pub mod memory;

pub use canonical::{stable_serialize, stable_serialize_bounded};
pub use chain::ChainBuilder;
pub use digest::ShaDigester;
pub use memory::InMemoryAuditStore;

// ── Tests ─────────────────────────────────────────────────────────────────────
