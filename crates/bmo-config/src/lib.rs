//! # bmo-config
//!
//! TOML configuration for the BMO decision audit ledger.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use bmo_config::LedgerConfig;
//!
//! let config = LedgerConfig::from_file(Path::new("bmo-ledger.toml"))?;
//! let digester = ShaDigester::from_preference(config.hashing.algorithm)?;
//! ```
//!
//! The digest preference is read here but resolved by `bmo-audit`, which
//! knows what the build supports.

pub mod loader;
pub mod settings;

pub use settings::{HashingConfig, LedgerConfig, SerializerConfig};

// ── Tests ─────────────────────────────────────────────────────────────────────
