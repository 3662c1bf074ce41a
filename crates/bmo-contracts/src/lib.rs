//! # bmo-contracts
//!
//! Shared types and error definitions for the BMO decision audit ledger.
//!
//! Every crate in the workspace imports from here. No hashing or storage
//! logic lives in this crate, only data definitions and the error type.

pub mod decision;
pub mod digest;
pub mod document;
pub mod error;
pub mod event;
pub mod limits;
pub mod verify;
