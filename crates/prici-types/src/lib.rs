//! Prici Types - Shared domain types
//!
//! This crate contains the entitlement state types exchanged with the
//! quota service:
//! - Field kinds and per-field state
//! - The allow/deny result returned by a field state query

pub mod field;

pub use field::*;
