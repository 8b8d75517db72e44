//! Shared identity and canonicalization for AXM Embodied Genesis.
//!
//! This crate is the single source of truth for two things both the
//! compiler and the verifier must agree on byte-for-byte: the
//! deterministic ID scheme (C1) and the wire-level protocol constants
//! (C2). Neither side imports the other's judgement logic — only these
//! shared constants and pure functions.

pub mod ids;
pub mod protocol;

pub use ids::{canonicalize, claim_id, entity_id, prov_id, span_id};
