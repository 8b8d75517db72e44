//! Canonical JSON re-serialization, independently implemented from the
//! compiler's (SPEC_FULL.md §9: duplicate the rule in both code paths
//! and let the tests prove they agree, rather than sharing a
//! canonicalization library).
//!
//! `serde_json::Value::Object` is backed by a `BTreeMap` (this crate
//! does not enable `preserve_order`), so parsing a manifest and then
//! serializing it back normalizes key order and whitespace regardless
//! of how the bytes were originally formatted on disk.

use serde_json::Value;

pub fn canonical_json_bytes(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).expect("parsed JSON values are always serializable")
}
