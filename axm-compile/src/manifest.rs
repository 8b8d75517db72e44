//! Manifest Signer (C6): canonical-JSON manifest plus a detached
//! ed25519 signature over its exact bytes.
//!
//! Canonical JSON here means sorted keys, compact separators, UTF-8,
//! no ASCII escaping. `serde_json::Value::Object` is backed by a
//! `BTreeMap` (this crate does not enable the `preserve_order`
//! feature), so building the manifest as a `Value` and serializing
//! that — rather than serializing a `#[derive(Serialize)]` struct
//! directly, which would preserve field-declaration order — is what
//! gets us sorted keys for free. The verifier repeats this exact
//! construction independently (SPEC_FULL.md §9: duplicate the rule in
//! both code paths, let the tests prove they agree).

use ed25519_dalek::{Signer, SigningKey};
use serde_json::{json, Value};

use crate::error::CompileError;

/// The fixed publisher seed baked into both the compiler's default and
/// `--gold`, and mirrored in `governance/trust_store.json` so a
/// freshly compiled Shard verifies without extra setup.
pub const CANONICAL_PUBLISHER_SEED_HEX: &str =
    "a665a45920422f9d417e4867efdc4fb8a04a1f3fff1fa07e998e86f7f7a27ae3";

/// Fixed timestamp used by `--gold` for byte-deterministic shards.
pub const GOLD_TIMESTAMP: &str = "2026-01-01T00:00:00Z";

pub fn signing_key_from_hex(hex_seed: &str) -> Result<SigningKey, CompileError> {
    let bytes = hex::decode(hex_seed)
        .map_err(|e| CompileError::InvalidSigningKey(e.to_string()))?;
    let seed: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CompileError::InvalidSigningKey("seed must be 32 bytes".to_string()))?;
    Ok(SigningKey::from_bytes(&seed))
}

pub fn canonical_publisher_key() -> SigningKey {
    signing_key_from_hex(CANONICAL_PUBLISHER_SEED_HEX).expect("canonical seed is well-formed")
}

/// Build the manifest JSON value (§4.6). `files` must already be
/// sorted; this function does not re-sort it.
pub fn build_manifest(
    capsule_hash: &str,
    integrity_root: &str,
    files: &[String],
    created: &str,
    pubkey_hex: &str,
) -> Value {
    json!({
        "spec": "1.0",
        "created": created,
        "capsule_hash": capsule_hash,
        "merkle_root": integrity_root,
        "integrity": {
            "schema": "axm-merkle-v1",
            "algorithm": "sha256",
            "files": files,
            "merkle_root": integrity_root,
        },
        "publisher": { "pubkey": pubkey_hex },
    })
}

/// Serialize a manifest `Value` as canonical JSON bytes: sorted keys
/// (guaranteed by `Value::Object`'s `BTreeMap` backing), compact
/// separators, UTF-8, no ASCII escaping (`serde_json`'s default
/// formatter does not escape non-ASCII).
pub fn canonical_json_bytes(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).expect("manifest values are always serializable")
}

/// Sign canonical manifest bytes, returning `(manifest_bytes,
/// signature_bytes, pubkey_bytes)`.
pub fn sign_manifest(signing_key: &SigningKey, manifest_bytes: &[u8]) -> ([u8; 64], [u8; 32]) {
    let signature = signing_key.sign(manifest_bytes);
    (signature.to_bytes(), signing_key.verifying_key().to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_bytes_sort_keys() {
        let value = build_manifest("deadbeef", "root", &["b".into(), "a".into()], "2026-01-01T00:00:00Z", "pub");
        let bytes = canonical_json_bytes(&value);
        let text = String::from_utf8(bytes).unwrap();
        // "capsule_hash" sorts before "created" sorts before "integrity"...
        let cap_pos = text.find("capsule_hash").unwrap();
        let created_pos = text.find("\"created\"").unwrap();
        assert!(cap_pos < created_pos);
        assert!(!text.contains(' '));
    }

    #[test]
    fn signature_round_trips() {
        let sk = canonical_publisher_key();
        let value = build_manifest("h", "r", &[], "t", "p");
        let bytes = canonical_json_bytes(&value);
        let (sig, pubkey) = sign_manifest(&sk, &bytes);
        use ed25519_dalek::{Verifier, VerifyingKey, Signature};
        let vk = VerifyingKey::from_bytes(&pubkey).unwrap();
        let signature = Signature::from_bytes(&sig);
        assert!(vk.verify(&bytes, &signature).is_ok());
    }
}
