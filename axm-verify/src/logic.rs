//! Shard Verifier (C7): six ordered stages, each yielding a distinct
//! error code. Stops at the first failure. Pure function of a Shard
//! directory plus an optional repo root (SPEC_FULL.md §4.7) — no
//! distributed state.

use std::path::{Path, PathBuf};

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::Serialize;
use serde_json::Value;

use crate::canonical::canonical_json_bytes;
use crate::error::{VerifyErrorCode, VerifyErrorEntry};
use crate::integrity::{compute_integrity_root, looks_like_parquet};
use crate::trust::{discover_repo_root, TrustStore};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyResult {
    pub status: Status,
    pub error_count: usize,
    pub errors: Vec<VerifyErrorEntry>,
}

fn fail(entry: VerifyErrorEntry) -> VerifyResult {
    VerifyResult {
        status: Status::Fail,
        error_count: 1,
        errors: vec![entry],
    }
}

/// Verify a Shard directory. `repo_root` is auto-discovered by walking
/// parents for `governance/trust_store.json` or `Cargo.toml` when not
/// given explicitly.
pub fn verify_shard(shard_dir: &Path, repo_root: Option<PathBuf>) -> VerifyResult {
    let repo_root = repo_root.unwrap_or_else(|| discover_repo_root(shard_dir));

    let manifest_path = shard_dir.join("manifest.json");
    let sig_path = shard_dir.join("sig/manifest.sig");
    let pub_path = shard_dir.join("sig/publisher.pub");
    let trust_path = repo_root.join("governance/trust_store.json");

    // Stage 1: layout.
    for p in [&manifest_path, &sig_path, &pub_path] {
        if !p.exists() {
            return fail(
                VerifyErrorEntry::new(VerifyErrorCode::LayoutMissing).with_path(p.display().to_string()),
            );
        }
    }

    // Stage 2: manifest JSON.
    let manifest_text = match std::fs::read_to_string(&manifest_path) {
        Ok(t) => t,
        Err(e) => return fail(VerifyErrorEntry::new(VerifyErrorCode::ManifestJson).with_detail(e.to_string())),
    };
    let manifest_obj: Value = match serde_json::from_str(&manifest_text) {
        Ok(v) => v,
        Err(e) => return fail(VerifyErrorEntry::new(VerifyErrorCode::ManifestJson).with_detail(e.to_string())),
    };

    // Stage 3: signature, over the re-serialized canonical bytes.
    let canonical_bytes = canonical_json_bytes(&manifest_obj);
    let pub_bytes = match std::fs::read(&pub_path) {
        Ok(b) => b,
        Err(e) => return fail(VerifyErrorEntry::new(VerifyErrorCode::SigInvalid).with_detail(e.to_string())),
    };
    let sig_bytes = match std::fs::read(&sig_path) {
        Ok(b) => b,
        Err(e) => return fail(VerifyErrorEntry::new(VerifyErrorCode::SigInvalid).with_detail(e.to_string())),
    };

    let signature_ok = (|| -> Option<bool> {
        let pub_arr: [u8; 32] = pub_bytes.clone().try_into().ok()?;
        let sig_arr: [u8; 64] = sig_bytes.clone().try_into().ok()?;
        let vk = VerifyingKey::from_bytes(&pub_arr).ok()?;
        let sig = Signature::from_bytes(&sig_arr);
        Some(vk.verify(&canonical_bytes, &sig).is_ok())
    })()
    .unwrap_or(false);

    if !signature_ok {
        return fail(VerifyErrorEntry::new(VerifyErrorCode::SigInvalid));
    }

    // Stage 4: integrity root.
    let integrity = manifest_obj.get("integrity").cloned().unwrap_or(Value::Null);
    let expected_root = integrity
        .get("merkle_root")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let rel_files: Vec<String> = integrity
        .get("files")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    let computed_root = match compute_integrity_root(shard_dir, &rel_files) {
        Ok(r) => r,
        Err(e) => {
            return fail(VerifyErrorEntry::new(VerifyErrorCode::IntegrityMismatch).with_detail(e.to_string()))
        }
    };
    if expected_root != computed_root {
        return fail(
            VerifyErrorEntry::new(VerifyErrorCode::IntegrityMismatch)
                .with_expected_computed(expected_root, computed_root),
        );
    }

    // Stage 5: Parquet sanity.
    for rel in &rel_files {
        if rel.ends_with(".parquet") {
            let p = shard_dir.join(rel);
            if !looks_like_parquet(&p) {
                return fail(VerifyErrorEntry::new(VerifyErrorCode::ParquetMagic).with_path(p.display().to_string()));
            }
        }
    }

    // Stage 6: trust policy. A malformed trust store is treated the
    // same as a missing one: nothing is trusted.
    let trust = TrustStore::load(&trust_path).unwrap_or_else(|_| TrustStore::empty());
    let pubkey_hex = hex::encode(&pub_bytes);
    if !trust.is_trusted(&pubkey_hex) {
        return fail(VerifyErrorEntry::new(VerifyErrorCode::PolicyTrust).with_publisher_pub(pubkey_hex));
    }

    VerifyResult {
        status: Status::Pass,
        error_count: 0,
        errors: vec![],
    }
}
