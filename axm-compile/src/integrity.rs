//! Integrity Root (C5): a flat SHA-256 digest over sorted per-file
//! leaf hashes, *not* a Merkle tree. The field is still called
//! `merkle_root` in the manifest for wire compatibility (SPEC_FULL.md
//! §4.5, §9) but the algorithm is a linear accumulator; the verifier
//! must reproduce it exactly from the same file list.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::CompileError;

fn leaf_hash(rel_path: &str, content: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(rel_path.as_bytes());
    hasher.update([0x00]);
    hasher.update(content);
    hasher.finalize().into()
}

/// Enumerate all files under `shard_root`, excluding `manifest.json`
/// and `sig/manifest.sig`, as forward-slashed paths relative to the
/// root, sorted lexicographically.
pub fn collect_shard_files(shard_root: &Path) -> Result<Vec<String>, CompileError> {
    let mut files = Vec::new();
    collect_recursive(shard_root, shard_root, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_recursive(
    root: &Path,
    current: &Path,
    out: &mut Vec<String>,
) -> Result<(), CompileError> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(root, &path, out)?;
            continue;
        }
        let rel = path
            .strip_prefix(root)
            .expect("walked path is under root")
            .to_string_lossy()
            .replace('\\', "/");
        if rel == "manifest.json" || rel == "sig/manifest.sig" {
            continue;
        }
        out.push(rel);
    }
    Ok(())
}

/// Compute the integrity root over `rel_files` (already sorted by the
/// caller) relative to `shard_root`.
pub fn compute_integrity_root(shard_root: &Path, rel_files: &[String]) -> Result<String, CompileError> {
    let mut acc = Sha256::new();
    let mut sorted = rel_files.to_vec();
    sorted.sort();
    for rel in &sorted {
        let bytes = std::fs::read(shard_root.join(rel))?;
        acc.update(leaf_hash(rel, &bytes));
    }
    Ok(hex::encode(acc.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn excludes_manifest_and_signature() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("manifest.json"), b"{}").unwrap();
        fs::create_dir_all(dir.path().join("sig")).unwrap();
        fs::write(dir.path().join("sig/manifest.sig"), b"sig").unwrap();
        fs::create_dir_all(dir.path().join("graph")).unwrap();
        fs::write(dir.path().join("graph/entities.parquet"), b"PAR1data").unwrap();

        let files = collect_shard_files(dir.path()).unwrap();
        assert_eq!(files, vec!["graph/entities.parquet".to_string()]);
    }

    #[test]
    fn root_is_order_insensitive() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("a/one"), b"one").unwrap();
        fs::write(dir.path().join("zzz"), b"two").unwrap();

        let files_a = vec!["zzz".to_string(), "a/one".to_string()];
        let files_b = vec!["a/one".to_string(), "zzz".to_string()];

        let root_a = compute_integrity_root(dir.path(), &files_a).unwrap();
        let root_b = compute_integrity_root(dir.path(), &files_b).unwrap();
        assert_eq!(root_a, root_b);
    }
}
