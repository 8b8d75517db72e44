//! Integrity root recomputation (C5, mirrored independently from the
//! compiler per SPEC_FULL.md §9). Flat SHA-256 over sorted per-file
//! leaf hashes, not a Merkle tree — "merkle_root" is a wire-compat
//! field name only.

use std::path::Path;

use sha2::{Digest, Sha256};

fn leaf_hash(rel_path: &str, content: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(rel_path.as_bytes());
    hasher.update([0x00]);
    hasher.update(content);
    hasher.finalize().into()
}

/// Recompute the integrity root over `rel_files` (as listed in the
/// manifest's `integrity.files`) relative to `shard_dir`. Propagates
/// an I/O error if any listed file is missing or unreadable.
pub fn compute_integrity_root(shard_dir: &Path, rel_files: &[String]) -> std::io::Result<String> {
    let mut sorted = rel_files.to_vec();
    sorted.sort();

    let mut acc = Sha256::new();
    for rel in &sorted {
        let bytes = std::fs::read(shard_dir.join(rel))?;
        acc.update(leaf_hash(rel, &bytes));
    }
    Ok(hex::encode(acc.finalize()))
}

/// Parquet sanity check (§4.7 stage 5): bytes `0..4` and the last 4
/// bytes must both equal `PAR1`.
pub fn looks_like_parquet(path: &Path) -> bool {
    match std::fs::read(path) {
        Ok(bytes) => bytes.len() >= 8 && &bytes[..4] == b"PAR1" && &bytes[bytes.len() - 4..] == b"PAR1",
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parquet_magic_checks_head_and_tail() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.parquet");
        fs::write(&good, b"PAR1somedataPAR1").unwrap();
        assert!(looks_like_parquet(&good));

        let bad = dir.path().join("bad.parquet");
        fs::write(&bad, b"NOPEsomedataNOPE").unwrap();
        assert!(!looks_like_parquet(&bad));
    }

    #[test]
    fn integrity_root_is_order_insensitive() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a"), b"1").unwrap();
        fs::write(dir.path().join("b"), b"2").unwrap();
        let r1 = compute_integrity_root(dir.path(), &["a".into(), "b".into()]).unwrap();
        let r2 = compute_integrity_root(dir.path(), &["b".into(), "a".into()]).unwrap();
        assert_eq!(r1, r2);
    }
}
