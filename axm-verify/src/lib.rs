//! Independent Shard verifier. Re-derives everything the compiler
//! produced from the Shard's own bytes plus a governance trust store —
//! it shares no judgement code with `axm-compile` (SPEC_FULL.md §9),
//! only the wire-level agreement that canonical JSON and the integrity
//! root are computed the same way.

pub mod canonical;
pub mod error;
pub mod integrity;
pub mod logic;
pub mod trust;

pub use logic::{verify_shard, Status, VerifyResult};

#[cfg(test)]
mod tests {
    use super::*;
    use axm_compile::manifest::GOLD_TIMESTAMP;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn build_gold_shard(capsule: &Path, out: &Path) {
        fs::write(
            capsule.join("events.jsonl"),
            "{\"evt\":\"wheel_slip\",\"robot_id\":\"robot-001\",\"surface\":\"gravel\"}\n",
        )
        .unwrap();
        axm_compile::compile_capsule(capsule, out, None, Some(GOLD_TIMESTAMP.to_string())).unwrap();
    }

    fn write_trust_store(repo_root: &Path, trusted_hex: &str) {
        fs::create_dir_all(repo_root.join("governance")).unwrap();
        fs::write(
            repo_root.join("governance/trust_store.json"),
            format!(r#"{{"trusted_publishers":["{trusted_hex}"]}}"#),
        )
        .unwrap();
    }

    #[test]
    fn passes_for_a_freshly_compiled_trusted_shard() {
        let capsule = tempdir().unwrap();
        let out = tempdir().unwrap();
        build_gold_shard(capsule.path(), out.path());

        let pubkey = fs::read(out.path().join("sig/publisher.pub")).unwrap();
        write_trust_store(out.path(), &hex::encode(pubkey));

        let result = verify_shard(out.path(), None);
        assert!(matches!(result.status, Status::Pass));
        assert_eq!(result.error_count, 0);
    }

    #[test]
    fn fails_integrity_on_single_byte_mutation() {
        let capsule = tempdir().unwrap();
        let out = tempdir().unwrap();
        build_gold_shard(capsule.path(), out.path());
        let pubkey = fs::read(out.path().join("sig/publisher.pub")).unwrap();
        write_trust_store(out.path(), &hex::encode(pubkey));

        let entities_path = out.path().join("graph/entities.parquet");
        let mut bytes = fs::read(&entities_path).unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0x01;
        fs::write(&entities_path, bytes).unwrap();

        let result = verify_shard(out.path(), None);
        assert!(matches!(result.status, Status::Fail));
        assert_eq!(result.errors[0].code.as_str(), "E_INTEGRITY_MISMATCH");
    }

    #[test]
    fn fails_policy_trust_for_untrusted_publisher() {
        let capsule = tempdir().unwrap();
        let out = tempdir().unwrap();
        build_gold_shard(capsule.path(), out.path());
        // No governance/trust_store.json written: trust list is empty.

        let result = verify_shard(out.path(), None);
        assert!(matches!(result.status, Status::Fail));
        assert_eq!(result.errors[0].code.as_str(), "E_POLICY_TRUST");
    }

    #[test]
    fn fails_layout_missing_when_manifest_absent() {
        let dir = tempdir().unwrap();
        let result = verify_shard(dir.path(), None);
        assert!(matches!(result.status, Status::Fail));
        assert_eq!(result.errors[0].code.as_str(), "E_LAYOUT_MISSING");
    }
}
