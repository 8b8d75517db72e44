//! Whole Capsule -> Shard -> verify round trips, driving real synthetic
//! capsules through the compiler and verifier binaries-as-libraries.
//! Modeled on `tests/test_phase2_pattern2.py` in the reference corpus:
//! a safe run with no residual recording, a crash run that compiles and
//! verifies clean end to end, and a corrupted run that fails to
//! recompile.

use std::fs;

use axm_compile::compile_capsule;
use axm_verify::{verify_shard, Status};
use tempfile::tempdir;

#[test]
fn safe_run_compiles_with_empty_residual_stream() {
    let capsule_root = tempdir().unwrap();
    let capsule = axm_sim::generate_session(capsule_root.path(), false, 30, 1).unwrap();

    let residuals = fs::read(capsule.join("cam_residuals.bin")).unwrap();
    assert!(residuals.is_empty());

    let out = tempdir().unwrap();
    let report = compile_capsule(&capsule, out.path(), None, Some("2026-01-01T00:00:00Z".into())).unwrap();

    assert!(report.entity_count > 0);
    assert!(out.path().join("manifest.json").exists());
}

#[test]
fn crash_run_compiles_and_verifies_with_a_recovery_claim() {
    let capsule_root = tempdir().unwrap();
    let capsule = axm_sim::generate_session(capsule_root.path(), true, 100, 2).unwrap();

    let out = tempdir().unwrap();
    let report = compile_capsule(&capsule, out.path(), None, Some("2026-01-01T00:00:00Z".into())).unwrap();

    let streams_path = out.path().join("evidence/streams.parquet");
    assert!(streams_path.exists());
    assert!(fs::metadata(&streams_path).unwrap().len() > 0);

    let claims_path = out.path().join("graph/claims.parquet");
    assert!(fs::metadata(&claims_path).unwrap().len() > 0);
    assert!(report.claim_count > 0);

    let pubkey = fs::read(out.path().join("sig/publisher.pub")).unwrap();
    fs::create_dir_all(out.path().join("governance")).unwrap();
    fs::write(
        out.path().join("governance/trust_store.json"),
        format!(r#"{{"trusted_publishers":["{}"]}}"#, hex::encode(pubkey)),
    )
    .unwrap();

    let result = verify_shard(out.path(), None);
    assert!(matches!(result.status, Status::Pass), "verify errors: {:?}", result.errors);
}

#[test]
fn corrupting_a_latent_byte_breaks_recompilation() {
    let capsule_root = tempdir().unwrap();
    let capsule = axm_sim::generate_session(capsule_root.path(), true, 100, 3).unwrap();

    let out_ok = tempdir().unwrap();
    compile_capsule(&capsule, out_ok.path(), None, Some("2026-01-01T00:00:00Z".into())).unwrap();

    corrupt_one_byte::corrupt_one_byte(&capsule.join("cam_latents.bin")).unwrap();

    let out_fail = tempdir().unwrap();
    let result = compile_capsule(&capsule, out_fail.path(), None, Some("2026-01-01T00:00:00Z".into()));
    assert!(result.is_err());
}
