//! Capsule-to-Shard compiler.
//!
//! Ties together the Strict Judge (C3), the ontology extractor (C4),
//! the integrity root (C5), the manifest signer (C6), and the shard
//! writer (C8) into the single-pass pipeline described in
//! SPEC_FULL.md §2: Capsule directory in, signed Shard directory out.

pub mod error;
pub mod extractor;
pub mod integrity;
pub mod judge;
pub mod manifest;
pub mod model;
pub mod writer;

use std::path::Path;

use ed25519_dalek::SigningKey;

use error::CompileError;
use judge::{ScanStats, StrictJudge};
use model::StreamEvidence;

/// Summary of a successful compilation, surfaced so the CLI can print
/// the three-line report the Python reference prints, and so tests can
/// assert on warning-class scan statistics.
#[derive(Debug, Clone, Default)]
pub struct CompileReport {
    pub entity_count: usize,
    pub claim_count: usize,
    pub span_count: usize,
    pub integrity_root: String,
    pub scan_stats: Option<ScanStats>,
}

/// Compile a Capsule directory into a Shard directory.
///
/// `signing_key` defaults to the canonical publisher seed when `None`
/// (so freshly compiled Shards verify out of the box against the
/// governance trust store); `timestamp` defaults to the current UTC
/// time at second precision when `None`.
pub fn compile_capsule(
    capsule_path: &Path,
    out_path: &Path,
    signing_key: Option<SigningKey>,
    timestamp: Option<String>,
) -> Result<CompileReport, CompileError> {
    log::info!("compiling capsule: {}", capsule_path.display());

    let sk = signing_key.unwrap_or_else(manifest::canonical_publisher_key);
    let created = timestamp.unwrap_or_else(|| {
        chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string()
    });

    let extracted = extractor::extract(capsule_path)?;

    let mut streams: Vec<StreamEvidence> = Vec::new();
    let mut scan_stats: Option<ScanStats> = None;

    let latents_path = capsule_path.join("cam_latents.bin");
    if latents_path.exists() {
        let mut judge = StrictJudge::open(capsule_path)?;
        streams = extractor::extract_stream_evidence(capsule_path, &mut judge)?;
        scan_stats = Some(judge.scan_stats.clone());
    }

    std::fs::create_dir_all(out_path)?;
    std::fs::create_dir_all(out_path.join("graph"))?;
    std::fs::create_dir_all(out_path.join("evidence"))?;
    std::fs::create_dir_all(out_path.join("sig"))?;
    std::fs::create_dir_all(out_path.join("content"))?;

    writer::write_entities(&extracted.entities, &out_path.join("graph/entities.parquet"))?;
    writer::write_claims(&extracted.claims, &out_path.join("graph/claims.parquet"))?;
    writer::write_provenance(&extracted.provenance, &out_path.join("graph/provenance.parquet"))?;
    writer::write_spans(&extracted.spans, &out_path.join("evidence/spans.parquet"))?;
    writer::write_streams(&streams, &out_path.join("evidence/streams.parquet"))?;

    let files = integrity::collect_shard_files(out_path)?;
    let integrity_root = integrity::compute_integrity_root(out_path, &files)?;

    let pubkey_hex = hex::encode(sk.verifying_key().to_bytes());
    let manifest_value = manifest::build_manifest(
        &extracted.source_hash,
        &integrity_root,
        &files,
        &created,
        &pubkey_hex,
    );
    let manifest_bytes = manifest::canonical_json_bytes(&manifest_value);
    let (signature, pubkey) = manifest::sign_manifest(&sk, &manifest_bytes);

    std::fs::write(out_path.join("manifest.json"), &manifest_bytes)?;
    std::fs::write(out_path.join("sig/manifest.sig"), signature)?;
    std::fs::write(out_path.join("sig/publisher.pub"), pubkey)?;

    log::info!(
        "shard generated at {}: {} entities, {} claims, {} spans",
        out_path.display(),
        extracted.entities.len(),
        extracted.claims.len(),
        extracted.spans.len()
    );

    Ok(CompileReport {
        entity_count: extracted.entities.len(),
        claim_count: extracted.claims.len(),
        span_count: extracted.spans.len(),
        integrity_root,
        scan_stats,
    })
}
