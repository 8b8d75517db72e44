//! Ontology Extractor (C4): the only code path that mints IDs. Reads
//! `events.jsonl` once, tracking a byte cursor so every emitted claim
//! carries a byte-exact provenance span, then (if binary streams are
//! present) re-reads the log to produce `StreamEvidence` rows via the
//! Strict Judge.
//!
//! Recognizes a fixed, small vocabulary (`wheel_slip`,
//! `recovery_action`); any other `evt` is ignored, forward-compatibly.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde_json::Value;
use sha2::{Digest, Sha256};

use axm_core::ids::{canonicalize, claim_id, entity_id, prov_id, span_id};

use crate::error::CompileError;
use crate::judge::StrictJudge;
use crate::model::{Claim, Entity, Provenance, Span, StreamEvidence};

/// Fixed namespace for this domain.
pub const NAMESPACE: &str = "embodied/wheel_slip";

pub struct ExtractResult {
    pub source_hash: String,
    pub entities: Vec<Entity>,
    pub claims: Vec<Claim>,
    pub spans: Vec<Span>,
    pub provenance: Vec<Provenance>,
}

struct Extraction {
    source_hash: String,
    entities: Vec<Entity>,
    entity_cache: HashSet<String>,
    claims: Vec<Claim>,
    spans: Vec<Span>,
    provenance: Vec<Provenance>,
}

impl Extraction {
    fn new(source_hash: String) -> Self {
        Extraction {
            source_hash,
            entities: Vec::new(),
            entity_cache: HashSet::new(),
            claims: Vec::new(),
            spans: Vec::new(),
            provenance: Vec::new(),
        }
    }

    fn add_entity(&mut self, label: &str, r#type: &str) -> String {
        let eid = entity_id(NAMESPACE, label);
        if self.entity_cache.insert(eid.clone()) {
            self.entities.push(Entity {
                entity_id: eid.clone(),
                namespace: NAMESPACE.to_string(),
                label: label.to_string(),
                r#type: r#type.to_string(),
            });
        }
        eid
    }

    /// `object_type` is `"entity"` or a `literal:*` tag. The stored
    /// `object` field and the claim ID payload both use the
    /// canonicalized literal (or the entity ID), per the data model's
    /// explicit invariant that literal objects are canonicalized.
    #[allow(clippy::too_many_arguments)]
    fn add_claim(
        &mut self,
        subject_id: &str,
        predicate: &str,
        object_value: &str,
        object_type: &str,
        tier: i8,
        byte_start: i64,
        byte_end: i64,
        text: &str,
    ) {
        let object_clean = if object_type == "entity" {
            self.add_entity(object_value, "inferred")
        } else {
            canonicalize(object_value)
        };

        let cid = claim_id(subject_id, predicate, &object_clean, object_type);
        let sid = span_id(&self.source_hash, byte_start, byte_end, text);
        let pid = prov_id(&cid, &sid);

        self.claims.push(Claim {
            claim_id: cid.clone(),
            subject: subject_id.to_string(),
            predicate: predicate.to_string(),
            object: object_clean,
            object_type: object_type.to_string(),
            tier,
        });
        self.spans.push(Span {
            span_id: sid.clone(),
            source_hash: self.source_hash.clone(),
            byte_start,
            byte_end,
            text: text.to_string(),
        });
        self.provenance.push(Provenance {
            provenance_id: pid,
            claim_id: cid,
            span_id: sid,
            source_hash: self.source_hash.clone(),
            byte_start,
            byte_end,
        });
    }
}

fn json_str(v: &Value) -> Option<String> {
    v.as_str().map(|s| s.to_string())
}

/// Render a JSON value the way Python's `str()` would, for the
/// `applied_value` literal claim's `str(evt["value"])`.
fn py_str(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        Value::Null => "None".to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Parse `events.jsonl` and emit entities/claims/spans/provenance.
pub fn extract(capsule_path: &Path) -> Result<ExtractResult, CompileError> {
    let events_path = capsule_path.join("events.jsonl");
    if !events_path.exists() {
        return Err(CompileError::MissingFile(events_path));
    }
    let raw_bytes = fs::read(&events_path)?;
    let source_hash = hex::encode(Sha256::digest(&raw_bytes));

    let mut ex = Extraction::new(source_hash.clone());
    let mut cursor: i64 = 0;

    for line_bytes in raw_bytes.split(|&b| b == b'\n') {
        if line_bytes.is_empty() {
            cursor += 1; // account for the newline of an empty line
            continue;
        }

        let text = String::from_utf8(line_bytes.to_vec())?;
        let start = cursor;
        let end = cursor + line_bytes.len() as i64;
        cursor = end + 1;

        let evt: Value = serde_json::from_str(&text)?;

        match evt.get("evt").and_then(Value::as_str) {
            Some("wheel_slip") => {
                let robot_id = evt
                    .get("robot_id")
                    .and_then(json_str)
                    .unwrap_or_else(|| "robot-001".to_string());
                let surface = evt
                    .get("surface")
                    .and_then(json_str)
                    .ok_or(CompileError::MissingField("surface"))?;

                let rid = ex.add_entity(&robot_id, "robot");
                let slip_id = ex.add_entity("wheel_slip", "event");

                ex.add_claim(&rid, "observed", "wheel_slip", "entity", 2, start, end, &text);
                ex.add_claim(&slip_id, "on_surface", &surface, "literal:string", 2, start, end, &text);
            }
            Some("recovery_action") => {
                let action = evt
                    .get("action")
                    .and_then(json_str)
                    .ok_or(CompileError::MissingField("action"))?;
                let value = evt.get("value").ok_or(CompileError::MissingField("value"))?;
                let value_str = py_str(value);

                ex.add_entity(&action, "action");
                let slip_id = ex.add_entity("wheel_slip", "event");

                ex.add_claim(&slip_id, "resolved_by", &action, "entity", 1, start, end, &text);

                let action_entity_id = entity_id(NAMESPACE, &action);
                ex.add_claim(
                    &action_entity_id,
                    "applied_value",
                    &value_str,
                    "literal:string",
                    2,
                    start,
                    end,
                    &text,
                );
            }
            _ => {
                log::debug!("skipping unrecognized event at bytes {start}..{end}");
            }
        }
    }

    Ok(ExtractResult {
        source_hash,
        entities: ex.entities,
        claims: ex.claims,
        spans: ex.spans,
        provenance: ex.provenance,
    })
}

/// Second pass (C4 §4.4): for every event carrying a `frame_id`,
/// verify its `stream_refs.latents` reference via the Strict Judge and
/// append a latent `StreamEvidence` row; any non-`VERIFIED` status is
/// fatal. For every frame present in the residual index, append a
/// residual row too.
///
/// This reopens `events.jsonl`; SPEC_FULL.md §4.4 records that the
/// two-pass design is an accepted, if wasteful, open question rather
/// than a bug to fix here.
pub fn extract_stream_evidence(
    capsule_path: &Path,
    judge: &mut StrictJudge,
) -> Result<Vec<StreamEvidence>, CompileError> {
    let events_path = capsule_path.join("events.jsonl");
    let raw_bytes = fs::read(&events_path)?;
    let mut evidence = Vec::new();

    for line_bytes in raw_bytes.split(|&b| b == b'\n') {
        if line_bytes.is_empty() {
            continue;
        }
        let text = String::from_utf8(line_bytes.to_vec())?;
        let evt: Value = serde_json::from_str(&text)?;

        let frame_id = evt
            .get("frame_id")
            .and_then(Value::as_u64)
            .ok_or(CompileError::MissingField("frame_id"))? as u32;

        let latents_ref = evt
            .pointer("/stream_refs/latents")
            .ok_or(CompileError::MissingField("stream_refs.latents"))?;
        let offset = latents_ref
            .get("offset")
            .and_then(Value::as_u64)
            .ok_or(CompileError::MissingField("stream_refs.latents.offset"))?;
        let length = latents_ref
            .get("length")
            .and_then(Value::as_u64)
            .ok_or(CompileError::MissingField("stream_refs.latents.length"))?;

        let (status, hash) = judge.verify_latent(offset, length, frame_id)?;
        if !status.is_verified() {
            return Err(CompileError::LatentVerification { frame_id, status });
        }

        evidence.push(StreamEvidence {
            frame_id: frame_id as i32,
            stream: "latents".to_string(),
            file: "cam_latents.bin".to_string(),
            offset: offset as i64,
            length: length as i32,
            status: "VERIFIED".to_string(),
            content_hash: hash,
        });

        if let Some(rec) = judge.residual_index.get(&frame_id) {
            evidence.push(StreamEvidence {
                frame_id: frame_id as i32,
                stream: "residuals".to_string(),
                file: "cam_residuals.bin".to_string(),
                offset: rec.offset as i64,
                length: rec.total_length as i32,
                status: "VERIFIED".to_string(),
                content_hash: Some(rec.content_hash.clone()),
            });
        }
    }

    Ok(evidence)
}
