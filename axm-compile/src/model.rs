//! Logical rows produced by the compiler (see SPEC_FULL.md §3).

use serde::Serialize;

/// A named thing a claim can be about: a robot, a surface, a subsystem.
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    /// Content-addressed identifier (`e_...`).
    pub entity_id: String,
    /// Namespace the label was minted in, e.g. `robot` or `surface`.
    pub namespace: String,
    /// Canonicalized display label.
    pub label: String,
    /// Entity kind as named by the originating event, e.g. `robot`.
    pub r#type: String,
}

/// One extracted (subject, predicate, object) assertion.
#[derive(Debug, Clone, Serialize)]
pub struct Claim {
    /// Content-addressed identifier (`c_...`).
    pub claim_id: String,
    /// Subject entity id.
    pub subject: String,
    /// Relationship name, e.g. `wheel_slip` or `resolved_by`.
    pub predicate: String,
    /// Object entity id, or a canonicalized literal for non-entity objects.
    pub object: String,
    /// `entity` or `literal`.
    pub object_type: String,
    /// Evidence tier: 1 for stream-backed claims, 0 otherwise.
    pub tier: i8,
}

/// A byte range in a source file backing a claim.
#[derive(Debug, Clone, Serialize)]
pub struct Span {
    /// Content-addressed identifier (`s_...`).
    pub span_id: String,
    /// SHA-256 hex digest of the source file the span was cut from.
    pub source_hash: String,
    /// Inclusive start offset, in bytes, within the source file.
    pub byte_start: i64,
    /// Exclusive end offset, in bytes, within the source file.
    pub byte_end: i64,
    /// The exact source bytes covered by the span, decoded as UTF-8.
    pub text: String,
}

/// Links a claim to the span of text that justifies it.
#[derive(Debug, Clone, Serialize)]
pub struct Provenance {
    /// Content-addressed identifier (`p_...`).
    pub provenance_id: String,
    /// Claim this provenance record backs.
    pub claim_id: String,
    /// Span this provenance record backs.
    pub span_id: String,
    /// SHA-256 hex digest of the backing source file, duplicated from
    /// the span for query convenience.
    pub source_hash: String,
    /// Inclusive start offset, in bytes, duplicated from the span.
    pub byte_start: i64,
    /// Exclusive end offset, in bytes, duplicated from the span.
    pub byte_end: i64,
}

/// One binary-stream record the Strict Judge confirmed (or flagged) for
/// a given frame, backing tier-1 claims extracted from `events.jsonl`.
#[derive(Debug, Clone, Serialize)]
pub struct StreamEvidence {
    /// Frame this record belongs to.
    pub frame_id: i32,
    /// `latent` or `residual`.
    pub stream: String,
    /// Capsule-relative file the record was read from.
    pub file: String,
    /// Byte offset the record was found at.
    pub offset: i64,
    /// Record length in bytes.
    pub length: i32,
    /// Judge status string, e.g. `ok`, `drift`, `resynced`.
    pub status: String,
    /// SHA-256 hex digest of the record payload, when confirmed intact.
    pub content_hash: Option<String>,
}
