//! Deterministic identity functions.
//!
//! `canonicalize` and the four ID functions are pure: the same input
//! byte-for-byte always yields the same output string. Regenerating an
//! ID from its semantic tuple must reproduce it exactly (testable
//! property 1 / 4 in the design doc).

use base32::Alphabet;
use sha2::{Digest, Sha256};

const BASE32_ALPHABET: Alphabet = Alphabet::Rfc4648 { padding: false };

/// NFKC-normalize, case-fold, and collapse whitespace runs to a single
/// U+0020, trimmed. Empty input yields empty output.
///
/// Case-folding here is `str::to_lowercase`, not full Unicode
/// case-folding (`str::casefold` has no stdlib/crate equivalent in
/// common use) — the wheel-slip vocabulary this crate canonicalizes is
/// ASCII, so the two only diverge on codepoints the ontology extractor
/// never sees.
pub fn canonicalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    use unicode_normalization::UnicodeNormalization;
    let normalized: String = text.nfkc().collect();
    let folded = normalized.to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn hash_id(payload: &[u8], prefix: &str) -> String {
    let digest = Sha256::digest(payload);
    let truncated = &digest[..15];
    let encoded = base32::encode(BASE32_ALPHABET, truncated).to_lowercase();
    format!("{prefix}{encoded}")
}

/// Deterministic entity ID from `(namespace, label)`.
pub fn entity_id(namespace: &str, label: &str) -> String {
    let mut payload = canonicalize(namespace).into_bytes();
    payload.push(0);
    payload.extend(canonicalize(label).into_bytes());
    hash_id(&payload, "e_")
}

/// Deterministic claim ID. `object_clean` is `object_id` when
/// `object_type == "entity"`, else `canonicalize(object)`.
pub fn claim_id(subject_id: &str, predicate: &str, object_clean: &str, object_type: &str) -> String {
    let payload = format!(
        "{}\0{}\0{}\0{}",
        subject_id,
        canonicalize(predicate),
        object_type,
        object_clean
    );
    hash_id(payload.as_bytes(), "c_")
}

/// Deterministic span ID.
pub fn span_id(source_hash: &str, byte_start: i64, byte_end: i64, text: &str) -> String {
    let payload = format!("{source_hash}\0{byte_start}\0{byte_end}\0{text}");
    hash_id(payload.as_bytes(), "s_")
}

/// Deterministic provenance ID.
pub fn prov_id(claim_id: &str, span_id: &str) -> String {
    let payload = format!("{claim_id}\0{span_id}");
    hash_id(payload.as_bytes(), "p_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_empty() {
        assert_eq!(canonicalize(""), "");
    }

    #[test]
    fn canonicalize_collapses_whitespace() {
        assert_eq!(canonicalize("  Wheel   Slip\t\n"), "wheel slip");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let once = canonicalize("Gravel Surface");
        let twice = canonicalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn entity_id_is_deterministic() {
        let a = entity_id("embodied/wheel_slip", "robot-001");
        let b = entity_id("embodied/wheel_slip", "robot-001");
        assert_eq!(a, b);
        assert!(a.starts_with("e_"));
    }

    #[test]
    fn entity_id_depends_on_canonical_form() {
        let a = entity_id("embodied/wheel_slip", "Wheel Slip");
        let b = entity_id("embodied/wheel_slip", "  wheel   slip ");
        assert_eq!(a, b);
    }

    #[test]
    fn entity_id_distinguishes_labels() {
        let a = entity_id("embodied/wheel_slip", "robot-001");
        let b = entity_id("embodied/wheel_slip", "robot-002");
        assert_ne!(a, b);
    }

    #[test]
    fn claim_id_prefix_and_determinism() {
        let sub = entity_id("embodied/wheel_slip", "robot-001");
        let a = claim_id(&sub, "observed", "wheel_slip", "entity");
        let b = claim_id(&sub, "observed", "wheel_slip", "entity");
        assert_eq!(a, b);
        assert!(a.starts_with("c_"));
    }

    #[test]
    fn span_and_provenance_ids() {
        let sid = span_id("deadbeef", 0, 10, "hello");
        assert!(sid.starts_with("s_"));
        let cid = "c_aaaaaaaaaaaaaaaaaaaaaaaa";
        let pid = prov_id(cid, &sid);
        assert!(pid.starts_with("p_"));
        assert_eq!(pid, prov_id(cid, &sid));
    }
}
