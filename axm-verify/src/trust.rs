//! Governance trust-store policy: `{"trusted_publishers": ["<hex pubkey>", ...]}`.
//! Hex comparison is case-insensitive. An absent trust store is
//! treated as an empty list, so every publisher is untrusted by
//! default.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Deserialize, Default)]
struct TrustStoreFile {
    #[serde(default)]
    trusted_publishers: Vec<String>,
}

#[derive(Debug, Error)]
pub enum TrustStoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub struct TrustStore {
    trusted: HashSet<String>,
}

impl TrustStore {
    pub fn empty() -> Self {
        TrustStore {
            trusted: HashSet::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, TrustStoreError> {
        if !path.exists() {
            return Ok(TrustStore {
                trusted: HashSet::new(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let parsed: TrustStoreFile = serde_json::from_str(&text)?;
        Ok(TrustStore {
            trusted: parsed
                .trusted_publishers
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect(),
        })
    }

    pub fn is_trusted(&self, pubkey_hex: &str) -> bool {
        self.trusted.contains(&pubkey_hex.to_lowercase())
    }
}

/// Walk upward from `start` looking for a repo root marker
/// (`governance/trust_store.json` or `Cargo.toml` — the Rust
/// analogue of the Python reference's `pyproject.toml` marker).
/// Falls back to `start` itself if no marker is found.
pub fn discover_repo_root(start: &Path) -> std::path::PathBuf {
    let canon = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    let mut current = Some(canon.as_path());
    while let Some(dir) = current {
        if dir.join("governance/trust_store.json").exists() || dir.join("Cargo.toml").exists() {
            return dir.to_path_buf();
        }
        current = dir.parent();
    }
    canon
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_trust_store_is_empty() {
        let dir = tempdir().unwrap();
        let store = TrustStore::load(&dir.path().join("nope.json")).unwrap();
        assert!(!store.is_trusted("anything"));
    }

    #[test]
    fn trust_lookup_is_case_insensitive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trust_store.json");
        fs::write(&path, r#"{"trusted_publishers":["ABCDEF"]}"#).unwrap();
        let store = TrustStore::load(&path).unwrap();
        assert!(store.is_trusted("abcdef"));
        assert!(store.is_trusted("ABCDEF"));
        assert!(!store.is_trusted("123456"));
    }
}
