//! Verifier error codes (SPEC_FULL.md §4.7, §7). The verifier stops at
//! the first failing stage; it never attempts repair.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerifyErrorCode {
    #[serde(rename = "E_LAYOUT_MISSING")]
    LayoutMissing,
    #[serde(rename = "E_MANIFEST_JSON")]
    ManifestJson,
    #[serde(rename = "E_SIG_INVALID")]
    SigInvalid,
    #[serde(rename = "E_INTEGRITY_MISMATCH")]
    IntegrityMismatch,
    #[serde(rename = "E_PARQUET_MAGIC")]
    ParquetMagic,
    #[serde(rename = "E_POLICY_TRUST")]
    PolicyTrust,
}

impl VerifyErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            VerifyErrorCode::LayoutMissing => "Required file or directory missing",
            VerifyErrorCode::ManifestJson => "Manifest JSON invalid",
            VerifyErrorCode::SigInvalid => "Manifest signature invalid",
            VerifyErrorCode::IntegrityMismatch => "Integrity root does not match manifest",
            VerifyErrorCode::ParquetMagic => "Parquet file missing PAR1 magic bytes",
            VerifyErrorCode::PolicyTrust => "Publisher key not trusted",
        }
    }
}

impl fmt::Display for VerifyErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.as_str(), self.message())
    }
}

impl VerifyErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyErrorCode::LayoutMissing => "E_LAYOUT_MISSING",
            VerifyErrorCode::ManifestJson => "E_MANIFEST_JSON",
            VerifyErrorCode::SigInvalid => "E_SIG_INVALID",
            VerifyErrorCode::IntegrityMismatch => "E_INTEGRITY_MISMATCH",
            VerifyErrorCode::ParquetMagic => "E_PARQUET_MAGIC",
            VerifyErrorCode::PolicyTrust => "E_POLICY_TRUST",
        }
    }
}

/// A single verifier error entry, serialized into the `errors` array
/// of the verifier's structured JSON output. Extra context fields are
/// stage-specific, matching the reference verifier's ad hoc dicts.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyErrorEntry {
    pub code: VerifyErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher_pub: Option<String>,
}

impl VerifyErrorEntry {
    pub fn new(code: VerifyErrorCode) -> Self {
        VerifyErrorEntry {
            message: code.message().to_string(),
            code,
            path: None,
            detail: None,
            expected: None,
            computed: None,
            publisher_pub: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_expected_computed(mut self, expected: impl Into<String>, computed: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.computed = Some(computed.into());
        self
    }

    pub fn with_publisher_pub(mut self, pubkey_hex: impl Into<String>) -> Self {
        self.publisher_pub = Some(pubkey_hex.into());
        self
    }
}
