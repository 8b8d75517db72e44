//! Compile-side error taxonomy (SPEC_FULL.md §7).
//!
//! Every variant here is a *fatal* per the spec's two-class taxonomy —
//! warnings never reach this type, they accumulate in [`crate::judge::ScanStats`]
//! instead.

use crate::judge::LatentStatus;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("missing required file: {0}")]
    MissingFile(PathBuf),

    #[error("residual version mismatch {found} at frame {frame_id}")]
    VersionMismatch { frame_id: u32, found: u8 },

    #[error("residual payload size {size} exceeds limit {limit}")]
    ResidualTooLarge { size: u32, limit: u32 },

    #[error("invalid latent file header")]
    BadLatentFileHeader,

    #[error("frame {frame_id}: latent verification failed: {status}")]
    LatentVerification { frame_id: u32, status: LatentStatus },

    #[error("event line is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event line is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("event missing required field {0:?}")]
    MissingField(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid signing key: {0}")]
    InvalidSigningKey(String),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}
