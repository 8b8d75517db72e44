//! Wire-level constants. Single source of truth for magics, header
//! layout, and safety bounds. The recorder (simulator), Strict Judge,
//! and compiler must stay synchronized against these values.

/// Latent file header magic, at file offset 0.
pub const MAGIC_LATENT_FILE: [u8; 4] = *b"AXLF";
/// Latent record header magic.
pub const MAGIC_LATENT_REC: [u8; 4] = *b"AXLR";
/// Residual record header magic.
pub const MAGIC_RESID_REC: [u8; 4] = *b"AXRR";

/// Format version carried in every record header.
pub const VERSION: u8 = 1;

/// Record header length: 4-byte magic + 1-byte version + 4-byte
/// frame_id (u32 LE) + 4-byte length (u32 LE).
pub const REC_HEADER_LEN: usize = 13;

/// File header length (the 4-byte `AXLF` magic at the start of
/// `cam_latents.bin`).
pub const FILE_HEADER_LEN: u64 = 4;

/// Payload bytes per latent record.
pub const LATENT_DIM: u32 = 256;

/// Full stride of one latent record: header + payload.
pub const LATENT_REC_LEN: u64 = REC_HEADER_LEN as u64 + LATENT_DIM as u64;

/// Reject residual payloads larger than this (zip-bomb guard).
pub const MAX_RESIDUAL_SIZE: u32 = 10 * 1024 * 1024;

/// Scan window before giving up on resynchronization.
pub const MAX_RESYNC_BYTES: u64 = 64 * 1024 * 1024;

/// Warn threshold for garbage consumed between valid residual records.
pub const MAX_GARBAGE_BYTES: u64 = 256 * 1024;

/// Chunk size used while scanning forward for a magic sequence.
pub const RESYNC_CHUNK_SIZE: usize = 64 * 1024;
