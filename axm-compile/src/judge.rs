//! The Strict Judge (C3): scans the residual stream with bounded
//! resynchronization, and verifies latent records by offset arithmetic.
//!
//! Residuals are variable length and best-effort; a torn tail or a run
//! of garbage between records only produces a warning. Latents have a
//! fixed, known stride — any deviation from the offset law is treated
//! as tampering and is fatal to the caller (see `verify_latent`).

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use axm_core::protocol::{
    FILE_HEADER_LEN, LATENT_DIM, LATENT_REC_LEN, MAGIC_LATENT_FILE, MAGIC_LATENT_REC,
    MAGIC_RESID_REC, MAX_GARBAGE_BYTES, MAX_RESIDUAL_SIZE, MAX_RESYNC_BYTES, REC_HEADER_LEN,
    RESYNC_CHUNK_SIZE, VERSION,
};

use crate::error::CompileError;

/// Outcome of verifying a single latent record against its claimed
/// `(offset, length, frame_id)`. Every variant here corresponds 1:1 to
/// a string code in the original reference scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatentStatus {
    OffsetMismatch { claimed: u64, math: u64 },
    LenMismatch { claimed: u64, expected: u64 },
    Eof,
    BadMagic,
    BadVersion,
    Drift { found: u32, expected: u32 },
    BadDim { found: u32, expected: u32 },
    TornWrite,
    Verified,
}

impl LatentStatus {
    pub fn is_verified(&self) -> bool {
        matches!(self, LatentStatus::Verified)
    }
}

impl fmt::Display for LatentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatentStatus::OffsetMismatch { claimed, math } => {
                write!(f, "OFFSET_MISMATCH (Claimed {claimed} != Math {math})")
            }
            LatentStatus::LenMismatch { claimed, expected } => {
                write!(f, "LEN_MISMATCH (Claimed {claimed} != Const {expected})")
            }
            LatentStatus::Eof => write!(f, "EOF"),
            LatentStatus::BadMagic => write!(f, "BAD_MAGIC"),
            LatentStatus::BadVersion => write!(f, "BAD_VERSION"),
            LatentStatus::Drift { found, expected } => {
                write!(f, "DRIFT (Found {found}, Exp {expected})")
            }
            LatentStatus::BadDim { found, expected } => {
                write!(f, "BAD_DIM (Found {found}, Exp {expected})")
            }
            LatentStatus::TornWrite => write!(f, "TORN_WRITE"),
            LatentStatus::Verified => write!(f, "VERIFIED"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResidualRecord {
    pub offset: u64,
    pub total_length: u64,
    pub content_hash: String,
}

/// Running counters for the residual scan, surfaced so tests and
/// callers can assert on warning-class events (testable scenarios S4,
/// S5 in SPEC_FULL.md §8).
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    pub corrupt_headers: u64,
    pub garbage_bytes: u64,
    pub resyncs: u64,
    pub records: u64,
}

pub struct StrictJudge {
    capsule_path: PathBuf,
    pub residual_index: HashMap<u32, ResidualRecord>,
    pub scan_stats: ScanStats,
    latent_file: File,
}

/// Read up to `buf.len()` bytes, looping until the buffer is full or a
/// clean EOF is hit. Mirrors Python's `file.read(n)` semantics for
/// regular files, where a partial read below `n` means end of file.
fn read_fill(f: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = f.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

impl StrictJudge {
    /// Open a Capsule for binary-stream judgement. Only call this when
    /// `cam_latents.bin` is known to exist (C4 only constructs a Judge
    /// in that case); the residual stream is always optional.
    pub fn open(capsule_path: &Path) -> Result<Self, CompileError> {
        let mut judge = StrictJudge {
            capsule_path: capsule_path.to_path_buf(),
            residual_index: HashMap::new(),
            scan_stats: ScanStats::default(),
            latent_file: Self::open_latents(capsule_path)?,
        };
        judge.scan_residuals()?;
        Ok(judge)
    }

    fn open_latents(capsule_path: &Path) -> Result<File, CompileError> {
        let path = capsule_path.join("cam_latents.bin");
        let mut f = File::open(&path)?;
        let mut magic = [0u8; FILE_HEADER_LEN as usize];
        let n = read_fill(&mut f, &mut magic)?;
        if n != magic.len() || magic != MAGIC_LATENT_FILE {
            return Err(CompileError::BadLatentFileHeader);
        }
        Ok(f)
    }

    fn scan_residuals(&mut self) -> Result<(), CompileError> {
        let path = self.capsule_path.join("cam_residuals.bin");
        if !path.exists() {
            return Ok(());
        }
        let mut f = File::open(&path)?;

        loop {
            let start_off = f.stream_position()?;
            let mut header = [0u8; REC_HEADER_LEN];
            let read = read_fill(&mut f, &mut header)?;

            if read == 0 {
                break; // clean EOF
            }
            if read < REC_HEADER_LEN {
                log::warn!("truncated residual header at offset {start_off}");
                break;
            }

            let magic = &header[0..4];
            if magic != MAGIC_RESID_REC {
                self.scan_stats.corrupt_headers += 1;
                log::warn!("corrupt residual magic at offset {start_off}, resyncing");

                let next_off = Self::resync_to_magic(&mut f, &MAGIC_RESID_REC, start_off + 1)?;
                let Some(next_off) = next_off else {
                    log::warn!("unable to resync residual stream, stopping scan");
                    break;
                };

                let garbage = next_off - start_off;
                self.scan_stats.garbage_bytes += garbage;
                self.scan_stats.resyncs += 1;

                if garbage > MAX_GARBAGE_BYTES {
                    log::warn!("large garbage span during resync: {garbage} bytes");
                }

                f.seek(SeekFrom::Start(next_off))?;
                continue;
            }

            let version = header[4];
            let frame_id = u32::from_le_bytes([header[5], header[6], header[7], header[8]]);
            let length = u32::from_le_bytes([header[9], header[10], header[11], header[12]]);

            if version != VERSION {
                return Err(CompileError::VersionMismatch {
                    frame_id,
                    found: version,
                });
            }
            if length > MAX_RESIDUAL_SIZE {
                return Err(CompileError::ResidualTooLarge {
                    size: length,
                    limit: MAX_RESIDUAL_SIZE,
                });
            }

            let mut payload = vec![0u8; length as usize];
            let n = read_fill(&mut f, &mut payload)?;
            if n != payload.len() {
                log::warn!("torn residual payload at frame {frame_id}, stopping scan");
                break;
            }

            let content_hash = hex::encode(Sha256::digest(&payload));
            self.residual_index.insert(
                frame_id,
                ResidualRecord {
                    offset: start_off,
                    total_length: REC_HEADER_LEN as u64 + length as u64,
                    content_hash,
                },
            );
            self.scan_stats.records += 1;
        }

        Ok(())
    }

    /// Scan forward from `start_pos` for the next occurrence of
    /// `magic`. Reads in fixed-size chunks, keeping a `magic.len() - 1`
    /// byte overlap so a magic straddling a chunk boundary is still
    /// found. Returns `None` if not found within `MAX_RESYNC_BYTES`.
    fn resync_to_magic(
        f: &mut File,
        magic: &[u8; 4],
        start_pos: u64,
    ) -> Result<Option<u64>, CompileError> {
        let overlap = magic.len() - 1;
        let mut prev_tail: Vec<u8> = Vec::new();
        let mut scanned: u64 = 0;

        f.seek(SeekFrom::Start(start_pos))?;

        while scanned < MAX_RESYNC_BYTES {
            let mut chunk = vec![0u8; RESYNC_CHUNK_SIZE];
            let n = read_fill(f, &mut chunk)?;
            if n == 0 {
                return Ok(None);
            }
            chunk.truncate(n);

            let mut hay = prev_tail.clone();
            hay.extend_from_slice(&chunk);

            if let Some(pos) = hay.windows(magic.len()).position(|w| w == magic) {
                let end_off = f.stream_position()?;
                let start_of_hay = end_off - hay.len() as u64;
                return Ok(Some(start_of_hay + pos as u64));
            }

            prev_tail = if overlap > 0 && hay.len() >= overlap {
                hay[hay.len() - overlap..].to_vec()
            } else {
                hay
            };
            scanned += n as u64;
        }

        Ok(None)
    }

    /// Verify a claimed `(offset, length, expected_frame_id)` against
    /// the physical latent file. Strict offset math: an attacker
    /// swapping or inserting frames must either break the offset
    /// equation or forge the header `frame_id`; this catches both.
    pub fn verify_latent(
        &mut self,
        claimed_offset: u64,
        claimed_len: u64,
        expected_frame_id: u32,
    ) -> Result<(LatentStatus, Option<String>), CompileError> {
        let math_offset = FILE_HEADER_LEN + expected_frame_id as u64 * LATENT_REC_LEN;
        if claimed_offset != math_offset {
            return Ok((
                LatentStatus::OffsetMismatch {
                    claimed: claimed_offset,
                    math: math_offset,
                },
                None,
            ));
        }
        if claimed_len != LATENT_REC_LEN {
            return Ok((
                LatentStatus::LenMismatch {
                    claimed: claimed_len,
                    expected: LATENT_REC_LEN,
                },
                None,
            ));
        }

        self.latent_file.seek(SeekFrom::Start(claimed_offset))?;
        let mut header = [0u8; REC_HEADER_LEN];
        let n = read_fill(&mut self.latent_file, &mut header)?;
        if n < REC_HEADER_LEN {
            return Ok((LatentStatus::Eof, None));
        }

        let magic = &header[0..4];
        let version = header[4];
        let frame_id = u32::from_le_bytes([header[5], header[6], header[7], header[8]]);
        let dlen = u32::from_le_bytes([header[9], header[10], header[11], header[12]]);

        if magic != MAGIC_LATENT_REC {
            return Ok((LatentStatus::BadMagic, None));
        }
        if version != VERSION {
            return Ok((LatentStatus::BadVersion, None));
        }
        if frame_id != expected_frame_id {
            return Ok((
                LatentStatus::Drift {
                    found: frame_id,
                    expected: expected_frame_id,
                },
                None,
            ));
        }
        if dlen != LATENT_DIM {
            return Ok((
                LatentStatus::BadDim {
                    found: dlen,
                    expected: LATENT_DIM,
                },
                None,
            ));
        }

        let mut payload = vec![0u8; dlen as usize];
        let n = read_fill(&mut self.latent_file, &mut payload)?;
        if n != payload.len() {
            return Ok((LatentStatus::TornWrite, None));
        }

        let hash = hex::encode(Sha256::digest(&payload));
        Ok((LatentStatus::Verified, Some(hash)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_latent_file(dir: &Path, frames: u32) -> PathBuf {
        let path = dir.join("cam_latents.bin");
        let mut f = File::create(&path).unwrap();
        f.write_all(&MAGIC_LATENT_FILE).unwrap();
        for fid in 0..frames {
            f.write_all(&MAGIC_LATENT_REC).unwrap();
            f.write_all(&[VERSION]).unwrap();
            f.write_all(&fid.to_le_bytes()).unwrap();
            f.write_all(&LATENT_DIM.to_le_bytes()).unwrap();
            f.write_all(&vec![0xABu8; LATENT_DIM as usize]).unwrap();
        }
        path
    }

    #[test]
    fn verifies_dense_latents() {
        let dir = tempdir().unwrap();
        write_latent_file(dir.path(), 3);
        let mut judge = StrictJudge::open(dir.path()).unwrap();
        for fid in 0..3u32 {
            let offset = FILE_HEADER_LEN + fid as u64 * LATENT_REC_LEN;
            let (status, hash) = judge.verify_latent(offset, LATENT_REC_LEN, fid).unwrap();
            assert_eq!(status, LatentStatus::Verified);
            assert!(hash.is_some());
        }
    }

    #[test]
    fn detects_offset_mismatch() {
        let dir = tempdir().unwrap();
        write_latent_file(dir.path(), 2);
        let mut judge = StrictJudge::open(dir.path()).unwrap();
        let (status, _) = judge.verify_latent(999, LATENT_REC_LEN, 0).unwrap();
        assert!(matches!(status, LatentStatus::OffsetMismatch { .. }));
    }

    #[test]
    fn detects_drift_on_swapped_frames() {
        let dir = tempdir().unwrap();
        let path = write_latent_file(dir.path(), 2);
        // Corrupt frame 0's header frame_id field to look like frame 1.
        let mut f = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        f.seek(SeekFrom::Start(FILE_HEADER_LEN + 5)).unwrap();
        f.write_all(&1u32.to_le_bytes()).unwrap();

        let mut judge = StrictJudge::open(dir.path()).unwrap();
        let offset = FILE_HEADER_LEN;
        let (status, _) = judge.verify_latent(offset, LATENT_REC_LEN, 0).unwrap();
        assert!(matches!(status, LatentStatus::Drift { .. }));
    }

    #[test]
    fn resync_skips_garbage_between_residuals() {
        let dir = tempdir().unwrap();
        write_latent_file(dir.path(), 1);
        let res_path = dir.path().join("cam_residuals.bin");
        let mut f = File::create(&res_path).unwrap();

        let mut write_record = |f: &mut File, fid: u32, payload: &[u8]| {
            f.write_all(&MAGIC_RESID_REC).unwrap();
            f.write_all(&[VERSION]).unwrap();
            f.write_all(&fid.to_le_bytes()).unwrap();
            f.write_all(&(payload.len() as u32).to_le_bytes()).unwrap();
            f.write_all(payload).unwrap();
        };
        write_record(&mut f, 0, b"first-residual-payload");
        f.write_all(&[0x00; 100]).unwrap(); // garbage
        write_record(&mut f, 1, b"second-residual-payload");
        drop(f);

        let judge = StrictJudge::open(dir.path()).unwrap();
        assert_eq!(judge.scan_stats.resyncs, 1);
        assert_eq!(judge.scan_stats.garbage_bytes, 100);
        assert_eq!(judge.residual_index.len(), 2);
    }

    #[test]
    fn fatal_on_oversized_residual_length() {
        let dir = tempdir().unwrap();
        write_latent_file(dir.path(), 1);
        let res_path = dir.path().join("cam_residuals.bin");
        let mut f = File::create(&res_path).unwrap();
        f.write_all(&MAGIC_RESID_REC).unwrap();
        f.write_all(&[VERSION]).unwrap();
        f.write_all(&0u32.to_le_bytes()).unwrap();
        f.write_all(&(MAX_RESIDUAL_SIZE + 1).to_le_bytes()).unwrap();
        drop(f);

        let result = StrictJudge::open(dir.path());
        assert!(matches!(result, Err(CompileError::ResidualTooLarge { .. })));
    }
}
