//! Flips one byte in `cam_latents.bin`'s first record to demonstrate
//! the Strict Judge's drift detection (SPEC_FULL.md §8, scenario S3).
//! File magic is 4 bytes, the record header is 13 bytes; this flips
//! byte 8, inside the `frame_id` field, inducing drift rather than a
//! bad-magic or bad-version failure.

use std::io;
use std::path::Path;

/// Byte offset flipped by [`corrupt_one_byte`], inside the first
/// latent record's `frame_id` field.
pub const CORRUPT_OFFSET: usize = 4 + 8;

/// Flip one bit of the byte at [`CORRUPT_OFFSET`] in `path`, in place.
/// Returns the offset flipped. Refuses files under 64 bytes, mirroring
/// `scripts/corrupt_one_byte.py`'s "too small to corrupt safely" guard.
pub fn corrupt_one_byte(path: &Path) -> io::Result<usize> {
    let mut bytes = std::fs::read(path)?;

    if bytes.len() < 64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "file too small to corrupt safely",
        ));
    }

    bytes[CORRUPT_OFFSET] ^= 0x01;
    std::fs::write(path, &bytes)?;
    Ok(CORRUPT_OFFSET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn flips_the_expected_offset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cam_latents.bin");
        std::fs::write(&path, vec![0u8; 128]).unwrap();

        let before = std::fs::read(&path).unwrap();
        let offset = corrupt_one_byte(&path).unwrap();
        let after = std::fs::read(&path).unwrap();

        assert_eq!(offset, CORRUPT_OFFSET);
        assert_ne!(before[offset], after[offset]);
        for i in 0..after.len() {
            if i != offset {
                assert_eq!(before[i], after[i]);
            }
        }
    }

    #[test]
    fn refuses_files_that_are_too_small() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiny.bin");
        std::fs::write(&path, vec![0u8; 32]).unwrap();

        assert!(corrupt_one_byte(&path).is_err());
    }
}
