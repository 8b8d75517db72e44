//! Synthetic Capsule generator, grounded on `tools/sim_robot_final.py`
//! in the reference corpus: drives a configurable-length session
//! through the same on-disk layout the Strict Judge and extractor
//! expect (`events.jsonl`, `cam_latents.bin`, `cam_residuals.bin`),
//! with an optional mid-session `wheel_slip` trigger followed by a
//! `recovery_action` a few frames later — the combined crash/recovery
//! scenario is grounded on `tools/sim_robot.py` (Phase 1), the only
//! place in the reference corpus that emits `recovery_action`.
//!
//! Frame payloads are filled deterministically from a caller-supplied
//! seed via repeated SHA-256 expansion rather than a `rand` dependency
//! — this crate only ever needs reproducible filler bytes, not a real
//! RNG.

pub mod error;
pub mod recorder;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use axm_core::protocol::{FILE_HEADER_LEN, LATENT_DIM, LATENT_REC_LEN, MAGIC_LATENT_FILE, MAGIC_LATENT_REC, VERSION};

use error::SimError;
use recorder::ResidualRecorder;

const FPS: u32 = 10;
const PRE_WINDOW_FRAMES: usize = (FPS * 2) as usize;
const POST_WINDOW_FRAMES: u32 = FPS * 2;
const RESIDUAL_PAYLOAD_LEN: usize = 50 * 1024;

/// Frames after the `wheel_slip` trigger at which `recovery_action`
/// fires, mirroring Phase 1's ~0.05s reaction latency.
const RECOVERY_FRAME_OFFSET: u32 = 3;
const RECOVERY_ACTION: &str = "reduce_throttle";
const RECOVERY_VALUE: f64 = 0.3;

const SURFACE_CHOICES: [&str; 5] = ["asphalt", "concrete", "gravel", "wet_asphalt", "ice"];

/// Expand `seed` into a deterministic byte stream of length `len`,
/// stretching SHA-256 over an incrementing counter the way a stream
/// cipher's keystream generator would.
fn pseudo_random_bytes(seed: u64, counter: u64, len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    let mut block: u64 = 0;
    while out.len() < len {
        let mut hasher = Sha256::new();
        hasher.update(seed.to_le_bytes());
        hasher.update(counter.to_le_bytes());
        hasher.update(block.to_le_bytes());
        out.extend_from_slice(&hasher.finalize());
        block += 1;
    }
    out.truncate(len);
    out
}

fn session_id_from(seed: u64, crash: bool) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update([crash as u8]);
    hex::encode(&hasher.finalize()[..8])
}

/// Generate one synthetic Capsule directory under `out_dir`, named
/// `capsule-<8 hex chars>`.
///
/// `frame_count` is the number of latent/residual frames to emit.
/// `crash` controls whether a `wheel_slip` event fires at the session
/// midpoint, triggering the residual recorder's post-window recording
/// run, followed `RECOVERY_FRAME_OFFSET` frames later by a
/// `recovery_action` event (skipped if the midpoint leaves fewer than
/// `RECOVERY_FRAME_OFFSET` frames remaining). `seed` makes the frame
/// contents (but not the directory name) reproducible across calls.
pub fn generate_session(out_dir: &Path, crash: bool, frame_count: u32, seed: u64) -> Result<PathBuf, SimError> {
    let session_id = session_id_from(seed, crash);
    let capsule_dir = out_dir.join(format!("capsule-{session_id}"));
    fs::create_dir_all(&capsule_dir)?;

    let mut latents = File::create(capsule_dir.join("cam_latents.bin"))?;
    let residuals_file = File::create(capsule_dir.join("cam_residuals.bin"))?;
    let mut events = File::create(capsule_dir.join("events.jsonl"))?;

    latents.write_all(&MAGIC_LATENT_FILE)?;
    let mut recorder = ResidualRecorder::new(residuals_file, PRE_WINDOW_FRAMES, POST_WINDOW_FRAMES);

    let trigger_frame = frame_count / 2;
    let recovery_frame = trigger_frame + RECOVERY_FRAME_OFFSET;

    log::info!("generating capsule {session_id} (crash={crash}, frames={frame_count})");

    for frame_id in 0..frame_count {
        let mut event = serde_json::Map::new();
        if crash && frame_id == trigger_frame {
            event.insert("evt".into(), serde_json::json!("wheel_slip"));
            event.insert("lvl".into(), serde_json::json!("WARN"));
            event.insert("surface".into(), serde_json::json!(SURFACE_CHOICES[0]));
            recorder.trigger()?;
        } else if crash && frame_id == recovery_frame && recovery_frame < frame_count {
            event.insert("evt".into(), serde_json::json!("recovery_action"));
            event.insert("action".into(), serde_json::json!(RECOVERY_ACTION));
            event.insert("value".into(), serde_json::json!(RECOVERY_VALUE));
        }

        let latent_payload = pseudo_random_bytes(seed, frame_id as u64, LATENT_DIM as usize);
        let residual_payload = pseudo_random_bytes(seed, 1_000_000 + frame_id as u64, RESIDUAL_PAYLOAD_LEN);

        let lat_offset = FILE_HEADER_LEN + frame_id as u64 * LATENT_REC_LEN;
        latents.write_all(&MAGIC_LATENT_REC)?;
        latents.write_all(&[VERSION])?;
        latents.write_all(&frame_id.to_le_bytes())?;
        latents.write_all(&LATENT_DIM.to_le_bytes())?;
        latents.write_all(&latent_payload)?;
        latents.sync_data()?;

        recorder.push(frame_id, &residual_payload)?;

        event.insert("frame_id".into(), serde_json::json!(frame_id));
        event.insert(
            "stream_refs".into(),
            serde_json::json!({
                "latents": {
                    "file": "cam_latents.bin",
                    "offset": lat_offset,
                    "length": LATENT_REC_LEN,
                }
            }),
        );
        writeln!(events, "{}", serde_json::Value::Object(event))?;
    }

    let meta = serde_json::json!({
        "session_id": session_id,
        "robot_id": "sim-final",
        "started_at": chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    });
    fs::write(capsule_dir.join("meta.json"), serde_json::to_vec(&meta)?)?;

    Ok(capsule_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn generates_a_capsule_with_the_expected_layout() {
        let out = tempdir().unwrap();
        let capsule = generate_session(out.path(), false, 100, 42).unwrap();

        assert!(capsule.join("events.jsonl").exists());
        assert!(capsule.join("cam_latents.bin").exists());
        assert!(capsule.join("cam_residuals.bin").exists());
        assert!(capsule.join("meta.json").exists());

        let latents = fs::read(capsule.join("cam_latents.bin")).unwrap();
        assert_eq!(&latents[..4], &MAGIC_LATENT_FILE);
        assert_eq!(latents.len() as u64, FILE_HEADER_LEN + 100u64 * LATENT_REC_LEN);

        let events = fs::read_to_string(capsule.join("events.jsonl")).unwrap();
        assert_eq!(events.lines().count(), 100);
    }

    #[test]
    fn safe_run_never_flushes_residuals() {
        let out = tempdir().unwrap();
        let capsule = generate_session(out.path(), false, 30, 11).unwrap();
        let residuals = fs::read(capsule.join("cam_residuals.bin")).unwrap();
        assert!(residuals.is_empty());
    }

    #[test]
    fn crash_run_emits_wheel_slip_then_recovery_action() {
        let out = tempdir().unwrap();
        let capsule = generate_session(out.path(), true, 100, 7).unwrap();

        let events = fs::read_to_string(capsule.join("events.jsonl")).unwrap();
        assert!(events.contains("wheel_slip"));
        assert!(events.contains("recovery_action"));
        assert!(events.contains("reduce_throttle"));

        let residuals = fs::read(capsule.join("cam_residuals.bin")).unwrap();
        // Pre-window history plus the post-window run must have been
        // flushed to disk, so the file must not be empty.
        assert!(!residuals.is_empty());
    }

    #[test]
    fn same_seed_is_byte_deterministic() {
        let out_a = tempdir().unwrap();
        let out_b = tempdir().unwrap();
        let cap_a = generate_session(out_a.path(), false, 50, 99).unwrap();
        let cap_b = generate_session(out_b.path(), false, 50, 99).unwrap();

        assert_eq!(
            fs::read(cap_a.join("cam_latents.bin")).unwrap(),
            fs::read(cap_b.join("cam_latents.bin")).unwrap()
        );
        assert_eq!(cap_a.file_name(), cap_b.file_name());
    }
}
