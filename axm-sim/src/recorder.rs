//! Pre/post-trigger residual recorder, grounded on the reference
//! simulator's `ResidualRecorder`: while idle it keeps a fixed-size
//! ring buffer of recent frames; once triggered it flushes that
//! history and then writes the next `post_window` frames straight
//! through.

use std::collections::VecDeque;
use std::fs::File;
use std::io::Write;

use axm_core::protocol::{MAGIC_RESID_REC, VERSION};

pub struct ResidualRecorder {
    file: File,
    buffer: VecDeque<Vec<u8>>,
    pre_window: usize,
    post_window: u32,
    recording_frames_left: u32,
}

pub enum PushOutcome {
    Buffered,
    Written,
}

fn record_blob(frame_id: u32, data: &[u8]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(13 + data.len());
    blob.extend_from_slice(&MAGIC_RESID_REC);
    blob.push(VERSION);
    blob.extend_from_slice(&frame_id.to_le_bytes());
    blob.extend_from_slice(&(data.len() as u32).to_le_bytes());
    blob.extend_from_slice(data);
    blob
}

impl ResidualRecorder {
    pub fn new(file: File, pre_window: usize, post_window: u32) -> Self {
        ResidualRecorder {
            file,
            buffer: VecDeque::with_capacity(pre_window),
            pre_window,
            post_window,
            recording_frames_left: 0,
        }
    }

    /// Ingest one frame's residual payload. While recording, writes
    /// directly; otherwise rings it into the pre-trigger buffer.
    pub fn push(&mut self, frame_id: u32, data: &[u8]) -> std::io::Result<PushOutcome> {
        let blob = record_blob(frame_id, data);

        if self.recording_frames_left > 0 {
            self.file.write_all(&blob)?;
            self.recording_frames_left -= 1;
            if self.recording_frames_left == 0 {
                self.file.flush()?;
                self.file.sync_data()?;
            }
            Ok(PushOutcome::Written)
        } else {
            if self.buffer.len() == self.pre_window {
                self.buffer.pop_front();
            }
            self.buffer.push_back(blob);
            Ok(PushOutcome::Buffered)
        }
    }

    /// Transition from buffering to recording: flush the pre-trigger
    /// history, then open a `post_window`-frame recording run. A
    /// second trigger while already recording is a no-op.
    pub fn trigger(&mut self) -> std::io::Result<()> {
        if self.recording_frames_left > 0 {
            return Ok(());
        }
        while let Some(blob) = self.buffer.pop_front() {
            self.file.write_all(&blob)?;
        }
        self.file.flush()?;
        self.file.sync_data()?;
        self.recording_frames_left = self.post_window;
        Ok(())
    }
}
