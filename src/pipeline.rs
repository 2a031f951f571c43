// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{
    fmt, io,
    io::Read,
    path::{Path, PathBuf},
    process::Child,
    sync::Arc,
    time::Duration,
};

use crate::metadata;

pub mod ffmpeg;
pub mod mock;

/// The PCM format every pipeline implementation emits: signed 16-bit little
/// endian, interleaved stereo, 48 kHz.
pub const CHANNELS: u16 = 2;
pub const SAMPLE_RATE: u32 = 48000;
pub const BYTES_PER_FRAME: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("file missing: {}", .0.display())]
    FileMissing(PathBuf),

    #[error("unable to probe duration: {0}")]
    Probe(#[from] metadata::Error),

    #[error("pipeline process error: {0}")]
    Process(#[from] io::Error),
}

/// Decodes an audio file into a faded PCM stream. The production
/// implementation shells out to an external transcoder; the mock returns
/// canned PCM for tests and dry runs.
pub trait Pipeline: fmt::Display + Send + Sync {
    /// Opens the given file as a PCM stream with a fade-in at the start and a
    /// fade-out over the final `fade` of its duration. Any error here means
    /// the item never starts, and the caller treats it as already finished.
    fn open(&self, path: &Path, fade: Duration) -> Result<PcmStream, Error>;
}

/// When the fade-out should begin: fades never start before the beginning of
/// the file, even when the file is shorter than the fade itself.
pub fn fade_out_start(duration: Duration, fade: Duration) -> Duration {
    duration.saturating_sub(fade)
}

/// A raw PCM byte stream produced by a pipeline. Holds the transcoder child
/// process, if any, so it can be reaped when the stream is dropped.
pub struct PcmStream {
    reader: Box<dyn Read + Send>,
    child: Option<Child>,
}

impl PcmStream {
    /// Wraps a plain reader, for pipelines with no external process.
    pub fn new(reader: Box<dyn Read + Send>) -> PcmStream {
        PcmStream {
            reader,
            child: None,
        }
    }

    /// Wraps a spawned transcoder's stdout.
    pub(crate) fn from_child(mut child: Child) -> Result<PcmStream, Error> {
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Process(io::Error::other("transcoder stdout not captured")))?;
        Ok(PcmStream {
            reader: Box::new(stdout),
            child: Some(child),
        })
    }
}

impl Read for PcmStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Drop for PcmStream {
    fn drop(&mut self) {
        // Reap the transcoder. After EOF it has already exited and the wait
        // returns immediately; the kill covers early teardown.
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Gets a pipeline for the given transcoder binary. Binary names starting
/// with "mock" resolve to the mock pipeline.
pub fn get_pipeline(binary: &str) -> Arc<dyn Pipeline> {
    if binary.starts_with("mock") {
        return Arc::new(mock::Pipeline::get(binary));
    }

    Arc::new(ffmpeg::Pipeline::new(binary))
}
