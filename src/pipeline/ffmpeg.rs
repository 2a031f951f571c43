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
    fmt,
    path::Path,
    process::{Command, Stdio},
    time::Duration,
};

use tracing::{info, span, Level};

use crate::metadata;
use crate::pipeline::{fade_out_start, Error, PcmStream, CHANNELS, SAMPLE_RATE};

/// A pipeline backed by an external ffmpeg process. The file's duration is
/// probed up front to position the fade-out, then ffmpeg decodes, applies
/// both fade filters, and streams s16le PCM to its stdout.
pub struct Pipeline {
    binary: String,
}

impl Pipeline {
    pub fn new(binary: &str) -> Pipeline {
        Pipeline {
            binary: binary.to_string(),
        }
    }
}

impl crate::pipeline::Pipeline for Pipeline {
    fn open(&self, path: &Path, fade: Duration) -> Result<PcmStream, Error> {
        let pipeline_span = span!(Level::INFO, "pipeline (ffmpeg)");
        let _enter = pipeline_span.enter();

        // Detect a vanished file before spawning anything.
        if !path.is_file() {
            return Err(Error::FileMissing(path.to_path_buf()));
        }

        let duration = metadata::read(path)?.duration;
        let fade_secs = fade.as_secs_f64();
        let filters = format!(
            "afade=t=in:ss=0:d={},afade=t=out:st={}:d={}",
            fade_secs,
            fade_out_start(duration, fade).as_secs_f64(),
            fade_secs,
        );

        let child = Command::new(&self.binary)
            .arg("-i")
            .arg(path)
            .arg("-af")
            .arg(&filters)
            .arg("-f")
            .arg("s16le")
            .arg("-ac")
            .arg(CHANNELS.to_string())
            .arg("-ar")
            .arg(SAMPLE_RATE.to_string())
            .arg("-vn")
            .arg("pipe:1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        info!(
            path = %path.display(),
            filters = filters,
            "Transcoder started."
        );

        PcmStream::from_child(child)
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ffmpeg)", self.binary)
    }
}
