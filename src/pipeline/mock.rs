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
    collections::HashSet,
    fmt,
    io::Cursor,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use crate::pipeline::{Error, PcmStream};

/// Canned PCM per mock stream: a handful of silent frames.
const MOCK_PCM_BYTES: usize = 4096;

/// An item the mock pipeline was asked to open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Open {
    pub path: PathBuf,
    pub fade: Duration,
}

/// A mock pipeline. Emits canned silence instead of transcoding and records
/// every open so tests can assert on the playback order and fades.
pub struct Pipeline {
    name: String,
    opens: Mutex<Vec<Open>>,
    fail: Mutex<HashSet<PathBuf>>,
}

impl Pipeline {
    /// Gets the given mock pipeline.
    pub fn get(name: &str) -> Pipeline {
        Pipeline {
            name: name.to_string(),
            opens: Mutex::new(Vec::new()),
            fail: Mutex::new(HashSet::new()),
        }
    }

    /// Marks a path as failing, as if the file vanished after queueing.
    #[cfg(test)]
    pub fn fail_path(&self, path: &Path) {
        self.fail
            .lock()
            .expect("unable to get lock")
            .insert(path.to_path_buf());
    }

    /// Every open recorded so far, in order.
    #[cfg(test)]
    pub fn opens(&self) -> Vec<Open> {
        self.opens.lock().expect("unable to get lock").clone()
    }
}

impl crate::pipeline::Pipeline for Pipeline {
    fn open(&self, path: &Path, fade: Duration) -> Result<PcmStream, Error> {
        if self
            .fail
            .lock()
            .expect("unable to get lock")
            .contains(path)
        {
            return Err(Error::FileMissing(path.to_path_buf()));
        }

        self.opens.lock().expect("unable to get lock").push(Open {
            path: path.to_path_buf(),
            fade,
        });

        Ok(PcmStream::new(Box::new(Cursor::new(vec![
            0u8;
            MOCK_PCM_BYTES
        ]))))
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
