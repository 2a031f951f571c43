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
    fmt, fs, io,
    path::{Path, PathBuf},
};

/// A genre names a track folder and an optional voice line folder inside
/// the content root.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Genre(String);

impl Genre {
    pub fn new(name: &str) -> Genre {
        Genre(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors encountered while listing a genre's audio files. Both variants are
/// recoverable for the station: the offending genre cycle is skipped.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("genre {genre} has no track directory at {}", path.display())]
    DirectoryMissing { genre: Genre, path: PathBuf },

    #[error("genre {genre} has no playable tracks")]
    EmptyListing { genre: Genre },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// The on-disk audio library. The content root contains a `music/<genre>`
/// tree and an optional `voice/<genre>` tree, filtered by a single audio
/// file extension.
pub struct Library {
    music_root: PathBuf,
    voice_root: PathBuf,
    extension: String,
}

impl Library {
    /// Creates a library rooted at the given content directory.
    pub fn new(root: &Path, extension: &str) -> Library {
        Library {
            music_root: root.join("music"),
            voice_root: root.join("voice"),
            extension: extension.to_string(),
        }
    }

    /// Lists the genre's tracks, sorted. A missing track directory is an
    /// error, as a genre without its track folder is misconfigured.
    pub fn tracks(&self, genre: &Genre) -> Result<Vec<PathBuf>, Error> {
        let dir = self.music_root.join(genre.as_str());
        if !dir.is_dir() {
            return Err(Error::DirectoryMissing {
                genre: genre.clone(),
                path: dir,
            });
        }
        self.list(&dir)
    }

    /// Lists the genre's voice lines, sorted. Voice lines are an enhancement,
    /// so a missing directory yields an empty listing rather than an error.
    pub fn voice_lines(&self, genre: &Genre) -> Result<Vec<PathBuf>, Error> {
        let dir = self.voice_root.join(genre.as_str());
        if !dir.is_dir() {
            return Ok(vec![]);
        }
        self.list(&dir)
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, Error> {
        let mut files: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == self.extension.as_str())
            {
                files.push(path);
            }
        }
        // Sort so that listings are deterministic before any shuffle.
        files.sort();
        Ok(files)
    }
}
