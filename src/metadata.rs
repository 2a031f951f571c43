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
    path::{Path, PathBuf},
    time::Duration,
};

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::{MimeType, PictureType};
use lofty::probe::Probe;
use lofty::tag::Accessor;

/// Tag and stream metadata for one audio file. The pipeline only needs the
/// duration; the command interface uses the rest for announcements.
pub struct TrackInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub duration: Duration,
    pub cover: Option<Cover>,
}

/// An embedded cover image, for frontends that can attach images.
#[allow(dead_code)]
pub struct Cover {
    pub data: Vec<u8>,
    pub mime: String,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unreadable metadata for {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        source: lofty::error::LoftyError,
    },
}

/// Reads title, artist, duration and cover art from the given audio file.
pub fn read(path: &Path) -> Result<TrackInfo, Error> {
    let unreadable = |source| Error::Unreadable {
        path: path.to_path_buf(),
        source,
    };
    let tagged_file = Probe::open(path)
        .map_err(unreadable)?
        .read()
        .map_err(unreadable)?;

    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    let title = tag.and_then(|t| t.title().map(|s| s.to_string()));
    let artist = tag.and_then(|t| t.artist().map(|s| s.to_string()));
    let duration = tagged_file.properties().duration();

    // Prefer the front cover, fall back to the first embedded picture.
    let cover = tag.and_then(|t| {
        let pictures = t.pictures();
        let picture = pictures
            .iter()
            .find(|p| p.pic_type() == PictureType::CoverFront)
            .or_else(|| pictures.first())?;
        let mime = match picture.mime_type() {
            Some(MimeType::Png) => "image/png",
            _ => "image/jpeg",
        };
        Some(Cover {
            data: picture.data().to_vec(),
            mime: mime.to_string(),
        })
    });

    Ok(TrackInfo {
        title,
        artist,
        duration,
        cover,
    })
}

/// The user-facing fallback title for an untagged file: the file stem.
pub fn display_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod test {
    use std::io::Write;
    use std::path::Path;
    use std::time::Duration;

    use super::{display_title, read};

    #[test]
    fn test_read_wav_duration() {
        let dir = tempfile::tempdir().expect("unable to create tempdir");
        let path = dir.path().join("tone.wav");

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).expect("unable to create wav");
        for _ in 0..(48000 * 2 * 2) {
            writer.write_sample(0i16).expect("unable to write sample");
        }
        writer.finalize().expect("unable to finalize wav");

        let info = read(&path).expect("unable to read metadata");
        assert_eq!(info.duration, Duration::from_secs(2));

        // A bare WAV has no tags, so the caller falls back to the file stem.
        assert!(info.title.is_none());
        assert!(info.artist.is_none());
        assert!(info.cover.is_none());
        assert_eq!(display_title(&path), "tone");
    }

    #[test]
    fn test_read_non_audio_file() {
        let dir = tempfile::tempdir().expect("unable to create tempdir");
        let path = dir.path().join("not-audio.mp3");
        let mut file = std::fs::File::create(&path).expect("unable to create file");
        writeln!(file, "this is not audio").expect("unable to write");

        assert!(read(&path).is_err());
    }

    #[test]
    fn test_read_missing_file() {
        assert!(read(Path::new("does-not-exist.mp3")).is_err());
    }
}
