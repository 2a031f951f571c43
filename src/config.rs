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
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use duration_string::DurationString;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::commands::Commands;
use crate::controller::{keyboard, Controller};
use crate::library::{Genre, Library};
use crate::session;
use crate::{pipeline, sink};

const DEFAULT_EXTENSION: &str = "mp3";
const DEFAULT_SINK_DEVICE: &str = "default";
const DEFAULT_PIPELINE_BINARY: &str = "ffmpeg";
const DEFAULT_ADMIN_ROLE: &str = "Directors";
const DEFAULT_VOICE_LINE_FADE: Duration = Duration::from_secs(1);
const DEFAULT_TRACK_FADE: Duration = Duration::from_secs(6);

/// A YAML representation of the station configuration.
#[derive(Deserialize, Clone)]
pub struct Station {
    /// The content root, containing the music/ and voice/ trees.
    library: String,

    /// The genres in the rotation, one subdirectory per genre.
    genres: Vec<String>,

    /// The audio file extension to play. Defaults to mp3.
    extension: Option<String>,

    /// The sink output device. Defaults to the system default device.
    sink_device: Option<String>,

    /// The transcoder binary. Defaults to ffmpeg on the PATH.
    pipeline_binary: Option<String>,

    /// The initial gain for each item, 0.0 to 1.0. Defaults to 0.4.
    default_volume: Option<f32>,

    /// Fade applied to voice lines. Defaults to 1s.
    voice_line_fade: Option<String>,

    /// Fade applied to tracks. Defaults to 6s.
    track_fade: Option<String>,

    /// The role required to adjust the volume.
    admin_role: Option<String>,
}

impl Station {
    /// Returns the content root.
    pub fn library(&self) -> PathBuf {
        PathBuf::from(&self.library)
    }

    /// Returns the configured genres. At least one is required.
    pub fn genres(&self) -> Result<Vec<Genre>, Box<dyn Error>> {
        if self.genres.is_empty() {
            return Err("the station requires at least one genre".into());
        }
        Ok(self.genres.iter().map(|name| Genre::new(name)).collect())
    }

    /// Returns the audio file extension.
    pub fn extension(&self) -> &str {
        self.extension.as_deref().unwrap_or(DEFAULT_EXTENSION)
    }

    /// Returns the sink output device name.
    pub fn sink_device(&self) -> &str {
        self.sink_device.as_deref().unwrap_or(DEFAULT_SINK_DEVICE)
    }

    /// Returns the transcoder binary.
    pub fn pipeline_binary(&self) -> &str {
        self.pipeline_binary
            .as_deref()
            .unwrap_or(DEFAULT_PIPELINE_BINARY)
    }

    /// Returns the initial gain for each item.
    pub fn default_volume(&self) -> f32 {
        self.default_volume.unwrap_or(session::DEFAULT_VOLUME)
    }

    /// Returns the fade applied to voice lines.
    pub fn voice_line_fade(&self) -> Result<Duration, Box<dyn Error>> {
        match &self.voice_line_fade {
            Some(fade) => Ok(DurationString::from_string(fade.clone())?.into()),
            None => Ok(DEFAULT_VOICE_LINE_FADE),
        }
    }

    /// Returns the fade applied to tracks.
    pub fn track_fade(&self) -> Result<Duration, Box<dyn Error>> {
        match &self.track_fade {
            Some(fade) => Ok(DurationString::from_string(fade.clone())?.into()),
            None => Ok(DEFAULT_TRACK_FADE),
        }
    }

    /// Returns the role required to adjust the volume.
    pub fn admin_role(&self) -> &str {
        self.admin_role.as_deref().unwrap_or(DEFAULT_ADMIN_ROLE)
    }
}

/// Parses a station configuration from a YAML file.
pub fn parse_station(file: &Path) -> Result<Station, Box<dyn Error>> {
    let station: Station = serde_yml::from_str(&fs::read_to_string(file)?)?;
    Ok(station)
}

/// Initializes the station and controller from the given config file. The
/// station owns the rotation loop; the controller serves user commands. The
/// sink is opened here, and failing to open it aborts startup.
pub fn init_station(
    config_path: &Path,
) -> Result<(crate::station::Station, Controller), Box<dyn Error>> {
    let config = parse_station(config_path)?;

    let library = Library::new(&config.library(), config.extension());
    let sink = sink::get_sink(config.sink_device())?;
    let session = Arc::new(session::Session::new(sink, config.default_volume()));
    let pipeline = pipeline::get_pipeline(config.pipeline_binary());

    let station = crate::station::Station::new(
        library,
        config.genres()?,
        pipeline,
        session,
        config.voice_line_fade()?,
        config.track_fade()?,
        StdRng::from_entropy(),
    )?;

    let commands = Commands::new(station.handle(), config.admin_role());
    let controller = Controller::new(commands, Arc::new(keyboard::Driver::new()))?;
    Ok((station, controller))
}
