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
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use crate::pipeline::PcmStream;

pub mod cpal;
pub mod mock;

/// A live gain value shared between the playing resource and the volume
/// command path. Replaced wholesale when a new item starts; the sink reads it
/// per buffer so changes are audible immediately.
#[derive(Clone)]
pub struct Volume(Arc<AtomicU32>);

impl Volume {
    /// Creates a volume at the given linear level.
    pub fn new(level: f32) -> Volume {
        Volume(Arc::new(AtomicU32::new(level.to_bits())))
    }

    /// The current linear level.
    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Sets the linear level, audible without interrupting playback.
    pub fn set(&self, level: f32) {
        self.0.store(level.to_bits(), Ordering::Relaxed);
    }
}

/// One bound playback resource: the PCM stream and its live gain.
pub struct Resource {
    pub pcm: PcmStream,
    pub volume: Volume,
}

/// The live output destination. Accepts one resource at a time; play blocks
/// on the calling thread until the resource has been fully consumed, which is
/// the sink's idle signal.
pub trait Sink: fmt::Display + Send + Sync {
    fn play(&self, resource: Resource) -> Result<(), Box<dyn Error>>;
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<String>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets the sink with the given device name. Names starting with "mock"
/// resolve to the mock sink.
pub fn get_sink(device: &str) -> Result<Arc<dyn Sink>, Box<dyn Error>> {
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device)));
    }

    Ok(Arc::new(cpal::Device::get(device)?))
}

#[cfg(test)]
mod test {
    use super::Volume;

    #[test]
    fn test_volume_round_trip() {
        let volume = Volume::new(0.4);
        assert_eq!(volume.get(), 0.4);

        let shared = volume.clone();
        shared.set(0.3);
        assert_eq!(volume.get(), 0.3);
    }
}
