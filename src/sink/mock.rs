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
    io::Read,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

use crate::sink::Resource;

/// One completed mock playback.
#[derive(Clone, Debug)]
pub struct Play {
    /// Bytes consumed from the PCM stream.
    pub bytes: usize,
    /// The gain at the moment the resource finished.
    pub volume: f32,
}

/// A mock sink. Drains the PCM stream without producing sound.
#[derive(Clone)]
pub struct Device {
    name: String,
    /// Held for this long per resource, so tests can observe playback in
    /// flight.
    delay: Duration,
    is_playing: Arc<AtomicBool>,
    plays: Arc<Mutex<Vec<Play>>>,
}

impl Device {
    /// Gets the given mock sink.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            delay: Duration::ZERO,
            is_playing: Arc::new(AtomicBool::new(false)),
            plays: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A mock sink that holds each resource for the given duration.
    #[cfg(test)]
    pub fn with_delay(name: &str, delay: Duration) -> Device {
        let mut device = Device::get(name);
        device.delay = delay;
        device
    }

    /// Returns true while a resource is being consumed.
    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.is_playing.load(Ordering::Relaxed)
    }

    /// Every completed playback so far, in order.
    #[cfg(test)]
    pub fn plays(&self) -> Vec<Play> {
        self.plays.lock().expect("unable to get lock").clone()
    }
}

impl crate::sink::Sink for Device {
    fn play(&self, resource: Resource) -> Result<(), Box<dyn Error>> {
        self.is_playing.store(true, Ordering::Relaxed);

        let mut pcm = resource.pcm;
        let mut bytes = Vec::new();
        let read = pcm.read_to_end(&mut bytes);

        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        self.is_playing.store(false, Ordering::Relaxed);
        let read = read?;

        self.plays.lock().expect("unable to get lock").push(Play {
            bytes: read,
            volume: resource.volume.get(),
        });

        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
