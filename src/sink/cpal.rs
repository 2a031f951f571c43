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
    collections::VecDeque,
    error::Error,
    fmt,
    io::Read,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info, span, Level};

use crate::pipeline::{BYTES_PER_FRAME, CHANNELS, SAMPLE_RATE};
use crate::sink::Resource;

/// Roughly half a second of buffered stereo samples between the reader and
/// the output callback.
const BUFFER_CAP_SAMPLES: usize = SAMPLE_RATE as usize;
const READ_CHUNK_BYTES: usize = 4096;

/// A sink bound to a local cpal output device.
pub struct Device {
    name: String,
    device: cpal::Device,
}

impl Device {
    /// Lists the names of all output devices on the default host.
    pub fn list() -> Result<Vec<String>, Box<dyn Error>> {
        let host = cpal::default_host();
        let mut names: Vec<String> = Vec::new();
        for device in host.output_devices()? {
            names.push(device.name()?);
        }
        Ok(names)
    }

    /// Gets the output device with the given name. The name "default"
    /// resolves to the host's default output device.
    pub fn get(name: &str) -> Result<Device, Box<dyn Error>> {
        let host = cpal::default_host();

        if name == "default" {
            let device = host
                .default_output_device()
                .ok_or("no default output device")?;
            let name = device.name()?;
            return Ok(Device { name, device });
        }

        for device in host.output_devices()? {
            if device.name()? == name {
                return Ok(Device {
                    name: name.to_string(),
                    device,
                });
            }
        }

        Err(format!("no output device found with name {}", name).into())
    }
}

impl crate::sink::Sink for Device {
    /// Streams the resource's PCM to the output device, applying the live
    /// gain per sample, and returns once the stream has fully drained.
    fn play(&self, resource: Resource) -> Result<(), Box<dyn Error>> {
        let play_span = span!(Level::INFO, "play resource (cpal)");
        let _enter = play_span.enter();

        info!(device = self.name, "Binding resource to output device.");

        let config = cpal::StreamConfig {
            channels: CHANNELS,
            sample_rate: cpal::SampleRate(SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        };

        let buffer: Arc<Mutex<VecDeque<f32>>> = Arc::new(Mutex::new(VecDeque::new()));
        let volume = resource.volume.clone();

        let stream = {
            let buffer = buffer.clone();
            self.device.build_output_stream(
                &config,
                move |data: &mut [f32], _| {
                    let gain = volume.get();
                    let mut buffer = buffer.lock().expect("unable to get lock");
                    for sample in data.iter_mut() {
                        // Underruns play silence rather than stalling the
                        // device.
                        *sample = buffer.pop_front().unwrap_or(0.0) * gain;
                    }
                },
                |e| error!(err = format!("{}", e), "Output stream error."),
                None,
            )?
        };
        stream.play()?;

        // Feed the buffer from the PCM stream until EOF. Early EOF from a
        // dying transcoder simply ends the resource.
        let mut pcm = resource.pcm;
        let mut chunk = [0u8; READ_CHUNK_BYTES];
        let mut offset = 0;
        loop {
            {
                let queued = buffer.lock().expect("unable to get lock").len();
                if queued > BUFFER_CAP_SAMPLES {
                    thread::sleep(Duration::from_millis(10));
                    continue;
                }
            }

            let read = match pcm.read(&mut chunk[offset..]) {
                Ok(read) => read,
                Err(e) => {
                    error!(err = format!("{}", e), "Error reading PCM stream.");
                    break;
                }
            };
            if read == 0 {
                break;
            }

            offset = queue_samples(&buffer, &mut chunk, offset + read);
        }

        // Let the callback drain what remains before tearing the stream down.
        loop {
            if buffer.lock().expect("unable to get lock").is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        drop(stream);

        info!(device = self.name, "Resource fully consumed.");
        Ok(())
    }
}

/// Queues the complete little endian samples in `chunk[..len]` and moves any
/// trailing odd byte to the front of the chunk, returning the new chunk
/// offset. Pipe reads can return odd lengths, and dropping the trailing byte
/// would pair every later sample's bytes wrong.
fn queue_samples(buffer: &Mutex<VecDeque<f32>>, chunk: &mut [u8], len: usize) -> usize {
    let even = len - len % 2;
    {
        let mut buffer = buffer.lock().expect("unable to get lock");
        for sample in chunk[..even].chunks_exact(2) {
            let sample = i16::from_le_bytes([sample[0], sample[1]]);
            buffer.push_back(f32::from(sample) / f32::from(i16::MAX));
        }
    }
    if even < len {
        chunk[0] = chunk[even];
    }
    len - even
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (CPAL)", self.name)
    }
}


// The frame constant exists to document the wire format; assert the
// relationship here so a format change cannot drift silently.
const _: () = assert!(BYTES_PER_FRAME == CHANNELS as usize * 2);
