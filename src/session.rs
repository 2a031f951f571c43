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
use std::sync::{Arc, RwLock};

use tracing::{error, span, Level, Span};

use crate::pipeline::PcmStream;
use crate::sink::{Resource, Sink, Volume};

/// The linear gain applied to every resource when it starts.
pub const DEFAULT_VOLUME: f32 = 0.4;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no track is currently playing")]
    NoActiveResource,
}

/// The playback session: bridges pipeline output to the sink and holds the
/// single active resource's gain so volume commands can reach it while the
/// resource plays.
pub struct Session {
    /// The sink resources are bound to.
    sink: Arc<dyn Sink>,
    /// The gain of the most recently started resource. Replaced wholesale
    /// each time a new item begins.
    active: RwLock<Option<Volume>>,
    /// The initial gain for each new resource.
    default_volume: f32,
    /// The logging span.
    span: Span,
}

impl Session {
    /// Creates a new session bound to the given sink.
    pub fn new(sink: Arc<dyn Sink>, default_volume: f32) -> Session {
        Session {
            sink,
            active: RwLock::new(None),
            default_volume,
            span: span!(Level::INFO, "session"),
        }
    }

    /// Binds the PCM stream to the sink with a fresh gain at the default
    /// level and plays it to completion. Sink failures are absorbed: the
    /// item is over either way and the rotation must not stall.
    pub async fn play(&self, pcm: PcmStream) {
        let _enter = self.span.enter();

        let volume = Volume::new(self.default_volume);
        *self.active.write().expect("unable to get lock") = Some(volume.clone());

        let sink = self.sink.clone();
        let join = tokio::task::spawn_blocking(move || {
            if let Err(e) = sink.play(Resource { pcm, volume }) {
                error!(err = e.as_ref(), "Error while playing resource");
            }
        });

        if let Err(e) = join.await {
            error!(err = format!("{}", e), "Error waiting for sink playback");
        }
    }

    /// Applies a new gain to the active resource. Range validation is the
    /// caller's responsibility.
    pub fn set_volume(&self, level: f32) -> Result<(), Error> {
        match self.active.read().expect("unable to get lock").as_ref() {
            Some(volume) => {
                volume.set(level);
                Ok(())
            }
            None => Err(Error::NoActiveResource),
        }
    }

    /// The active resource's gain, if anything has played yet.
    pub fn current_volume(&self) -> Option<f32> {
        self.active
            .read()
            .expect("unable to get lock")
            .as_ref()
            .map(Volume::get)
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::pipeline::PcmStream;
    use crate::sink::mock;
    use crate::test::eventually;

    use super::{Error, Session, DEFAULT_VOLUME};

    fn stream() -> PcmStream {
        PcmStream::new(Box::new(Cursor::new(vec![0u8; 1024])))
    }

    #[test]
    fn test_set_volume_before_playback() {
        let sink = Arc::new(mock::Device::get("mock-sink"));
        let session = Session::new(sink, DEFAULT_VOLUME);

        assert!(matches!(
            session.set_volume(0.3),
            Err(Error::NoActiveResource)
        ));
        assert!(session.current_volume().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_set_volume_during_playback() {
        let sink = Arc::new(mock::Device::with_delay(
            "mock-sink",
            Duration::from_millis(200),
        ));
        let session = Arc::new(Session::new(sink.clone(), DEFAULT_VOLUME));

        let join = {
            let session = session.clone();
            tokio::spawn(async move { session.play(stream()).await })
        };

        eventually(|| sink.is_playing(), "Resource never started playing");
        assert!(session.set_volume(0.3).is_ok());
        assert_eq!(session.current_volume(), Some(0.3));

        join.await.expect("unable to join playback");

        // The sink observed the live change before the resource finished.
        let plays = sink.plays();
        assert_eq!(plays.len(), 1);
        assert_eq!(plays[0].bytes, 1024);
        assert_eq!(plays[0].volume, 0.3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_each_resource_starts_at_default_volume() {
        let sink = Arc::new(mock::Device::get("mock-sink"));
        let session = Session::new(sink.clone(), DEFAULT_VOLUME);

        session.play(stream()).await;
        session.set_volume(0.9).expect("unable to set volume");
        session.play(stream()).await;

        let plays = sink.plays();
        assert_eq!(plays.len(), 2);
        assert_eq!(plays[1].volume, DEFAULT_VOLUME);
    }
}
