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
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
    time::Duration,
};

use rand::rngs::StdRng;
use tracing::{error, info, span, warn, Level, Span};

use crate::library::{Genre, Library};
use crate::pipeline::Pipeline;
use crate::queue::{self, Cycle};
use crate::rotation::Rotation;
use crate::session::Session;

/// The position of the state machine within one genre cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Playing the interstitial voice line before the queue.
    VoiceLine,
    /// Playing the queue entry at the given cursor.
    Track(usize),
    /// The cycle is over; the rotation advances.
    Exhausted,
}

impl Phase {
    /// The phase a fresh cycle starts in.
    fn first(cycle: &Cycle) -> Phase {
        if cycle.voice_line.is_some() {
            Phase::VoiceLine
        } else {
            Phase::Track(0)
        }
    }

    /// The phase following this one. The voice line plays at most once per
    /// cycle, the cursor walks the queue, and the final track exhausts the
    /// cycle.
    fn next(&self, cycle: &Cycle) -> Phase {
        match self {
            Phase::VoiceLine => Phase::Track(0),
            Phase::Track(cursor) => {
                if cursor + 1 < cycle.tracks.len() {
                    Phase::Track(cursor + 1)
                } else {
                    Phase::Exhausted
                }
            }
            Phase::Exhausted => Phase::Exhausted,
        }
    }
}

/// Read access to the pieces of station state the command interface needs:
/// the current track reference and the playback session.
#[derive(Clone)]
pub struct StationHandle {
    current_track: Arc<RwLock<Option<PathBuf>>>,
    session: Arc<Session>,
}

impl StationHandle {
    pub(crate) fn new(
        current_track: Arc<RwLock<Option<PathBuf>>>,
        session: Arc<Session>,
    ) -> StationHandle {
        StationHandle {
            current_track,
            session,
        }
    }

    /// The path of the most recently started track. Voice lines never appear
    /// here.
    pub fn current_track(&self) -> Option<PathBuf> {
        self.current_track
            .read()
            .expect("unable to get lock")
            .clone()
    }

    /// The playback session, for volume control.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

/// The station runs the rotation loop: pick a genre, build its cycle, play
/// the voice line and queue through the pipeline and session, advance,
/// forever. All playback failures are absorbed so the rotation never stalls.
pub struct Station {
    /// The on-disk audio library.
    library: Library,
    /// The genre rotation.
    rotation: Rotation,
    /// The single random source driving shuffles, queue lengths and voice
    /// line selection.
    rng: StdRng,
    /// The decode/fade/transcode stage.
    pipeline: Arc<dyn Pipeline>,
    /// The playback session bound to the sink.
    session: Arc<Session>,
    /// The most recently started track, for metadata queries.
    current_track: Arc<RwLock<Option<PathBuf>>>,
    /// Fade applied to voice lines (they are short).
    voice_line_fade: Duration,
    /// Fade applied to tracks, for smoother transitions between songs.
    track_fade: Duration,
    /// The logging span.
    span: Span,
}

impl Station {
    /// Creates a new station. The rotation starts from a fresh shuffle of the
    /// given genres.
    pub fn new(
        library: Library,
        genres: Vec<Genre>,
        pipeline: Arc<dyn Pipeline>,
        session: Arc<Session>,
        voice_line_fade: Duration,
        track_fade: Duration,
        mut rng: StdRng,
    ) -> Result<Station, Box<dyn Error>> {
        let rotation = Rotation::new(genres, &mut rng)?;
        Ok(Station {
            library,
            rotation,
            rng,
            pipeline,
            session,
            current_track: Arc::new(RwLock::new(None)),
            voice_line_fade,
            track_fade,
            span: span!(Level::INFO, "station"),
        })
    }

    /// A handle for the command interface.
    pub fn handle(&self) -> StationHandle {
        StationHandle::new(self.current_track.clone(), self.session.clone())
    }

    /// Runs the rotation loop. Never returns.
    pub async fn run(mut self) {
        info!(genre = self.rotation.current().as_str(), "Station started.");
        loop {
            self.play_cycle().await;
        }
    }

    /// Plays one rotation step: a full genre cycle, or a skip when the genre
    /// has nothing to play. The rotation has advanced by exactly one position
    /// when this returns.
    pub(crate) async fn play_cycle(&mut self) {
        let cycle = match self.begin_cycle() {
            Ok(cycle) => cycle,
            Err(e) => {
                warn!(err = %e, "Skipping genre.");
                self.rotation.advance(&mut self.rng);
                return;
            }
        };

        info!(
            genre = cycle.genre.as_str(),
            tracks = cycle.tracks.len(),
            voice_line = cycle.voice_line.is_some(),
            "Starting genre cycle."
        );

        let mut phase = Phase::first(&cycle);
        loop {
            match &phase {
                Phase::VoiceLine => {
                    let path = cycle
                        .voice_line
                        .as_ref()
                        .expect("voice line phase requires a voice line");
                    self.play_item(path, self.voice_line_fade).await;
                }
                Phase::Track(cursor) => {
                    let path = &cycle.tracks[*cursor];
                    // The current track reference moves before playback so
                    // metadata queries see the new track immediately.
                    *self.current_track.write().expect("unable to get lock") = Some(path.clone());
                    self.play_item(path, self.track_fade).await;
                }
                Phase::Exhausted => break,
            }
            phase = phase.next(&cycle);
        }

        self.rotation.advance(&mut self.rng);
    }

    /// Lists the current genre and builds its cycle.
    fn begin_cycle(&mut self) -> Result<Cycle, crate::library::Error> {
        let genre = self.rotation.current().clone();
        let tracks = self.library.tracks(&genre)?;
        let voice_lines = self.library.voice_lines(&genre)?;
        queue::build(genre, tracks, voice_lines, &mut self.rng)
    }

    /// Plays a single item to completion. Pipeline failures mean the item
    /// never starts and count as instantly finished.
    async fn play_item(&self, path: &Path, fade: Duration) {
        let _enter = self.span.enter();

        let stream = {
            let pipeline = self.pipeline.clone();
            let item = path.to_path_buf();
            match tokio::task::spawn_blocking(move || pipeline.open(&item, fade)).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    warn!(err = %e, path = %path.display(), "Skipping item.");
                    return;
                }
                Err(e) => {
                    error!(err = format!("{}", e), "Error waiting for pipeline.");
                    return;
                }
            }
        };

        info!(
            path = %path.display(),
            fade = format!("{:?}", fade),
            "Playing item."
        );
        self.session.play(stream).await;
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;
    use std::fs::{self, File};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    use crate::library::{Genre, Library};
    use crate::pipeline::mock as mock_pipeline;
    use crate::queue::{Cycle, MAX_QUEUE_LEN, MIN_QUEUE_LEN};
    use crate::session::{Session, DEFAULT_VOLUME};
    use crate::sink::mock as mock_sink;

    use super::{Phase, Station};

    const VOICE_FADE: Duration = Duration::from_secs(1);
    const TRACK_FADE: Duration = Duration::from_secs(6);

    struct Fixture {
        root: TempDir,
        pipeline: Arc<mock_pipeline::Pipeline>,
        sink: Arc<mock_sink::Device>,
    }

    impl Fixture {
        fn new() -> Fixture {
            Fixture {
                root: tempfile::tempdir().expect("unable to create tempdir"),
                pipeline: Arc::new(mock_pipeline::Pipeline::get("mock-pipeline")),
                sink: Arc::new(mock_sink::Device::get("mock-sink")),
            }
        }

        fn add_genre(&self, genre: &str, tracks: &[&str], voice_lines: &[&str]) {
            let music = self.root.path().join("music").join(genre);
            fs::create_dir_all(&music).expect("unable to create music dir");
            for track in tracks {
                File::create(music.join(track)).expect("unable to create track");
            }

            if !voice_lines.is_empty() {
                let voice = self.root.path().join("voice").join(genre);
                fs::create_dir_all(&voice).expect("unable to create voice dir");
                for line in voice_lines {
                    File::create(voice.join(line)).expect("unable to create voice line");
                }
            }
        }

        fn station(&self, genres: &[&str], seed: u64) -> Station {
            let library = Library::new(self.root.path(), "mp3");
            let session = Arc::new(Session::new(self.sink.clone(), DEFAULT_VOLUME));
            Station::new(
                library,
                genres.iter().map(|name| Genre::new(name)).collect(),
                self.pipeline.clone(),
                session,
                VOICE_FADE,
                TRACK_FADE,
                StdRng::seed_from_u64(seed),
            )
            .expect("unable to create station")
        }
    }

    fn cycle(voice_line: bool, tracks: usize) -> Cycle {
        Cycle {
            genre: Genre::new("jazz"),
            voice_line: voice_line.then(|| PathBuf::from("intro.mp3")),
            tracks: (0..tracks).map(|i| PathBuf::from(format!("{}.mp3", i))).collect(),
        }
    }

    #[test]
    fn test_phase_transitions() {
        let with_voice = cycle(true, 2);
        assert_eq!(Phase::first(&with_voice), Phase::VoiceLine);
        assert_eq!(Phase::VoiceLine.next(&with_voice), Phase::Track(0));
        assert_eq!(Phase::Track(0).next(&with_voice), Phase::Track(1));
        assert_eq!(Phase::Track(1).next(&with_voice), Phase::Exhausted);
        assert_eq!(Phase::Exhausted.next(&with_voice), Phase::Exhausted);

        let without_voice = cycle(false, 1);
        assert_eq!(Phase::first(&without_voice), Phase::Track(0));
        assert_eq!(Phase::Track(0).next(&without_voice), Phase::Exhausted);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cycle_plays_voice_line_then_queue() {
        let fixture = Fixture::new();
        fixture.add_genre(
            "jazz",
            &["t0.mp3", "t1.mp3", "t2.mp3"],
            &["v0.mp3", "v1.mp3"],
        );

        let mut station = fixture.station(&["jazz"], 23);
        let handle = station.handle();
        station.play_cycle().await;

        let opens = fixture.pipeline.opens();
        assert!(opens.len() >= MIN_QUEUE_LEN + 1);
        assert!(opens.len() <= MAX_QUEUE_LEN + 1);

        // Exactly one voice line plays first, with the short fade.
        let voice_dir = fixture.root.path().join("voice").join("jazz");
        assert!(opens[0].path.starts_with(&voice_dir));
        assert_eq!(opens[0].fade, VOICE_FADE);
        assert_eq!(
            opens.iter().filter(|o| o.path.starts_with(&voice_dir)).count(),
            1
        );

        // Then the queue, cycling through all three tracks with the long
        // fade and a repetition period of the listing length.
        let tracks = &opens[1..];
        for open in tracks {
            assert_eq!(open.fade, TRACK_FADE);
        }
        for (i, open) in tracks.iter().enumerate() {
            assert_eq!(open.path, tracks[i % 3].path);
        }
        let distinct: HashSet<&Path> = tracks.iter().map(|o| o.path.as_path()).collect();
        assert_eq!(distinct.len(), 3);

        // Every item reached the sink, and the current track reference holds
        // the last track, not a voice line.
        assert_eq!(fixture.sink.plays().len(), opens.len());
        assert_eq!(
            handle.current_track().expect("expected a current track"),
            tracks[tracks.len() - 1].path
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_genre_skips_to_next() {
        let fixture = Fixture::new();
        fixture.add_genre("bossa", &[], &[]);
        fixture.add_genre("jazz", &["t0.mp3"], &[]);

        let mut station = fixture.station(&["bossa", "jazz"], 1);
        let handle = station.handle();

        // Two rotation steps cover both genres regardless of shuffle order:
        // the empty one is skipped without playing anything, the other plays
        // its queue.
        station.play_cycle().await;
        station.play_cycle().await;

        let opens = fixture.pipeline.opens();
        assert!(!opens.is_empty());
        let jazz_dir = fixture.root.path().join("music").join("jazz");
        for open in opens.iter() {
            assert!(open.path.starts_with(&jazz_dir));
        }
        assert!(handle
            .current_track()
            .expect("expected a current track")
            .starts_with(&jazz_dir));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_genre_directory_skips_to_next() {
        let fixture = Fixture::new();
        fixture.add_genre("jazz", &["t0.mp3"], &[]);

        // "city" has no directory at all.
        let mut station = fixture.station(&["city", "jazz"], 2);
        station.play_cycle().await;
        station.play_cycle().await;

        let jazz_dir = fixture.root.path().join("music").join("jazz");
        let opens = fixture.pipeline.opens();
        assert!(!opens.is_empty());
        for open in opens.iter() {
            assert!(open.path.starts_with(&jazz_dir));
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_vanished_track_is_skipped_without_stalling() {
        let fixture = Fixture::new();
        fixture.add_genre("jazz", &["t0.mp3", "t1.mp3"], &[]);

        let mut station = fixture.station(&["jazz"], 9);

        // One of the queued files "vanishes" before playback.
        let gone = fixture.root.path().join("music").join("jazz").join("t1.mp3");
        fixture.pipeline.fail_path(&gone);

        station.play_cycle().await;

        // The failing item never reached the pipeline or the sink, but the
        // cycle completed: the surviving track accounts for half the queue.
        let opens = fixture.pipeline.opens();
        assert!(!opens.is_empty());
        for open in opens.iter() {
            assert_ne!(open.path, gone);
        }
        assert_eq!(fixture.sink.plays().len(), opens.len());
    }
}
