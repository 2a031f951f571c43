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
use std::sync::Mutex;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::warn;

use crate::metadata::{self, Cover};
use crate::station::StationHandle;

const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// A user-visible response to a command.
pub enum Reply {
    /// The now playing announcement. Title and artist carry the factual
    /// content separately from the templated text; the cover is there for
    /// frontends that can attach images. The keyboard frontend only shows
    /// the text.
    #[allow(dead_code)]
    NowPlaying {
        text: String,
        title: String,
        artist: String,
        cover: Option<Cover>,
    },
    /// The volume was updated.
    VolumeSet { text: String },
    /// The command was rejected or could not be served.
    Error { text: String },
}

impl Reply {
    /// The message text to show the requester.
    pub fn text(&self) -> &str {
        match self {
            Reply::NowPlaying { text, .. } => text,
            Reply::VolumeSet { text } => text,
            Reply::Error { text } => text,
        }
    }
}

/// The command interface: answers now playing queries from the current track
/// reference and forwards validated volume changes to the session. Frontends
/// (chat, keyboard) deliver events here and relay the replies.
pub struct Commands {
    station: StationHandle,
    /// The role a requester needs to adjust the volume.
    admin_role: String,
    /// Picks announcement templates.
    rng: Mutex<StdRng>,
}

impl Commands {
    /// Creates a new command interface over the given station handle.
    pub fn new(station: StationHandle, admin_role: &str) -> Commands {
        Commands {
            station,
            admin_role: admin_role.to_string(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Answers a now playing query. The template rotates per call; the
    /// factual title and artist only change when the track does. The file
    /// probe runs on a blocking thread.
    pub async fn now_playing(&self) -> Reply {
        let path = match self.station.current_track() {
            Some(path) => path,
            None => {
                return Reply::Error {
                    text: "Nothing is playing right now.".to_string(),
                }
            }
        };

        let info = {
            let probe = path.clone();
            match tokio::task::spawn_blocking(move || metadata::read(&probe)).await {
                Ok(info) => info,
                Err(e) => {
                    warn!(err = format!("{}", e), "Error waiting for metadata probe.");
                    return Reply::Error {
                        text: "Couldn't read the song metadata, sorry.".to_string(),
                    };
                }
            }
        };

        match info {
            Ok(info) => {
                let title = info
                    .title
                    .unwrap_or_else(|| metadata::display_title(&path));
                let artist = info.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
                let template = self
                    .rng
                    .lock()
                    .expect("unable to get lock")
                    .gen_range(0..TEMPLATE_COUNT);
                Reply::NowPlaying {
                    text: announcement(template, &title, &artist),
                    title,
                    artist,
                    cover: info.cover,
                }
            }
            Err(e) => {
                warn!(err = %e, "Unable to read metadata for now playing query.");
                Reply::Error {
                    text: "Couldn't read the song metadata, sorry.".to_string(),
                }
            }
        }
    }

    /// Applies a volume change. The input is the raw user-supplied level;
    /// non-numeric or out-of-range values are rejected, as are requesters
    /// without the admin role.
    pub fn set_volume(&self, input: &str, authorized: bool) -> Reply {
        if !authorized {
            return Reply::Error {
                text: format!(
                    "Only users with the {} role can adjust the volume.",
                    self.admin_role
                ),
            };
        }

        let level: f32 = match input.trim().parse() {
            Ok(level) => level,
            Err(_) => {
                return Reply::Error {
                    text: "Please provide a volume between 0.0 and 1.0, e.g. 0.3.".to_string(),
                }
            }
        };
        if !(0.0..=1.0).contains(&level) {
            return Reply::Error {
                text: "Please provide a volume between 0.0 and 1.0, e.g. 0.3.".to_string(),
            };
        }

        match self.station.session().set_volume(level) {
            Ok(()) => Reply::VolumeSet {
                text: format!("Volume updated to {}.", level),
            },
            Err(e) => Reply::Error {
                text: format!("{}.", capitalize(&e.to_string())),
            },
        }
    }
}

const TEMPLATE_COUNT: usize = 10;

/// One of the rotating announcement templates. The wording varies, the
/// factual content never does.
fn announcement(template: usize, title: &str, artist: &str) -> String {
    match template {
        0 => format!("Currently spinning: {} by {}!", title, artist),
        1 => format!("Now playing: {} by {}.", title, artist),
        2 => format!("You're listening to: {} by {}!", title, artist),
        3 => format!("This track is by {}... it's called {}!", artist, title),
        4 => format!("The station's choice: {} by {}!", title, artist),
        5 => format!("Floating to the tune of {} by {}!", title, artist),
        6 => format!("It's {} by {} playing now.", title, artist),
        7 => format!("You're vibing with {} by {}.", title, artist),
        8 => format!("Playing: {} by the lovely {}.", title, artist),
        _ => format!("Melody on deck: {} by {}.", title, artist),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;
    use std::sync::{Arc, RwLock};

    use crate::session::{Session, DEFAULT_VOLUME};
    use crate::sink::mock;
    use crate::station::StationHandle;

    use super::{announcement, Commands, Reply, TEMPLATE_COUNT};

    fn commands(current_track: Option<PathBuf>) -> (Commands, Arc<Session>) {
        let sink = Arc::new(mock::Device::get("mock-sink"));
        let session = Arc::new(Session::new(sink, DEFAULT_VOLUME));
        let handle = StationHandle::new(Arc::new(RwLock::new(current_track)), session.clone());
        (Commands::new(handle, "Directors"), session)
    }

    fn tagless_track() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("unable to create tempdir");
        let path = dir.path().join("moonlight-groove.wav");

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).expect("unable to create wav");
        for _ in 0..4800 {
            writer.write_sample(0i16).expect("unable to write sample");
        }
        writer.finalize().expect("unable to finalize wav");
        (dir, path)
    }

    #[test]
    fn test_announcements_carry_the_facts() {
        for template in 0..TEMPLATE_COUNT {
            let text = announcement(template, "Moanin'", "Art Blakey");
            assert!(text.contains("Moanin'"), "{}", text);
            assert!(text.contains("Art Blakey"), "{}", text);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_now_playing_without_a_track() {
        let (commands, _session) = commands(None);
        assert!(matches!(commands.now_playing().await, Reply::Error { .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_now_playing_is_factually_idempotent() {
        let (_dir, path) = tagless_track();
        let (commands, _session) = commands(Some(path));

        let (first_title, first_artist) = match commands.now_playing().await {
            Reply::NowPlaying { title, artist, .. } => (title, artist),
            _ => panic!("expected a now playing reply"),
        };
        // The untagged file falls back to its stem.
        assert_eq!(first_title, "moonlight-groove");

        let (second_title, second_artist) = match commands.now_playing().await {
            Reply::NowPlaying { title, artist, .. } => (title, artist),
            _ => panic!("expected a now playing reply"),
        };
        assert_eq!(first_title, second_title);
        assert_eq!(first_artist, second_artist);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_now_playing_with_unreadable_metadata() {
        let (commands, _session) = commands(Some(PathBuf::from("vanished.mp3")));
        assert!(matches!(commands.now_playing().await, Reply::Error { .. }));
    }

    #[test]
    fn test_set_volume_requires_authorization() {
        let (commands, _session) = commands(None);
        match commands.set_volume("0.3", false) {
            Reply::Error { text } => assert!(text.contains("Directors")),
            _ => panic!("expected an error reply"),
        }
    }

    #[test]
    fn test_set_volume_validates_input() {
        let (commands, _session) = commands(None);

        assert!(matches!(
            commands.set_volume("loud", true),
            Reply::Error { .. }
        ));
        assert!(matches!(
            commands.set_volume("1.5", true),
            Reply::Error { .. }
        ));
        assert!(matches!(
            commands.set_volume("-0.1", true),
            Reply::Error { .. }
        ));

        // In range but nothing playing yet.
        assert!(matches!(
            commands.set_volume("0.3", true),
            Reply::Error { .. }
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_set_volume_applies_to_active_resource() {
        use crate::pipeline::PcmStream;
        use std::io::Cursor;

        let (commands, session) = commands(None);
        session
            .play(PcmStream::new(Box::new(Cursor::new(vec![0u8; 64]))))
            .await;

        match commands.set_volume("0.3", true) {
            Reply::VolumeSet { text } => assert!(text.contains("0.3")),
            _ => panic!("expected a volume set reply"),
        }
        assert_eq!(session.current_volume(), Some(0.3));
    }
}
