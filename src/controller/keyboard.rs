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
use std::io;

use tokio::sync::oneshot;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use super::Event;

const SONG: &str = "song";
const VOLUME: &str = "volume";

/// A frontend that serves the command interface from stdin. The local
/// operator is implicitly authorized for volume changes; chat frontends
/// check the admin role themselves.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<(), io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(writer, "Command ({}, {} <level>): ", SONG, VOLUME)?;
        writer.flush()?;
        let mut input: String = String::default();
        reader.read_line(&mut input)?;

        let input = input.trim();
        let (reply_tx, reply_rx) = oneshot::channel();
        let event = if input == SONG {
            Event::NowPlaying { reply: reply_tx }
        } else if let Some(level) = input.strip_prefix(VOLUME) {
            Event::SetVolume {
                input: level.trim().to_string(),
                authorized: true,
                reply: reply_tx,
            }
        } else {
            warn!(input = input, "Unrecognized input");
            return Ok(());
        };

        events_tx
            .blocking_send(event)
            .map_err(|e| io::Error::other(e.to_string()))?;
        match reply_rx.blocking_recv() {
            Ok(reply) => writeln!(writer, "{}", reply.text())?,
            Err(e) => warn!(err = format!("{}", e), "No reply received"),
        }
        Ok(())
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            loop {
                Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())?;
            }
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, BufReader};

    use tokio::sync::mpsc;

    use crate::commands::Reply;
    use crate::controller::Event;

    use super::Driver;

    /// What monitor_io sent, with the reply channel already answered so the
    /// blocking receive completes.
    #[derive(Debug, PartialEq, Eq)]
    enum Seen {
        Nothing,
        NowPlaying,
        SetVolume { input: String, authorized: bool },
    }

    fn get_event(line: &str) -> Result<(Seen, String), io::Error> {
        let (sender, mut receiver) = mpsc::channel::<Event>(1);

        // Answer the reply channel from another thread so monitor_io's
        // blocking receive completes.
        let answer = std::thread::spawn(move || match receiver.blocking_recv() {
            None => Seen::Nothing,
            Some(Event::NowPlaying { reply }) => {
                let _ = reply.send(Reply::Error {
                    text: "test reply".to_string(),
                });
                Seen::NowPlaying
            }
            Some(Event::SetVolume {
                input,
                authorized,
                reply,
            }) => {
                let _ = reply.send(Reply::Error {
                    text: "test reply".to_string(),
                });
                Seen::SetVolume { input, authorized }
            }
        });

        let reader = BufReader::new(line.as_bytes());
        let mut written: Vec<u8> = Vec::new();
        Driver::monitor_io(&sender, reader, &mut written)?;
        drop(sender);

        let seen = answer.join().expect("unable to join answer thread");
        Ok((seen, String::from_utf8_lossy(&written).to_string()))
    }

    #[test]
    fn test_keyboard_events() -> Result<(), io::Error> {
        let (seen, written) = get_event("song\n")?;
        assert_eq!(seen, Seen::NowPlaying);
        assert!(written.contains("test reply"));

        let (seen, _) = get_event("volume 0.3\n")?;
        assert_eq!(
            seen,
            Seen::SetVolume {
                input: "0.3".to_string(),
                authorized: true,
            }
        );

        let (seen, written) = get_event("unrecognized\n")?;
        assert_eq!(seen, Seen::Nothing);
        assert!(!written.contains("test reply"));
        Ok(())
    }
}
