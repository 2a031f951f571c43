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
use std::io;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinError;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{error, info, span, Level};

use crate::commands::{Commands, Reply};

pub mod keyboard;

/// Command events delivered by a frontend. Each carries a reply channel so
/// the frontend can relay the user-visible response.
pub enum Event {
    /// Asks what is currently playing.
    NowPlaying { reply: oneshot::Sender<Reply> },

    /// Sets the playback volume. The frontend decides whether the requester
    /// holds the admin role; the raw level text is validated centrally.
    SetVolume {
        input: String,
        authorized: bool,
        reply: oneshot::Sender<Reply>,
    },
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::NowPlaying { .. } => "NowPlaying",
            Event::SetVolume { .. } => "SetVolume",
        }
    }
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Dispatches frontend command events to the command interface.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller with the given driver.
    pub fn new(commands: Commands, driver: Arc<dyn Driver>) -> Result<Controller, Box<dyn Error>> {
        Ok(Controller {
            handle: tokio::spawn(async move { Controller::trigger_events(commands, driver).await }),
        })
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    /// Serves command events from the driver until it closes.
    async fn trigger_events(commands: Commands, driver: Arc<dyn Driver>) {
        let span = span!(Level::INFO, "controller");
        let _enter = span.enter();

        let (events_tx, mut events_rx) = mpsc::channel(1);
        let join_handle = driver.monitor_events(events_tx);

        info!("Controller started.");

        loop {
            if let Some(event) = events_rx.recv().await {
                info!(event = event.name(), "Received event.");

                let delivered = match event {
                    Event::NowPlaying { reply } => reply.send(commands.now_playing().await),
                    Event::SetVolume {
                        input,
                        authorized,
                        reply,
                    } => reply.send(commands.set_volume(&input, authorized)),
                };

                if delivered.is_err() {
                    error!("Requester went away before the reply was sent.");
                }
            } else {
                info!("Controller closing.");
                if let Err(e) = join_handle.await {
                    error!("Error waiting for event monitor to stop: {}", e);
                }
                return;
            }
        }
    }
}
