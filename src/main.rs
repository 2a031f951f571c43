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
mod commands;
mod config;
mod controller;
mod library;
mod metadata;
mod pipeline;
mod queue;
mod rotation;
mod session;
mod shuffle;
mod sink;
mod station;

use clap::{crate_version, Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;

use crate::library::Library;

const SYSTEMD_SERVICE: &str = r#"
[Unit]
Description=rotation radio player

[Service]
Type=simple
Restart=on-failure
EnvironmentFile=-/etc/default/radiola
ExecStart=/usr/local/bin/radiola start "$RADIOLA_CONFIG"
ExecReload=/bin/kill -HUP $MAINPID

[Install]
WantedBy=multi-user.target
Alias=radiola.service
"#;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "An unattended rotation-radio player."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the genres in the configured library with their track and voice
    /// line counts.
    Library {
        /// The path to the station config.
        config_path: String,
    },
    /// Lists the available sink output devices.
    Devices {},
    /// Start will start the station.
    Start {
        /// The path to the station config.
        config_path: String,
    },
    /// Prints a systemd service definition to stdout.
    Systemd {},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Library { config_path } => {
            let config = config::parse_station(&PathBuf::from(config_path))?;
            let library = Library::new(&config.library(), config.extension());

            println!("Genres (count: {}):", config.genres()?.len());
            for genre in config.genres()? {
                let tracks = match library.tracks(&genre) {
                    Ok(tracks) => tracks.len().to_string(),
                    Err(e) => format!("unavailable ({})", e),
                };
                let voice_lines = library.voice_lines(&genre)?.len();
                println!("- {} (tracks: {}, voice lines: {})", genre, tracks, voice_lines);
            }
        }
        Commands::Devices {} => {
            let devices = sink::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Start { config_path } => {
            let (station, _controller) = config::init_station(&PathBuf::from(config_path))?;
            station.run().await;
        }
        Commands::Systemd {} => {
            println!("{}", SYSTEMD_SERVICE)
        }
    }

    Ok(())
}
