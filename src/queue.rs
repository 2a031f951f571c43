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
use std::path::PathBuf;

use rand::Rng;

use crate::library::{Error, Genre};
use crate::shuffle::shuffle;

/// The shortest queue a genre cycle will play.
pub const MIN_QUEUE_LEN: usize = 10;
/// The longest queue a genre cycle will play.
pub const MAX_QUEUE_LEN: usize = 18;

/// One genre's turn in the rotation: an optional interstitial voice line
/// followed by a fixed queue of tracks. Created fresh per cycle and discarded
/// once consumed.
pub struct Cycle {
    /// The genre this cycle plays.
    pub genre: Genre,
    /// The single interstitial voice line, if the genre has any.
    pub voice_line: Option<PathBuf>,
    /// The ordered track queue.
    pub tracks: Vec<PathBuf>,
}

/// Builds a cycle for the given genre from its track and voice line listings.
/// The queue is a with-replacement sample: the listing is shuffled, a length
/// in [MIN_QUEUE_LEN, MAX_QUEUE_LEN] is drawn, and entries repeat cyclically
/// when the listing is shorter than the queue. An empty listing fails with
/// `EmptyListing`, which skips the genre.
pub fn build<R: Rng>(
    genre: Genre,
    mut tracks: Vec<PathBuf>,
    voice_lines: Vec<PathBuf>,
    rng: &mut R,
) -> Result<Cycle, Error> {
    if tracks.is_empty() {
        return Err(Error::EmptyListing { genre });
    }

    shuffle(&mut tracks, rng);
    let count = rng.gen_range(MIN_QUEUE_LEN..=MAX_QUEUE_LEN);
    let queue: Vec<PathBuf> = (0..count).map(|i| tracks[i % tracks.len()].clone()).collect();

    let voice_line = if voice_lines.is_empty() {
        None
    } else {
        Some(voice_lines[rng.gen_range(0..voice_lines.len())].clone())
    };

    Ok(Cycle {
        genre,
        voice_line,
        tracks: queue,
    })
}
