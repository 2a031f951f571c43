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

use rand::Rng;
use tracing::{info, span, Level, Span};

use crate::library::Genre;
use crate::shuffle::shuffle;

/// The genre rotation: a shuffled ordering of every configured genre plus the
/// current position. Advancing past the end reshuffles, so every genre plays
/// exactly once per full cycle before any repeats.
pub struct Rotation {
    /// The current permutation of the genre set.
    order: Vec<Genre>,
    /// The current position within the permutation. Always in bounds.
    index: usize,
    /// The logging span.
    span: Span,
}

impl Rotation {
    /// Creates a new rotation over the given genres, shuffled immediately.
    pub fn new<R: Rng>(mut genres: Vec<Genre>, rng: &mut R) -> Result<Rotation, Box<dyn Error>> {
        if genres.is_empty() {
            return Err("the rotation requires at least one genre".into());
        }
        shuffle(&mut genres, rng);
        Ok(Rotation {
            order: genres,
            index: 0,
            span: span!(Level::INFO, "rotation"),
        })
    }

    /// The genre at the current rotation position.
    pub fn current(&self) -> &Genre {
        &self.order[self.index]
    }

    /// Moves to the next rotation position. Wrapping back to the start of the
    /// order generates a fresh permutation for the next full cycle.
    pub fn advance<R: Rng>(&mut self, rng: &mut R) {
        let _enter = self.span.enter();

        self.index = (self.index + 1) % self.order.len();
        if self.index == 0 {
            shuffle(&mut self.order, rng);
            info!("Completed a full rotation, reshuffling genre order.");
        }

        info!(
            position = self.index,
            genre = self.order[self.index].as_str(),
            "Moving to next rotation position."
        );
    }

    /// The current permutation of the genre set.
    pub fn order(&self) -> &[Genre] {
        &self.order
    }
}
