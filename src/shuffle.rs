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
use rand::Rng;

/// Shuffles the given slice in place with a Fisher-Yates walk from the last
/// index down to 1, swapping each position with a uniformly chosen
/// earlier-or-equal position. The slice is returned for chaining. Empty and
/// single element slices are no-ops.
pub fn shuffle<'a, T, R: Rng>(items: &'a mut [T], rng: &mut R) -> &'a mut [T] {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
    items
}
