//! Core state model for the sliding-tile puzzle.
//!
//! This module defines the puzzle's fundamental components:
//! - `PuzzleState`: an immutable-per-step board configuration for side
//!   lengths 3 through 5, with the empty cell cached for O(1) access.
//! - Move application: a move is identified by the tile value that slides
//!   into the empty cell, and every transition clones the parent state.
//! - Validation (`PuzzleState::from_tiles`) and the inversion-parity
//!   solvability check, both run before any search starts.
//! - Seeded scrambling for reproducible test and benchmark boards.

use crate::error::InvalidInput;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::fmt;

/// Smallest supported board side length.
pub const MIN_SIZE: usize = 3;
/// Largest supported board side length.
pub const MAX_SIZE: usize = 5;

/// The sentinel tile value for the empty cell.
pub const EMPTY_TILE: u8 = 0;

/// Row/column deltas for the four empty-cell swaps, in the fixed expansion
/// order up, down, left, right. Every algorithm generates neighbors in this
/// order so that runs are reproducible for identical inputs.
const DIRS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// A board configuration of an n-puzzle (n in 3..=5).
///
/// `tiles` is always a permutation of `0..n*n` with `0` denoting the empty
/// cell, stored row-major. `empty` always equals the index where
/// `tiles[empty] == 0`; it is derivable but cached so neighbor generation
/// does not rescan the board.
///
/// States are value objects: every legal transition produces a fresh clone
/// with exactly one swap applied, and nothing mutates a state reachable
/// from elsewhere. Equality and hashing cover the full tile sequence.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct PuzzleState {
    tiles: Vec<u8>,
    size: usize,
    empty: usize,
}

impl PuzzleState {
    /// Creates the canonical solved configuration for the given side length:
    /// tiles `1..n*n-1` in order with the empty cell last.
    ///
    /// # Panics
    /// Panics if `size` is outside `MIN_SIZE..=MAX_SIZE`; solved boards are
    /// only ever built internally for supported sizes.
    pub fn solved(size: usize) -> Self {
        assert!(
            (MIN_SIZE..=MAX_SIZE).contains(&size),
            "unsupported board size {}",
            size
        );
        let cells = size * size;
        let mut tiles: Vec<u8> = (1..cells as u8).collect();
        tiles.push(EMPTY_TILE);
        PuzzleState {
            tiles,
            size,
            empty: cells - 1,
        }
    }

    /// Validates a raw tile array and builds a state from it.
    ///
    /// This is the single entry point for externally supplied boards; the
    /// multiset check here is what guarantees `invalid_input` is reported
    /// before any search work begins rather than discovered mid-search.
    ///
    /// # Arguments
    /// * `tiles`: row-major tile values, `0` for the empty cell.
    /// * `size`: board side length, 3..=5.
    ///
    /// # Returns
    /// * `Ok(PuzzleState)` when `tiles` is exactly one of each value in
    ///   `0..size*size`.
    /// * `Err(InvalidInput)` describing the first violation found.
    pub fn from_tiles(tiles: Vec<u8>, size: usize) -> Result<Self, InvalidInput> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
            return Err(InvalidInput::UnsupportedSize(size));
        }
        let cells = size * size;
        if tiles.len() != cells {
            return Err(InvalidInput::WrongTileCount {
                expected: cells,
                found: tiles.len(),
            });
        }
        let mut seen = vec![false; cells];
        for &tile in &tiles {
            let v = tile as usize;
            if v >= cells || seen[v] {
                return Err(InvalidInput::NotAPermutation(cells));
            }
            seen[v] = true;
        }
        let empty = tiles
            .iter()
            .position(|&t| t == EMPTY_TILE)
            .expect("validated permutation contains the empty tile");
        Ok(PuzzleState { tiles, size, empty })
    }

    /// Returns the row-major tile sequence. This doubles as the canonical
    /// identity key: it is a bijection with the state and is what all
    /// visited sets and tables hash on.
    pub fn key(&self) -> &[u8] {
        &self.tiles
    }

    /// Returns the board side length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the index of the empty cell.
    pub fn empty(&self) -> usize {
        self.empty
    }

    /// Returns the tile value at a board index.
    pub fn tile_at(&self, index: usize) -> u8 {
        self.tiles[index]
    }

    /// Whether the state equals the canonical solved configuration.
    pub fn is_solved(&self) -> bool {
        let cells = self.size * self.size;
        for i in 0..cells - 1 {
            if self.tiles[i] != (i + 1) as u8 {
                return false;
            }
        }
        self.tiles[cells - 1] == EMPTY_TILE
    }

    /// Whether the first `prefix` goal positions all hold their goal tiles.
    /// This is the goal test for one locking stage of the stage controller.
    pub fn prefix_placed(&self, prefix: usize) -> bool {
        (0..prefix).all(|i| self.tiles[i] == (i + 1) as u8)
    }

    /// Generates the up-to-4 successor states in the fixed order up, down,
    /// left, right. Each entry pairs the new state with the tile value that
    /// slid into the empty cell.
    pub fn neighbors(&self) -> Vec<(PuzzleState, u8)> {
        self.neighbors_masked(None)
    }

    /// Like [`neighbors`](Self::neighbors), but never swaps the empty cell
    /// with a locked board position, so locked tiles stay fixed for the
    /// whole sub-search.
    pub fn neighbors_masked(&self, locked: Option<&HashSet<usize>>) -> Vec<(PuzzleState, u8)> {
        let mut out = Vec::with_capacity(4);
        let size = self.size as isize;
        let (row, col) = (self.empty as isize / size, self.empty as isize % size);
        for (dr, dc) in DIRS {
            let (nr, nc) = (row + dr, col + dc);
            if nr < 0 || nr >= size || nc < 0 || nc >= size {
                continue;
            }
            let swap_index = (nr * size + nc) as usize;
            if locked.is_some_and(|l| l.contains(&swap_index)) {
                continue;
            }
            let mut next = self.clone();
            next.tiles.swap(self.empty, swap_index);
            next.empty = swap_index;
            out.push((next, self.tiles[swap_index]));
        }
        out
    }

    /// Applies one move identified by tile value, the rule the UI collaborator
    /// uses to replay a returned move list: find the cell holding `tile`,
    /// and if it is adjacent to the empty cell, swap it in.
    ///
    /// # Returns
    /// `true` if the move was legal and applied, `false` otherwise (tile not
    /// on the board, or not adjacent to the empty cell).
    pub fn apply_move_value(&mut self, tile: u8) -> bool {
        if tile == EMPTY_TILE {
            return false;
        }
        let Some(from) = self.tiles.iter().position(|&t| t == tile) else {
            return false;
        };
        let size = self.size;
        let (fr, fc) = (from / size, from % size);
        let (er, ec) = (self.empty / size, self.empty % size);
        let adjacent = fr.abs_diff(er) + fc.abs_diff(ec) == 1;
        if !adjacent {
            return false;
        }
        self.tiles.swap(self.empty, from);
        self.empty = from;
        true
    }

    /// Produces a scrambled state by walking `steps` random legal moves from
    /// `self`, never immediately undoing the previous move. Seeded, so the
    /// same seed always yields the same scramble; scrambles produced this
    /// way are always solvable when the starting state is.
    pub fn scramble(&self, steps: usize, seed: u64) -> PuzzleState {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut current = self.clone();
        let mut prev_empty: Option<usize> = None;
        for _ in 0..steps {
            let options: Vec<(PuzzleState, u8)> = current
                .neighbors()
                .into_iter()
                .filter(|(next, _)| Some(next.empty) != prev_empty)
                .collect();
            if options.is_empty() {
                break;
            }
            let pick = rng.gen_range(0..options.len());
            prev_empty = Some(current.empty);
            current = options[pick].0.clone();
        }
        current
    }

    /// Inversion-parity solvability test under the standard sliding-puzzle
    /// reachability rule.
    ///
    /// Odd side lengths: solvable iff the inversion count is even. Even side
    /// lengths: solvable iff the inversion count plus the empty cell's row
    /// index (from the top) is odd.
    pub fn is_solvable(&self) -> bool {
        let inversions = self.count_inversions();
        if self.size % 2 == 1 {
            inversions % 2 == 0
        } else {
            let empty_row = self.empty / self.size;
            (inversions + empty_row) % 2 == 1
        }
    }

    fn count_inversions(&self) -> usize {
        self.tiles
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != EMPTY_TILE)
            .map(|(i, &v)| {
                self.tiles[i + 1..]
                    .iter()
                    .filter(|&&next| next != EMPTY_TILE && next < v)
                    .count()
            })
            .sum()
    }
}

impl fmt::Display for PuzzleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size {
            for col in 0..self.size {
                let v = self.tiles[row * self.size + col];
                if v == EMPTY_TILE {
                    write!(f, " _ ")?;
                } else {
                    write!(f, "{:2} ", v)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
