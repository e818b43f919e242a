//! Distance estimators for the search algorithms.
//!
//! Three families live here:
//! - Admissible estimators over the whole board: [`manhattan`] and
//!   [`misplaced`], plus the stronger [`manhattan_with_conflicts`] which
//!   also charges for tiles blocking each other inside their goal line.
//! - Restricted estimators for staged sub-goals: [`manhattan_targets`] only
//!   counts the tiles a stage is trying to place.
//! - [`PatternDb`], a precomputed exact-distance table over a frozen subset
//!   of tiles plus the empty cell, built once per (size, prefix) by an
//!   exhaustive backward breadth-first search and falling back to the
//!   restricted Manhattan distance for keys outside the table.

use crate::engine::{PuzzleState, EMPTY_TILE};
use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

/// Marker used inside pattern-database keys for cells whose tile identity is
/// irrelevant to the sub-goal (neither a target tile nor the empty cell).
const DONT_CARE: u8 = u8::MAX;

/// Sum over all non-empty tiles of the row plus column distance to the
/// tile's goal position. Admissible and consistent for the unconstrained
/// whole-board goal.
pub fn manhattan(state: &PuzzleState) -> u32 {
    let cells = state.size() * state.size();
    manhattan_targets(state, cells - 1)
}

/// Manhattan distance restricted to the target tiles `1..=prefix`.
///
/// Admissible for the staged sub-goal "place the first `prefix` tiles":
/// every other tile is free to move without being counted.
pub fn manhattan_targets(state: &PuzzleState, prefix: usize) -> u32 {
    let size = state.size();
    let mut dist = 0u32;
    for i in 0..size * size {
        let v = state.tile_at(i);
        if v == EMPTY_TILE || v as usize > prefix {
            continue;
        }
        let goal = (v - 1) as usize;
        let dr = (i / size).abs_diff(goal / size);
        let dc = (i % size).abs_diff(goal % size);
        dist += (dr + dc) as u32;
    }
    dist
}

/// Count of non-empty tiles not on their goal position. Weaker than
/// Manhattan but cheaper; admissible.
pub fn misplaced(state: &PuzzleState) -> u32 {
    let size = state.size();
    let mut count = 0u32;
    for i in 0..size * size {
        let v = state.tile_at(i);
        if v != EMPTY_TILE && (v - 1) as usize != i {
            count += 1;
        }
    }
    count
}

/// Manhattan distance plus twice the linear-conflict count.
///
/// A tile that must leave its goal row (or column) to let another pass costs
/// at least two moves beyond its Manhattan distance. Counting the minimum
/// number of tiles that must leave each line keeps the sum admissible, and a
/// tile can never be charged in both scans: sitting in both its goal row and
/// goal column means sitting on its goal position.
pub fn manhattan_with_conflicts(state: &PuzzleState) -> u32 {
    manhattan(state) + 2 * linear_conflicts(state)
}

fn linear_conflicts(state: &PuzzleState) -> u32 {
    let size = state.size();
    let mut removed = 0u32;

    for row in 0..size {
        let mut goal_cols: Vec<usize> = Vec::with_capacity(size);
        for col in 0..size {
            let v = state.tile_at(row * size + col);
            if v != EMPTY_TILE && (v - 1) as usize / size == row {
                goal_cols.push((v - 1) as usize % size);
            }
        }
        removed += min_removals(&goal_cols);
    }

    for col in 0..size {
        let mut goal_rows: Vec<usize> = Vec::with_capacity(size);
        for row in 0..size {
            let v = state.tile_at(row * size + col);
            if v != EMPTY_TILE && (v - 1) as usize % size == col {
                goal_rows.push((v - 1) as usize / size);
            }
        }
        removed += min_removals(&goal_rows);
    }

    removed
}

/// Fewest tiles that must leave a line so the rest already sit in goal
/// order: the line length minus its longest increasing subsequence of goal
/// offsets. Offsets are distinct, so strict ordering suffices.
fn min_removals(goals: &[usize]) -> u32 {
    if goals.len() < 2 {
        return 0;
    }
    let mut best = vec![1u32; goals.len()];
    for i in 1..goals.len() {
        for j in 0..i {
            if goals[j] < goals[i] && best[j] + 1 > best[i] {
                best[i] = best[j] + 1;
            }
        }
    }
    goals.len() as u32 - best.iter().copied().max().unwrap_or(0)
}

/// Exact-distance table for a staged sub-goal.
///
/// The key is the board projected onto the sub-goal: target tiles
/// (`1..=prefix`) keep their value, the empty cell keeps its `0`, and every
/// other cell collapses to a don't-care marker. The table maps each
/// reachable projection to the minimum number of moves needed to bring all
/// target tiles home, computed by one backward breadth-first search seeded
/// from every projection in which the targets already sit on their goal
/// positions, bounded by `max_depth`.
///
/// The table is a lower-bound cache, not a requirement: lookups for keys
/// that fell outside the depth bound degrade to [`manhattan_targets`].
/// Instances are owned by the engine and built lazily once per
/// (size, prefix) pair, never stored in process-wide state.
pub struct PatternDb {
    size: usize,
    prefix: usize,
    table: HashMap<Vec<u8>, u32>,
}

impl PatternDb {
    /// Builds the table for boards of side `size` and target tiles
    /// `1..=prefix`, exploring patterns up to `max_depth` moves away from
    /// the sub-goal.
    pub fn build(size: usize, prefix: usize, max_depth: u32) -> Self {
        let started = Instant::now();
        let cells = size * size;
        let mut table: HashMap<Vec<u8>, u32> = HashMap::new();
        let mut seen: HashSet<Vec<u8>> = HashSet::new();
        let mut queue: VecDeque<(Vec<u8>, u32)> = VecDeque::new();

        // Every placement of the empty cell on a non-target position is a
        // valid sub-goal configuration (the stage does not care where the
        // empty cell ends up).
        for empty_at in prefix..cells {
            let mut pattern = vec![DONT_CARE; cells];
            for (i, slot) in pattern.iter_mut().enumerate().take(prefix) {
                *slot = (i + 1) as u8;
            }
            pattern[empty_at] = EMPTY_TILE;
            seen.insert(pattern.clone());
            queue.push_back((pattern, 0));
        }

        while let Some((pattern, depth)) = queue.pop_front() {
            table.insert(pattern.clone(), depth);
            if depth >= max_depth {
                continue;
            }
            let empty = pattern
                .iter()
                .position(|&v| v == EMPTY_TILE)
                .expect("pattern always contains the empty cell");
            let (row, col) = (empty / size, empty % size);
            for (dr, dc) in [(-1isize, 0isize), (1, 0), (0, -1), (0, 1)] {
                let (nr, nc) = (row as isize + dr, col as isize + dc);
                if nr < 0 || nr >= size as isize || nc < 0 || nc >= size as isize {
                    continue;
                }
                let swap = (nr as usize) * size + nc as usize;
                let mut next = pattern.clone();
                next.swap(empty, swap);
                if seen.insert(next.clone()) {
                    queue.push_back((next, depth + 1));
                }
            }
        }

        debug!(
            "pattern db built: size={} prefix={} entries={} depth<={} in {:?}",
            size,
            prefix,
            table.len(),
            max_depth,
            started.elapsed()
        );
        PatternDb {
            size,
            prefix,
            table,
        }
    }

    /// Number of stored projections.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Exact distance for the state's projection, if it was reached within
    /// the depth bound during the build.
    pub fn lookup(&self, state: &PuzzleState) -> Option<u32> {
        debug_assert_eq!(state.size(), self.size);
        self.table.get(&self.project(state)).copied()
    }

    /// Table distance when present, restricted Manhattan otherwise.
    pub fn heuristic(&self, state: &PuzzleState) -> u32 {
        self.lookup(state)
            .unwrap_or_else(|| manhattan_targets(state, self.prefix))
    }

    fn project(&self, state: &PuzzleState) -> Vec<u8> {
        let cells = self.size * self.size;
        let mut pattern = Vec::with_capacity(cells);
        for i in 0..cells {
            let v = state.tile_at(i);
            if v == EMPTY_TILE || v as usize <= self.prefix {
                pattern.push(v);
            } else {
                pattern.push(DONT_CARE);
            }
        }
        pattern
    }
}
