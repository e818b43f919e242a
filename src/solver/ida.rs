//! Iterative-deepening A*.
//!
//! The workhorse strategy: optimal like A* but with memory linear in the
//! solution depth, which is what makes the staged 4x4/5x5 sub-searches
//! affordable. Each pass runs a depth-first search bounded by an f-score
//! threshold; a failed pass raises the threshold to the smallest f-score
//! that exceeded it and retries.

use super::support::SymmetryTable;
use super::{within, Search};
use crate::engine::PuzzleState;
use crate::error::SearchError;

enum Outcome {
    Found,
    /// Smallest f-score seen beyond the threshold, `None` when the whole
    /// subtree was exhausted without overshooting.
    Next(Option<u32>),
}

/// Iterative-deepening A* from `start` to the goal described by `search`.
///
/// Returns the move list of an optimal path under an admissible heuristic.
/// The threshold never exceeds `limits.depth_cap` when one is set; a pass
/// that would need a larger threshold fails with [`SearchError::Exhausted`].
pub fn ida_star(search: &Search<'_>, start: &PuzzleState) -> Result<Vec<u8>, SearchError> {
    if search.is_goal(start) {
        return Ok(Vec::new());
    }
    let mut meter = search.meter();
    let mut symmetry = search.symmetry.then(|| SymmetryTable::new(start.size()));
    let mut threshold = search.h(start);
    loop {
        if !within(threshold, search.limits.depth_cap) {
            return Err(SearchError::Exhausted);
        }
        if let Some(table) = symmetry.as_mut() {
            table.clear();
        }
        let mut path = Vec::new();
        match dfs(
            search,
            start,
            0,
            threshold,
            None,
            &mut path,
            symmetry.as_mut(),
            &mut meter,
        )? {
            Outcome::Found => {
                log::debug!(
                    "ida_star found length-{} path after {} nodes",
                    path.len(),
                    meter.nodes()
                );
                return Ok(path);
            }
            Outcome::Next(Some(next)) => threshold = next,
            Outcome::Next(None) => return Err(SearchError::Exhausted),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn dfs(
    search: &Search<'_>,
    state: &PuzzleState,
    g: u32,
    threshold: u32,
    prev: Option<u8>,
    path: &mut Vec<u8>,
    mut symmetry: Option<&mut SymmetryTable>,
    meter: &mut super::Meter,
) -> Result<Outcome, SearchError> {
    meter.tick()?;
    let f = g + search.h(state);
    if f > threshold {
        return Ok(Outcome::Next(Some(f)));
    }
    if search.is_goal(state) {
        return Ok(Outcome::Found);
    }
    if let Some(table) = symmetry.as_mut() {
        if table.seen_symmetric(state) {
            return Ok(Outcome::Next(None));
        }
        table.insert(state);
    }
    let mut next = None;
    for (child, tile) in search.successors(state) {
        // Moving the same tile twice in a row undoes the previous move.
        if prev == Some(tile) {
            continue;
        }
        path.push(tile);
        match dfs(
            search,
            &child,
            g + 1,
            threshold,
            Some(tile),
            path,
            symmetry.as_deref_mut(),
            meter,
        )? {
            Outcome::Found => return Ok(Outcome::Found),
            Outcome::Next(overshoot) => next = super::min_opt(next, overshoot),
        }
        path.pop();
    }
    Ok(Outcome::Next(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::manhattan;
    use crate::solver::{GoalFn, HeuristicFn, Limits};

    fn solved_goal() -> &'static GoalFn {
        &|s: &PuzzleState| s.is_solved()
    }

    #[test]
    fn test_ida_star_finds_optimal_length() {
        // One move away: optimal length is exactly 1.
        let mut start = PuzzleState::solved(3);
        assert!(start.apply_move_value(8));
        let h: &HeuristicFn = &manhattan;
        let search = Search::new(h, solved_goal());
        let moves = ida_star(&search, &start).unwrap();
        assert_eq!(moves, vec![8]);
    }

    #[test]
    fn test_ida_star_matches_bfs_length() {
        let start = PuzzleState::solved(3).scramble(12, 29);
        let h: &HeuristicFn = &manhattan;
        let search = Search::new(h, solved_goal());
        let optimal = ida_star(&search, &start).unwrap();
        let wide = crate::solver::blind::bfs(&search, &start).unwrap();
        assert_eq!(optimal.len(), wide.len());
    }

    #[test]
    fn test_ida_star_respects_depth_cap() {
        let start = PuzzleState::solved(3).scramble(20, 7);
        let h: &HeuristicFn = &manhattan;
        let mut search = Search::new(h, solved_goal());
        search.limits = Limits {
            depth_cap: Some(1),
            ..Limits::default()
        };
        if !start.is_solved() && manhattan(&start) > 1 {
            assert_eq!(ida_star(&search, &start).unwrap_err(), SearchError::Exhausted);
        }
    }

    #[test]
    fn test_ida_star_with_symmetry_returns_valid_path_when_found() {
        // Symmetry pruning trades completeness for speed, so a miss is
        // acceptable; a hit must still be a legal solving path.
        let start = PuzzleState::solved(3).scramble(10, 3);
        let h: &HeuristicFn = &manhattan;
        let mut search = Search::new(h, solved_goal());
        search.symmetry = true;
        match ida_star(&search, &start) {
            Ok(moves) => {
                let mut replay = start.clone();
                for &tile in &moves {
                    assert!(replay.apply_move_value(tile));
                }
                assert!(replay.is_solved());
            }
            Err(e) => assert_eq!(e, SearchError::Exhausted),
        }
    }

    #[test]
    fn test_ida_star_node_cap() {
        let start = PuzzleState::solved(3).scramble(40, 99);
        let h: &HeuristicFn = &manhattan;
        let mut search = Search::new(h, solved_goal());
        search.limits.node_cap = Some(1);
        if !start.is_solved() {
            assert_eq!(
                ida_star(&search, &start).unwrap_err(),
                SearchError::NodeCapExceeded
            );
        }
    }
}
