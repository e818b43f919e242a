//! Branch-and-bound strategies.
//!
//! Both keep an incumbent best solution and prune any node whose optimistic
//! cost `g + h` cannot beat it, so with an admissible heuristic the
//! incumbent at completion is optimal. A per-state best-g table stops
//! re-exploration of states already reached at least as cheaply.

use super::Search;
use crate::engine::PuzzleState;
use crate::error::SearchError;
use std::collections::{HashMap, VecDeque};

/// Depth-first branch and bound. Optimal at completion; interim incumbents
/// make it useful even when a cap cuts it short of proving optimality
/// (the incumbent is still returned then only if search completed, so a cap
/// hit reports the cap error instead of an unproven path).
pub fn dfbnb(search: &Search<'_>, start: &PuzzleState) -> Result<Vec<u8>, SearchError> {
    if search.is_goal(start) {
        return Ok(Vec::new());
    }
    let mut meter = search.meter();
    let mut best: Option<Vec<u8>> = None;
    // Paths must stay strictly below the ceiling-plus-one upper bound.
    let mut upper = search.depth_ceiling(start) + 1;
    let mut best_g: HashMap<Vec<u8>, u32> = HashMap::new();
    let mut path = Vec::new();
    descend(
        search, start, 0, None, &mut path, &mut best, &mut upper, &mut best_g, &mut meter,
    )?;
    best.ok_or(SearchError::Exhausted)
}

#[allow(clippy::too_many_arguments)]
fn descend(
    search: &Search<'_>,
    state: &PuzzleState,
    g: u32,
    prev: Option<u8>,
    path: &mut Vec<u8>,
    best: &mut Option<Vec<u8>>,
    upper: &mut u32,
    best_g: &mut HashMap<Vec<u8>, u32>,
    meter: &mut super::Meter,
) -> Result<(), SearchError> {
    meter.tick()?;
    if g + search.h(state) >= *upper {
        return Ok(());
    }
    if best_g.get(state.key()).is_some_and(|&known| known <= g) {
        return Ok(());
    }
    best_g.insert(state.key().to_vec(), g);
    // Descend into promising children first so a strong incumbent shrinks
    // the bound early.
    let mut children = search.successors(state);
    children.sort_by_key(|(child, _)| search.h(child));
    for (child, tile) in children {
        if prev == Some(tile) {
            continue;
        }
        path.push(tile);
        if search.is_goal(&child) {
            if g + 1 < *upper {
                *upper = g + 1;
                *best = Some(path.clone());
                log::debug!("dfbnb incumbent improved to length {}", g + 1);
            }
        } else {
            descend(search, &child, g + 1, Some(tile), path, best, upper, best_g, meter)?;
        }
        path.pop();
    }
    Ok(())
}

/// Breadth-first branch and bound: FIFO expansion with the same incumbent
/// pruning. Optimal at completion.
pub fn bfbnb(search: &Search<'_>, start: &PuzzleState) -> Result<Vec<u8>, SearchError> {
    if search.is_goal(start) {
        return Ok(Vec::new());
    }
    let mut meter = search.meter();
    let mut best: Option<Vec<u8>> = None;
    let mut upper = search.depth_ceiling(start) + 1;
    let mut best_g: HashMap<Vec<u8>, u32> = HashMap::new();
    best_g.insert(start.key().to_vec(), 0);
    let mut queue: VecDeque<(PuzzleState, Vec<u8>)> = VecDeque::new();
    queue.push_back((start.clone(), Vec::new()));
    while let Some((state, moves)) = queue.pop_front() {
        meter.tick()?;
        let g = moves.len() as u32;
        if g + search.h(&state) >= upper {
            continue;
        }
        for (child, tile) in search.successors(&state) {
            let child_g = g + 1;
            if child_g + search.h(&child) >= upper {
                continue;
            }
            if best_g.get(child.key()).is_some_and(|&known| known <= child_g) {
                continue;
            }
            best_g.insert(child.key().to_vec(), child_g);
            let mut child_moves = moves.clone();
            child_moves.push(tile);
            if search.is_goal(&child) {
                upper = child_g;
                best = Some(child_moves);
                log::debug!("bfbnb incumbent improved to length {}", child_g);
            } else {
                queue.push_back((child, child_moves));
            }
        }
    }
    best.ok_or(SearchError::Exhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::manhattan;
    use crate::solver::{GoalFn, HeuristicFn};

    fn solved_goal() -> &'static GoalFn {
        &|s: &PuzzleState| s.is_solved()
    }

    fn replay_solves(start: &PuzzleState, moves: &[u8]) -> bool {
        let mut state = start.clone();
        moves.iter().all(|&tile| state.apply_move_value(tile)) && state.is_solved()
    }

    #[test]
    fn test_dfbnb_is_optimal_at_completion() {
        let start = PuzzleState::solved(3).scramble(10, 23);
        let h: &HeuristicFn = &manhattan;
        let search = Search::new(h, solved_goal());
        let bounded = dfbnb(&search, &start).unwrap();
        let wide = crate::solver::blind::bfs(&search, &start).unwrap();
        assert_eq!(bounded.len(), wide.len());
        assert!(replay_solves(&start, &bounded));
    }

    #[test]
    fn test_bfbnb_matches_dfbnb_length() {
        let start = PuzzleState::solved(3).scramble(10, 37);
        let h: &HeuristicFn = &manhattan;
        let search = Search::new(h, solved_goal());
        let depth_first = dfbnb(&search, &start).unwrap();
        let breadth_first = bfbnb(&search, &start).unwrap();
        assert_eq!(depth_first.len(), breadth_first.len());
        assert!(replay_solves(&start, &breadth_first));
    }
}
