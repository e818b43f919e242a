//! Best-first strategies: A*, Dijkstra, greedy, memory-bounded A* and
//! recursive best-first search.
//!
//! A*, Dijkstra and greedy share one core loop and differ only in how a
//! frontier entry is scored. The goal test happens at pop, not at push, so
//! A* and Dijkstra stay optimal. Ties break by insertion order through
//! [`OpenEntry`], keeping every run deterministic.

use super::support::{BoundedLru, OpenEntry};
use super::{min_opt, within, Meter, Search};
use crate::engine::PuzzleState;
use crate::error::SearchError;
use std::collections::{BinaryHeap, HashMap};

/// Frontier scoring policy for the shared best-first loop.
#[derive(Clone, Copy)]
enum Rank {
    /// `f = g + h`: optimal under an admissible heuristic.
    AStar,
    /// `f = g`: uniform-cost, ignores the heuristic entirely.
    UniformCost,
    /// `f = h`: fast and inadmissible, no length guarantee.
    HeuristicOnly,
}

impl Rank {
    fn score(self, search: &Search<'_>, state: &PuzzleState, g: u32) -> u32 {
        match self {
            Rank::AStar => g + search.h(state),
            Rank::UniformCost => g,
            Rank::HeuristicOnly => search.h(state),
        }
    }
}

/// A* search; optimal when the heuristic is admissible.
pub fn a_star(search: &Search<'_>, start: &PuzzleState) -> Result<Vec<u8>, SearchError> {
    best_first(search, start, Rank::AStar)
}

/// Dijkstra / uniform-cost search; optimal, heuristic-free.
pub fn dijkstra(search: &Search<'_>, start: &PuzzleState) -> Result<Vec<u8>, SearchError> {
    best_first(search, start, Rank::UniformCost)
}

/// Greedy best-first search; orders purely by the heuristic.
pub fn greedy(search: &Search<'_>, start: &PuzzleState) -> Result<Vec<u8>, SearchError> {
    best_first(search, start, Rank::HeuristicOnly)
}

fn best_first(
    search: &Search<'_>,
    start: &PuzzleState,
    rank: Rank,
) -> Result<Vec<u8>, SearchError> {
    if search.is_goal(start) {
        return Ok(Vec::new());
    }
    let mut meter = search.meter();
    let mut open = BinaryHeap::new();
    // Best known g per state key; a popped entry with a stale g is skipped.
    let mut best_g: HashMap<Vec<u8>, u32> = HashMap::new();
    let mut seq = 0u64;
    best_g.insert(start.key().to_vec(), 0);
    open.push(OpenEntry {
        score: rank.score(search, start, 0),
        seq,
        g: 0,
        state: start.clone(),
        moves: Vec::new(),
    });
    while let Some(entry) = open.pop() {
        if best_g
            .get(entry.state.key())
            .is_some_and(|&g| g < entry.g)
        {
            continue;
        }
        meter.tick()?;
        if search.is_goal(&entry.state) {
            log::debug!(
                "best_first found length-{} path after {} nodes",
                entry.moves.len(),
                meter.nodes()
            );
            return Ok(entry.moves);
        }
        for (child, tile) in search.successors(&entry.state) {
            let g = entry.g + 1;
            let key = child.key().to_vec();
            if best_g.get(&key).is_some_and(|&known| known <= g) {
                continue;
            }
            best_g.insert(key, g);
            let mut moves = entry.moves.clone();
            moves.push(tile);
            seq += 1;
            open.push(OpenEntry {
                score: rank.score(search, &child, g),
                seq,
                g,
                state: child,
                moves,
            });
        }
    }
    Err(SearchError::Exhausted)
}

/// Memory-bounded A*: the closed set is a fixed-capacity LRU, so long runs
/// trade re-expansion of evicted states for a bounded memory footprint. Not
/// guaranteed optimal once eviction starts.
pub fn sma(search: &Search<'_>, start: &PuzzleState) -> Result<Vec<u8>, SearchError> {
    if search.is_goal(start) {
        return Ok(Vec::new());
    }
    let capacity = search.limits.memory_cap.unwrap_or(100_000);
    let mut meter = search.meter();
    let mut open = BinaryHeap::new();
    let mut closed = BoundedLru::new(capacity);
    let mut seq = 0u64;
    open.push(OpenEntry {
        score: search.h(start),
        seq,
        g: 0,
        state: start.clone(),
        moves: Vec::new(),
    });
    while let Some(entry) = open.pop() {
        if closed.contains(entry.state.key()) {
            continue;
        }
        meter.tick()?;
        if search.is_goal(&entry.state) {
            return Ok(entry.moves);
        }
        closed.insert(entry.state.key());
        for (child, tile) in search.successors(&entry.state) {
            if closed.contains(child.key()) {
                continue;
            }
            let g = entry.g + 1;
            let mut moves = entry.moves.clone();
            moves.push(tile);
            seq += 1;
            open.push(OpenEntry {
                score: g + search.h(&child),
                seq,
                g,
                state: child,
                moves,
            });
        }
    }
    Err(SearchError::Exhausted)
}

enum Backtrack {
    Found,
    /// Backed-up f-score of the subtree; `None` means the subtree is
    /// exhausted (an infinite backed-up value).
    Backed(Option<u32>),
}

/// Recursive best-first search: A*-quality paths with memory linear in the
/// search depth, at the cost of re-expanding siblings when the best line
/// overshoots its bound.
pub fn rbfs(search: &Search<'_>, start: &PuzzleState) -> Result<Vec<u8>, SearchError> {
    if search.is_goal(start) {
        return Ok(Vec::new());
    }
    let mut meter = search.meter();
    let mut path = Vec::new();
    let f0 = search.h(start);
    match rbfs_rec(search, start, 0, f0, None, None, &mut path, &mut meter)? {
        Backtrack::Found => Ok(path),
        Backtrack::Backed(_) => Err(SearchError::Exhausted),
    }
}

#[allow(clippy::too_many_arguments)]
fn rbfs_rec(
    search: &Search<'_>,
    state: &PuzzleState,
    g: u32,
    f_node: u32,
    bound: Option<u32>,
    prev: Option<u8>,
    path: &mut Vec<u8>,
    meter: &mut Meter,
) -> Result<Backtrack, SearchError> {
    meter.tick()?;
    if search.is_goal(state) {
        return Ok(Backtrack::Found);
    }
    // (state, move tile, backed-up f); f is raised to the parent's backed-up
    // value so re-expanded subtrees resume where they left off.
    let mut children: Vec<(PuzzleState, u8, Option<u32>)> = search
        .successors(state)
        .into_iter()
        .filter(|(_, tile)| prev != Some(*tile))
        .map(|(child, tile)| {
            let f = (g + 1 + search.h(&child)).max(f_node);
            (child, tile, Some(f))
        })
        .collect();
    if children.is_empty() {
        return Ok(Backtrack::Backed(None));
    }
    loop {
        // Index of the finite-f child with the smallest backed-up value.
        let best = match children
            .iter()
            .enumerate()
            .filter_map(|(i, (_, _, f))| f.map(|f| (i, f)))
            .min_by_key(|&(_, f)| f)
        {
            Some((i, _)) => i,
            None => return Ok(Backtrack::Backed(None)),
        };
        let best_f = children[best].2.unwrap_or(u32::MAX);
        if !within(best_f, bound) {
            return Ok(Backtrack::Backed(Some(best_f)));
        }
        let alternative = children
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != best)
            .filter_map(|(_, (_, _, f))| *f)
            .min();
        let child_bound = min_opt(bound, alternative);
        let child = children[best].0.clone();
        let tile = children[best].1;
        path.push(tile);
        match rbfs_rec(
            search,
            &child,
            g + 1,
            best_f,
            child_bound,
            Some(tile),
            path,
            meter,
        )? {
            Backtrack::Found => return Ok(Backtrack::Found),
            Backtrack::Backed(backed) => {
                path.pop();
                children[best].2 = backed;
            }
        }
    }
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
    fn test_a_star_matches_dijkstra_length() {
        let start = PuzzleState::solved(3).scramble(12, 11);
        let h: &HeuristicFn = &manhattan;
        let search = Search::new(h, solved_goal());
        let astar = a_star(&search, &start).unwrap();
        let uniform = dijkstra(&search, &start).unwrap();
        assert_eq!(astar.len(), uniform.len());
        assert!(replay_solves(&start, &astar));
        assert!(replay_solves(&start, &uniform));
    }

    #[test]
    fn test_greedy_reaches_goal_without_length_guarantee() {
        let start = PuzzleState::solved(3).scramble(10, 5);
        let h: &HeuristicFn = &manhattan;
        let search = Search::new(h, solved_goal());
        let moves = greedy(&search, &start).unwrap();
        assert!(replay_solves(&start, &moves));
    }

    #[test]
    fn test_sma_solves_under_tight_memory() {
        let start = PuzzleState::solved(3).scramble(10, 13);
        let h: &HeuristicFn = &manhattan;
        let mut search = Search::new(h, solved_goal());
        search.limits.memory_cap = Some(256);
        let moves = sma(&search, &start).unwrap();
        assert!(replay_solves(&start, &moves));
    }

    #[test]
    fn test_rbfs_matches_a_star_length() {
        let start = PuzzleState::solved(3).scramble(12, 21);
        let h: &HeuristicFn = &manhattan;
        let search = Search::new(h, solved_goal());
        let astar = a_star(&search, &start).unwrap();
        let recursive = rbfs(&search, &start).unwrap();
        assert_eq!(astar.len(), recursive.len());
        assert!(replay_solves(&start, &recursive));
    }

    #[test]
    fn test_a_star_node_cap_fails_cleanly() {
        let start = PuzzleState::solved(3).scramble(30, 77);
        let h: &HeuristicFn = &manhattan;
        let mut search = Search::new(h, solved_goal());
        search.limits.node_cap = Some(1);
        if !start.is_solved() && manhattan(&start) > 1 {
            assert_eq!(
                a_star(&search, &start).unwrap_err(),
                SearchError::NodeCapExceeded
            );
        }
    }
}
