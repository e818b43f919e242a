//! Uninformed strategies: BFS, bounded DFS, iterative-deepening DFS and
//! bidirectional BFS.
//!
//! BFS and bidirectional BFS return shortest paths; bounded DFS returns the
//! first path it stumbles on within its depth ceiling. Bidirectional BFS
//! leans on moves being self-inverse: a backward path from the goal to the
//! meeting state, reversed verbatim, is a forward path from the meeting
//! state to the goal.

use super::{within, Search};
use crate::engine::PuzzleState;
use crate::error::SearchError;
use std::collections::{HashMap, HashSet, VecDeque};

/// Breadth-first search; shortest path, no heuristic.
pub fn bfs(search: &Search<'_>, start: &PuzzleState) -> Result<Vec<u8>, SearchError> {
    if search.is_goal(start) {
        return Ok(Vec::new());
    }
    let mut meter = search.meter();
    let mut queue: VecDeque<(PuzzleState, Vec<u8>)> = VecDeque::new();
    let mut seen: HashSet<Vec<u8>> = HashSet::new();
    seen.insert(start.key().to_vec());
    queue.push_back((start.clone(), Vec::new()));
    while let Some((state, moves)) = queue.pop_front() {
        meter.tick()?;
        for (child, tile) in search.successors(&state) {
            if !seen.insert(child.key().to_vec()) {
                continue;
            }
            let mut child_moves = moves.clone();
            child_moves.push(tile);
            if search.is_goal(&child) {
                log::debug!(
                    "bfs found length-{} path after {} nodes",
                    child_moves.len(),
                    meter.nodes()
                );
                return Ok(child_moves);
            }
            queue.push_back((child, child_moves));
        }
    }
    Err(SearchError::Exhausted)
}

/// Depth-first search bounded by the depth ceiling. Returns the first path
/// found, with no length guarantee.
pub fn dfs_bounded(search: &Search<'_>, start: &PuzzleState) -> Result<Vec<u8>, SearchError> {
    if search.is_goal(start) {
        return Ok(Vec::new());
    }
    let mut meter = search.meter();
    let ceiling = search.depth_ceiling(start);
    let mut path = Vec::new();
    let mut memo = HashMap::new();
    if dls(search, start, ceiling, &mut path, &mut memo, &mut meter)?.0 {
        Ok(path)
    } else {
        Err(SearchError::Exhausted)
    }
}

/// Iterative-deepening DFS: depth-limited passes with a growing ceiling,
/// which makes the first hit a shortest path.
pub fn iddfs(search: &Search<'_>, start: &PuzzleState) -> Result<Vec<u8>, SearchError> {
    if search.is_goal(start) {
        return Ok(Vec::new());
    }
    let mut meter = search.meter();
    let ceiling = search.depth_ceiling(start);
    for depth in 1..=ceiling {
        let mut path = Vec::new();
        let mut memo = HashMap::new();
        let (found, cut) = dls(search, start, depth, &mut path, &mut memo, &mut meter)?;
        if found {
            return Ok(path);
        }
        // Nothing was cut off by the depth limit: deeper passes are futile.
        if !cut {
            return Err(SearchError::Exhausted);
        }
    }
    Err(SearchError::Exhausted)
}

/// Depth-limited DFS. Returns (found, cut-off-by-depth).
///
/// `memo` records the largest remaining budget a state has been expanded
/// with; a revisit with no more budget than before cannot reach anything
/// new and is skipped. That bounds the work per pass to states times depth
/// and no solution within the limit is ever missed.
fn dls(
    search: &Search<'_>,
    state: &PuzzleState,
    remaining: u32,
    path: &mut Vec<u8>,
    memo: &mut HashMap<Vec<u8>, u32>,
    meter: &mut super::Meter,
) -> Result<(bool, bool), SearchError> {
    if memo.get(state.key()).is_some_and(|&r| r >= remaining) {
        return Ok((false, true));
    }
    memo.insert(state.key().to_vec(), remaining);
    meter.tick()?;
    let mut cut = false;
    for (child, tile) in search.successors(state) {
        path.push(tile);
        if search.is_goal(&child) {
            return Ok((true, cut));
        }
        if remaining == 1 {
            cut = true;
            path.pop();
            continue;
        }
        let (found, child_cut) = dls(search, &child, remaining - 1, path, memo, meter)?;
        if found {
            return Ok((true, cut));
        }
        cut |= child_cut;
        path.pop();
    }
    Ok((false, cut))
}

/// Bidirectional BFS between `start` and the fully solved board. Expands the
/// smaller frontier one whole level at a time and joins the two half-paths at
/// the meeting state, so the result is a shortest path.
pub fn bibfs(search: &Search<'_>, start: &PuzzleState) -> Result<Vec<u8>, SearchError> {
    if search.is_goal(start) {
        return Ok(Vec::new());
    }
    let target = PuzzleState::solved(start.size());
    if start.key() == target.key() {
        return Ok(Vec::new());
    }
    let mut meter = search.meter();
    let mut forward = Frontier::new(start);
    let mut backward = Frontier::new(&target);
    let mut depth = 0u32;
    while !forward.queue.is_empty() && !backward.queue.is_empty() {
        if !within(depth + 1, search.limits.depth_cap) {
            return Err(SearchError::Exhausted);
        }
        depth += 1;
        let meeting = if forward.queue.len() <= backward.queue.len() {
            forward.expand_level(search, &backward.seen, &mut meter)?
        } else {
            backward.expand_level(search, &forward.seen, &mut meter)?
        };
        if let Some(key) = meeting {
            let fwd = forward.seen.get(&key).cloned().unwrap_or_default();
            let mut bwd = backward.seen.get(&key).cloned().unwrap_or_default();
            // Self-inverse moves: the goal-to-meeting list reversed is the
            // meeting-to-goal list.
            bwd.reverse();
            let mut moves = fwd;
            moves.extend(bwd);
            log::debug!(
                "bibfs met after {} nodes with a length-{} path",
                meter.nodes(),
                moves.len()
            );
            return Ok(moves);
        }
    }
    Err(SearchError::Exhausted)
}

struct Frontier {
    queue: VecDeque<PuzzleState>,
    seen: HashMap<Vec<u8>, Vec<u8>>,
}

impl Frontier {
    fn new(origin: &PuzzleState) -> Self {
        let mut seen = HashMap::new();
        seen.insert(origin.key().to_vec(), Vec::new());
        Frontier {
            queue: VecDeque::from([origin.clone()]),
            seen,
        }
    }

    /// Expands one whole level, recording each new state's move list from
    /// this frontier's origin. Returns the key of the first generated state
    /// already known to the opposite frontier.
    fn expand_level(
        &mut self,
        search: &Search<'_>,
        other_seen: &HashMap<Vec<u8>, Vec<u8>>,
        meter: &mut super::Meter,
    ) -> Result<Option<Vec<u8>>, SearchError> {
        for _ in 0..self.queue.len() {
            let state = match self.queue.pop_front() {
                Some(state) => state,
                None => break,
            };
            meter.tick()?;
            let moves = self.seen.get(state.key()).cloned().unwrap_or_default();
            for (child, tile) in search.successors(&state) {
                let key = child.key().to_vec();
                if self.seen.contains_key(&key) {
                    continue;
                }
                let mut child_moves = moves.clone();
                child_moves.push(tile);
                self.seen.insert(key.clone(), child_moves);
                if other_seen.contains_key(&key) {
                    return Ok(Some(key));
                }
                self.queue.push_back(child);
            }
        }
        Ok(None)
    }
}
