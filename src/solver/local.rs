//! Local and population-based strategies: hill climbing, simulated
//! annealing, beam search, a genetic strategy and tabu search.
//!
//! None of these guarantee a solution, let alone a shortest one; they exist
//! for the hybrid dispatcher's long tail and for benchmarking against the
//! systematic strategies. Every stochastic choice draws from a `SmallRng`
//! seeded from [`LocalParams::seed`], so runs are reproducible.
//!
//! [`LocalParams::seed`]: super::LocalParams::seed

use super::support::BoundedLru;
use super::Search;
use crate::engine::PuzzleState;
use crate::error::SearchError;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// Steepest-ascent hill climbing: always moves to the best strictly
/// improving neighbor and gives up at the first local optimum.
pub fn hill_climbing(search: &Search<'_>, start: &PuzzleState) -> Result<Vec<u8>, SearchError> {
    if search.is_goal(start) {
        return Ok(Vec::new());
    }
    let mut meter = search.meter();
    let mut state = start.clone();
    let mut score = search.h(&state);
    let mut moves = Vec::new();
    for _ in 0..search.local.iterations {
        meter.tick()?;
        let best = search
            .successors(&state)
            .into_iter()
            .map(|(child, tile)| (search.h(&child), child, tile))
            .min_by_key(|(h, _, _)| *h);
        match best {
            Some((h, child, tile)) if h < score => {
                state = child;
                score = h;
                moves.push(tile);
                if search.is_goal(&state) {
                    return Ok(moves);
                }
            }
            // Local optimum: no strictly improving neighbor.
            _ => return Err(SearchError::Exhausted),
        }
    }
    Err(SearchError::Exhausted)
}

/// Simulated annealing: a random walk that always accepts improvements and
/// accepts regressions with probability `exp(-delta / temperature)`, with the
/// temperature decaying geometrically each step.
pub fn simulated_annealing(
    search: &Search<'_>,
    start: &PuzzleState,
) -> Result<Vec<u8>, SearchError> {
    if search.is_goal(start) {
        return Ok(Vec::new());
    }
    let mut meter = search.meter();
    let mut rng = SmallRng::seed_from_u64(search.local.seed);
    let mut state = start.clone();
    let mut score = search.h(&state) as f64;
    let mut temperature = search.local.start_temp;
    let mut moves = Vec::new();
    for _ in 0..search.local.iterations {
        meter.tick()?;
        let neighbors = search.successors(&state);
        if neighbors.is_empty() {
            return Err(SearchError::Exhausted);
        }
        let mut neighbors = neighbors;
        let (candidate, tile) = neighbors.swap_remove(rng.gen_range(0..neighbors.len()));
        let candidate_score = search.h(&candidate) as f64;
        let delta = candidate_score - score;
        if delta < 0.0 || rng.gen::<f64>() < (-delta / temperature.max(f64::MIN_POSITIVE)).exp() {
            state = candidate;
            score = candidate_score;
            moves.push(tile);
            if search.is_goal(&state) {
                return Ok(moves);
            }
        }
        temperature *= search.local.cooling;
    }
    Err(SearchError::Exhausted)
}

/// Beam search: breadth-first expansion that keeps only the `beam_width`
/// lowest-heuristic states per level. Fast, incomplete.
pub fn beam(search: &Search<'_>, start: &PuzzleState) -> Result<Vec<u8>, SearchError> {
    if search.is_goal(start) {
        return Ok(Vec::new());
    }
    let mut meter = search.meter();
    let mut frontier: Vec<(PuzzleState, Vec<u8>)> = vec![(start.clone(), Vec::new())];
    let mut seen: HashSet<Vec<u8>> = HashSet::new();
    seen.insert(start.key().to_vec());
    for _ in 0..search.local.beam_rounds {
        let mut level: Vec<(u32, PuzzleState, Vec<u8>)> = Vec::new();
        for (state, moves) in &frontier {
            meter.tick()?;
            for (child, tile) in search.successors(state) {
                if !seen.insert(child.key().to_vec()) {
                    continue;
                }
                let mut child_moves = moves.clone();
                child_moves.push(tile);
                if search.is_goal(&child) {
                    return Ok(child_moves);
                }
                level.push((search.h(&child), child, child_moves));
            }
        }
        if level.is_empty() {
            return Err(SearchError::Exhausted);
        }
        // Stable sort keeps generation order among equal scores.
        level.sort_by_key(|(h, _, _)| *h);
        level.truncate(search.local.beam_width);
        frontier = level
            .into_iter()
            .map(|(_, state, moves)| (state, moves))
            .collect();
    }
    Err(SearchError::Exhausted)
}

/// Genetic strategy over move chromosomes. Each gene indexes into the
/// candidate moves of the state reached so far; decoding yields a legal
/// move sequence whose end-state heuristic is the (minimized) fitness.
/// Midpoint crossover between surviving parents plus per-gene mutation.
pub fn genetic(search: &Search<'_>, start: &PuzzleState) -> Result<Vec<u8>, SearchError> {
    if search.is_goal(start) {
        return Ok(Vec::new());
    }
    let mut meter = search.meter();
    let mut rng = SmallRng::seed_from_u64(search.local.seed);
    let genes = search.depth_ceiling(start) as usize;
    let population = search.local.population.max(2);
    let mut chromosomes: Vec<Vec<u8>> = (0..population)
        .map(|_| (0..genes).map(|_| rng.gen_range(0..4u8)).collect())
        .collect();
    for _ in 0..search.local.generations {
        let mut scored: Vec<(u32, usize)> = Vec::with_capacity(chromosomes.len());
        for (i, chromosome) in chromosomes.iter().enumerate() {
            meter.tick()?;
            let (fitness, moves, solved) = decode(search, start, chromosome);
            if solved {
                return Ok(moves);
            }
            scored.push((fitness, i));
        }
        scored.sort_by_key(|&(fitness, i)| (fitness, i));
        // Top half survives and breeds the other half.
        let survivors: Vec<Vec<u8>> = scored[..population / 2]
            .iter()
            .map(|&(_, i)| chromosomes[i].clone())
            .collect();
        let mut next = survivors.clone();
        while next.len() < population {
            let a = &survivors[rng.gen_range(0..survivors.len())];
            let b = &survivors[rng.gen_range(0..survivors.len())];
            let mid = genes / 2;
            let mut child: Vec<u8> = a[..mid].iter().chain(b[mid..].iter()).copied().collect();
            for gene in child.iter_mut() {
                if rng.gen::<f64>() < search.local.mutation_rate {
                    *gene = rng.gen_range(0..4u8);
                }
            }
            next.push(child);
        }
        chromosomes = next;
    }
    Err(SearchError::Exhausted)
}

/// Decodes a chromosome into (end-state heuristic, legal move list, solved).
/// Decoding stops early when the goal is reached; the returned list is
/// trimmed to the moves actually taken.
fn decode(
    search: &Search<'_>,
    start: &PuzzleState,
    chromosome: &[u8],
) -> (u32, Vec<u8>, bool) {
    let mut state = start.clone();
    let mut moves = Vec::with_capacity(chromosome.len());
    let mut prev: Option<u8> = None;
    for &gene in chromosome {
        if search.is_goal(&state) {
            break;
        }
        // Moving the previous tile again would undo the previous gene.
        let mut candidates: Vec<(PuzzleState, u8)> = search
            .successors(&state)
            .into_iter()
            .filter(|(_, tile)| prev != Some(*tile))
            .collect();
        if candidates.is_empty() {
            break;
        }
        let (child, tile) = candidates.swap_remove(gene as usize % candidates.len());
        state = child;
        prev = Some(tile);
        moves.push(tile);
    }
    let h = search.h(&state);
    let solved = search.is_goal(&state);
    (h, moves, solved)
}

/// Tabu search: greedy descent that forbids revisiting the most recent
/// states. A neighborhood with no non-tabu member ends the search.
pub fn tabu(search: &Search<'_>, start: &PuzzleState) -> Result<Vec<u8>, SearchError> {
    if search.is_goal(start) {
        return Ok(Vec::new());
    }
    let mut meter = search.meter();
    let mut tabu_list = BoundedLru::new(search.local.tabu_len);
    tabu_list.insert(start.key());
    let mut state = start.clone();
    let mut moves = Vec::new();
    for _ in 0..search.local.iterations {
        meter.tick()?;
        let neighbors: Vec<(u32, PuzzleState, u8)> = search
            .successors(&state)
            .into_iter()
            .map(|(child, tile)| (search.h(&child), child, tile))
            .collect();
        if neighbors.is_empty() {
            return Err(SearchError::Exhausted);
        }
        let Some(index) = best_non_tabu(&neighbors, &tabu_list) else {
            return Err(SearchError::Exhausted);
        };
        let mut neighbors = neighbors;
        let (_, child, tile) = neighbors.swap_remove(index);
        tabu_list.insert(child.key());
        state = child;
        moves.push(tile);
        if search.is_goal(&state) {
            return Ok(moves);
        }
    }
    Err(SearchError::Exhausted)
}

/// Index of the lowest-h neighbor not on the tabu list, or `None` if the
/// whole neighborhood is tabu.
fn best_non_tabu(neighbors: &[(u32, PuzzleState, u8)], tabu_list: &BoundedLru) -> Option<usize> {
    neighbors
        .iter()
        .enumerate()
        .filter(|(_, (_, child, _))| !tabu_list.contains(child.key()))
        .min_by_key(|(_, (h, _, _))| *h)
        .map(|(i, _)| i)
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
    fn test_hill_climbing_solves_a_downhill_instance() {
        // Two moves away with strictly decreasing Manhattan distance.
        let mut start = PuzzleState::solved(3);
        assert!(start.apply_move_value(8));
        assert!(start.apply_move_value(7));
        let h: &HeuristicFn = &manhattan;
        let search = Search::new(h, solved_goal());
        let moves = hill_climbing(&search, &start).unwrap();
        assert_eq!(moves.len(), 2);
        assert!(replay_solves(&start, &moves));
    }

    #[test]
    fn test_simulated_annealing_walk_is_replayable() {
        let start = PuzzleState::solved(3).scramble(6, 2);
        let h: &HeuristicFn = &manhattan;
        let search = Search::new(h, solved_goal());
        match simulated_annealing(&search, &start) {
            Ok(moves) => assert!(replay_solves(&start, &moves)),
            Err(e) => assert_eq!(e, SearchError::Exhausted),
        }
    }

    #[test]
    fn test_beam_solves_light_scramble() {
        let start = PuzzleState::solved(3).scramble(10, 8);
        let h: &HeuristicFn = &manhattan;
        let search = Search::new(h, solved_goal());
        let moves = beam(&search, &start).unwrap();
        assert!(replay_solves(&start, &moves));
    }

    #[test]
    fn test_genetic_result_is_replayable_when_found() {
        let start = PuzzleState::solved(3).scramble(4, 6);
        let h: &HeuristicFn = &manhattan;
        let search = Search::new(h, solved_goal());
        match genetic(&search, &start) {
            Ok(moves) => assert!(replay_solves(&start, &moves)),
            Err(e) => assert_eq!(e, SearchError::Exhausted),
        }
    }

    #[test]
    fn test_tabu_escapes_where_hill_climbing_cannot() {
        let start = PuzzleState::solved(3).scramble(8, 15);
        let h: &HeuristicFn = &manhattan;
        let search = Search::new(h, solved_goal());
        match tabu(&search, &start) {
            Ok(moves) => assert!(replay_solves(&start, &moves)),
            Err(e) => assert_eq!(e, SearchError::Exhausted),
        }
    }

    #[test]
    fn test_tabu_neighborhood_selection_ends_on_all_tabu() {
        let start = PuzzleState::solved(3).scramble(6, 5);
        let neighbors: Vec<(u32, PuzzleState, u8)> = start
            .neighbors_masked(None)
            .into_iter()
            .map(|(child, tile)| (manhattan(&child), child, tile))
            .collect();
        let mut tabu_list = BoundedLru::new(16);
        assert!(best_non_tabu(&neighbors, &tabu_list).is_some());
        for (_, child, _) in &neighbors {
            tabu_list.insert(child.key());
        }
        assert_eq!(best_non_tabu(&neighbors, &tabu_list), None);
    }

    #[test]
    fn test_stochastic_runs_are_deterministic() {
        let start = PuzzleState::solved(3).scramble(6, 2);
        let h: &HeuristicFn = &manhattan;
        let search = Search::new(h, solved_goal());
        let first = simulated_annealing(&search, &start);
        let second = simulated_annealing(&search, &start);
        assert_eq!(first, second);
    }
}
