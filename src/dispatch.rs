//! The hybrid dispatcher: try every search strategy against the original
//! start state until one produces a solution.
//!
//! Sequential mode walks [`Algorithm::ALL`] in canonical order on the
//! calling thread; parallel mode launches every strategy on its own thread
//! against an independent clone and takes the first success, abandoning the
//! rest through the shared found flag. Either way the caller gets the full
//! attempt trace for diagnostics, and a panic inside one attempt counts as
//! that attempt failing rather than poisoning the dispatch.

use crate::engine::PuzzleState;
use crate::heuristics;
use crate::solver::{self, Algorithm, GoalFn, HeuristicFn, Limits, Search};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// One dispatcher attempt: which strategy ran and what it returned.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attempt {
    pub algorithm: String,
    pub result: Option<Vec<u8>>,
}

/// Per-attempt resource limits by board size. 3x3 gets a node cap large
/// enough for exhaustive strategies (the whole reachable space is 181,440
/// states); larger boards get tighter caps since the dispatcher is only a
/// fallback for them.
pub fn limits_for(size: usize) -> Limits {
    match size {
        3 => Limits {
            node_cap: Some(500_000),
            time_cap: Some(Duration::from_millis(5_000)),
            depth_cap: None,
            memory_cap: Some(100_000),
        },
        _ => Limits {
            node_cap: Some(200_000),
            time_cap: Some(Duration::from_millis(5_000)),
            depth_cap: Some((size * size * 4) as u32),
            memory_cap: Some(50_000),
        },
    }
}

/// Runs the strategies one after another on the calling thread, stopping at
/// the first success. Every attempt lands in the trace, the failed ones with
/// a `None` result.
pub fn run_sequential(
    start: &PuzzleState,
    limits: &Limits,
) -> (Option<Vec<u8>>, Vec<Attempt>) {
    let mut attempts = Vec::new();
    for algorithm in Algorithm::ALL {
        let result = run_contained(algorithm, start, limits, None);
        let success = result.is_some();
        attempts.push(Attempt {
            algorithm: algorithm.name().to_string(),
            result: result.clone(),
        });
        if success {
            log::info!("dispatcher: {} solved the board", algorithm);
            return (result, attempts);
        }
        log::debug!("dispatcher: {} failed, moving on", algorithm);
    }
    (None, attempts)
}

/// Launches every strategy concurrently against its own clone of the start
/// state. The first success flips the shared found flag; the other threads
/// notice it at their next expansion and stand down. Wasted work is
/// acceptable; shared mutable state is not.
pub fn run_parallel(start: &PuzzleState, limits: &Limits) -> (Option<Vec<u8>>, Vec<Attempt>) {
    let found = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel();
    let mut handles = Vec::with_capacity(Algorithm::ALL.len());
    for algorithm in Algorithm::ALL {
        let tx = tx.clone();
        let found = Arc::clone(&found);
        let start = start.clone();
        let limits = limits.clone();
        handles.push(thread::spawn(move || {
            let result = run_contained(algorithm, &start, &limits, Some(Arc::clone(&found)));
            if result.is_some() {
                found.store(true, Ordering::Relaxed);
            }
            let _ = tx.send((algorithm, result));
        }));
    }
    drop(tx);
    let mut winner: Option<Vec<u8>> = None;
    let mut finished: Vec<(Algorithm, Option<Vec<u8>>)> = Vec::new();
    for (algorithm, result) in rx {
        if winner.is_none() && result.is_some() {
            log::info!("dispatcher: {} won the race", algorithm);
            winner = result.clone();
        }
        finished.push((algorithm, result));
    }
    for handle in handles {
        let _ = handle.join();
    }
    // Arrival order is nondeterministic; report the trace canonically.
    finished.sort_by_key(|(algorithm, _)| {
        Algorithm::ALL.iter().position(|a| a == algorithm)
    });
    let attempts = finished
        .into_iter()
        .map(|(algorithm, result)| Attempt {
            algorithm: algorithm.name().to_string(),
            result,
        })
        .collect();
    (winner, attempts)
}

/// Runs one strategy with panic containment: a panicking attempt is treated
/// as that attempt finding nothing.
fn run_contained(
    algorithm: Algorithm,
    start: &PuzzleState,
    limits: &Limits,
    found: Option<Arc<AtomicBool>>,
) -> Option<Vec<u8>> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let h: &HeuristicFn = &heuristics::manhattan_with_conflicts;
        let goal: &GoalFn = &|s: &PuzzleState| s.is_solved();
        let mut search = Search::new(h, goal);
        search.limits = limits.clone();
        search.found = found;
        solver::run(algorithm, &search, start)
    }));
    match outcome {
        Ok(Ok(moves)) => Some(moves),
        Ok(Err(e)) => {
            log::debug!("{}: {}", algorithm, e);
            None
        }
        Err(_) => {
            log::warn!("{} panicked; treating as no solution", algorithm);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_returns_first_success_and_full_trace() {
        let start = PuzzleState::solved(3).scramble(10, 19);
        let limits = limits_for(3);
        let (moves, attempts) = run_sequential(&start, &limits);
        let moves = moves.expect("a light 3x3 scramble must be solvable");
        let mut replay = start;
        for &tile in &moves {
            assert!(replay.apply_move_value(tile));
        }
        assert!(replay.is_solved());
        // The canonical order starts with IDA*, which solves 3x3 boards, so
        // the trace stops at the first attempt.
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].algorithm, "ida_star");
        assert_eq!(attempts[0].result, Some(moves));
    }

    #[test]
    fn test_parallel_trace_is_canonically_ordered() {
        let start = PuzzleState::solved(3).scramble(8, 3);
        let limits = limits_for(3);
        let (moves, attempts) = run_parallel(&start, &limits);
        assert!(moves.is_some());
        assert_eq!(attempts.len(), Algorithm::ALL.len());
        let names: Vec<&str> = attempts.iter().map(|a| a.algorithm.as_str()).collect();
        let canonical: Vec<&str> = Algorithm::ALL.iter().map(|a| a.name()).collect();
        assert_eq!(names, canonical);
    }

    #[test]
    fn test_attempt_serializes_with_null_result() {
        let attempt = Attempt {
            algorithm: "bfs".to_string(),
            result: None,
        };
        let json = serde_json::to_string(&attempt).unwrap();
        assert_eq!(json, r#"{"algorithm":"bfs","result":null}"#);
    }
}
