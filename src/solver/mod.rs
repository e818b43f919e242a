//! Search algorithms over the puzzle state space.
//!
//! Every algorithm is a pure function from a start state plus a [`Search`]
//! description (heuristic, goal test, locked positions, resource limits) to
//! either a move list (`Ok`, empty when the start is already solved) or a
//! [`SearchError`]. No algorithm mutates the start state; exploration always
//! clones derived states. The submodules group the strategies:
//!
//! - [`ida`]: iterative-deepening A*.
//! - [`best_first`]: A*, Dijkstra, greedy best-first, memory-bounded A*,
//!   recursive best-first search.
//! - [`blind`]: BFS, bounded DFS, iterative-deepening DFS, bidirectional BFS.
//! - [`bound`]: depth-first and breadth-first branch-and-bound.
//! - [`local`]: hill climbing, simulated annealing, beam search, genetic,
//!   tabu search.
//! - [`support`]: the shared data structures (deterministic open-list
//!   entries, bounded LRU set, symmetry table).

pub mod best_first;
pub mod blind;
pub mod bound;
pub mod ida;
pub mod local;
pub mod support;

use crate::engine::PuzzleState;
use crate::error::SearchError;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Heuristic signature shared by all algorithms.
pub type HeuristicFn = dyn Fn(&PuzzleState) -> u32 + Sync;
/// Goal-test signature shared by all algorithms.
pub type GoalFn = dyn Fn(&PuzzleState) -> bool + Sync;

/// Resource ceilings for one algorithm attempt. `None` means unbounded;
/// there are no numeric infinity sentinels anywhere in the search core.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    /// Maximum number of node expansions.
    pub node_cap: Option<u64>,
    /// Wall-clock budget, checked at every expansion.
    pub time_cap: Option<Duration>,
    /// Path-depth ceiling for the depth-limited strategies.
    pub depth_cap: Option<u32>,
    /// Capacity of the LRU closed set for memory-bounded A*.
    pub memory_cap: Option<usize>,
}

/// Tuning knobs for the stochastic and local-search strategies. The default
/// seed matches the one used for deterministic board generation, so repeated
/// runs reproduce byte-for-byte.
#[derive(Clone, Debug)]
pub struct LocalParams {
    /// Iteration cap for hill climbing, simulated annealing and tabu search.
    pub iterations: u32,
    /// Beam width for beam search.
    pub beam_width: usize,
    /// Round cap for beam search.
    pub beam_rounds: u32,
    /// Population size for the genetic strategy.
    pub population: usize,
    /// Generation cap for the genetic strategy.
    pub generations: u32,
    /// Per-gene mutation probability for the genetic strategy.
    pub mutation_rate: f64,
    /// Recency capacity of the tabu list.
    pub tabu_len: usize,
    /// Initial temperature for simulated annealing.
    pub start_temp: f64,
    /// Geometric decay applied to the temperature each step.
    pub cooling: f64,
    /// RNG seed for every stochastic strategy.
    pub seed: u64,
}

impl Default for LocalParams {
    fn default() -> Self {
        LocalParams {
            iterations: 2_000,
            beam_width: 64,
            beam_rounds: 200,
            population: 64,
            generations: 150,
            mutation_rate: 0.02,
            tabu_len: 128,
            start_temp: 10.0,
            cooling: 0.995,
            seed: 514514,
        }
    }
}

/// Everything an algorithm needs besides the start state.
///
/// The borrow-heavy shape is deliberate: one `Search` is built per attempt
/// and handed by reference, so concurrent attempts never share mutable
/// state: each gets its own frontier and visited structures inside the
/// algorithm body.
pub struct Search<'a> {
    /// Distance estimator (ignored by the uninformed strategies).
    pub heuristic: &'a HeuristicFn,
    /// Goal predicate; the whole-board solved test or a staged prefix test.
    pub goal: &'a GoalFn,
    /// Board positions whose tiles must not move, for staged sub-searches.
    pub locked: Option<&'a HashSet<usize>>,
    /// Resource ceilings for this attempt.
    pub limits: Limits,
    /// Stochastic-search knobs.
    pub local: LocalParams,
    /// Enable 8-fold symmetry pruning in IDA* (stage-1 sub-goals only; it
    /// is not safe for whole-board optimal search).
    pub symmetry: bool,
    /// Cooperative stop flag shared between racing workers. A searcher that
    /// observes the flag set stands down with [`SearchError::Abandoned`].
    pub found: Option<Arc<AtomicBool>>,
}

impl<'a> Search<'a> {
    /// Builds a search description with default limits and no locked mask.
    pub fn new(heuristic: &'a HeuristicFn, goal: &'a GoalFn) -> Self {
        Search {
            heuristic,
            goal,
            locked: None,
            limits: Limits::default(),
            local: LocalParams::default(),
            symmetry: false,
            found: None,
        }
    }

    pub(crate) fn successors(&self, state: &PuzzleState) -> Vec<(PuzzleState, u8)> {
        state.neighbors_masked(self.locked)
    }

    pub(crate) fn h(&self, state: &PuzzleState) -> u32 {
        (self.heuristic)(state)
    }

    pub(crate) fn is_goal(&self, state: &PuzzleState) -> bool {
        (self.goal)(state)
    }

    pub(crate) fn meter(&self) -> Meter {
        Meter::new(&self.limits, self.found.clone())
    }

    /// Depth ceiling for the depth-limited strategies, defaulting to four
    /// moves per cell when unset.
    pub(crate) fn depth_ceiling(&self, state: &PuzzleState) -> u32 {
        self.limits
            .depth_cap
            .unwrap_or((state.size() * state.size() * 4) as u32)
    }
}

/// Expansion accounting shared by every algorithm: node cap, wall clock and
/// the cooperative stop flag, checked at every loop iteration or recursive
/// re-entry.
pub(crate) struct Meter {
    nodes: u64,
    node_cap: Option<u64>,
    deadline: Option<Instant>,
    found: Option<Arc<AtomicBool>>,
}

impl Meter {
    pub(crate) fn new(limits: &Limits, found: Option<Arc<AtomicBool>>) -> Self {
        Meter {
            nodes: 0,
            node_cap: limits.node_cap,
            deadline: limits.time_cap.map(|d| Instant::now() + d),
            found,
        }
    }

    /// Records one expansion and reports the first exceeded ceiling.
    pub(crate) fn tick(&mut self) -> Result<(), SearchError> {
        self.nodes += 1;
        if self.node_cap.is_some_and(|cap| self.nodes > cap) {
            return Err(SearchError::NodeCapExceeded);
        }
        if self.deadline.is_some_and(|d| Instant::now() > d) {
            return Err(SearchError::TimedOut);
        }
        if self
            .found
            .as_ref()
            .is_some_and(|f| f.load(Ordering::Relaxed))
        {
            return Err(SearchError::Abandoned);
        }
        Ok(())
    }

    pub(crate) fn nodes(&self) -> u64 {
        self.nodes
    }
}

/// Minimum of two optional bounds where `None` means "no candidate yet".
pub(crate) fn min_opt(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

/// Whether `value` is within an optional upper bound (`None` = unbounded).
pub(crate) fn within(value: u32, bound: Option<u32>) -> bool {
    bound.map_or(true, |b| value <= b)
}

/// The interchangeable search strategies, in the canonical dispatch order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    IdaStar,
    AStar,
    Dijkstra,
    Bfs,
    DfsBounded,
    Iddfs,
    Bibfs,
    Greedy,
    Rbfs,
    Sma,
    Dfbnb,
    Bfbnb,
    HillClimbing,
    SimulatedAnnealing,
    Beam,
    Genetic,
    Tabu,
}

impl Algorithm {
    /// Every strategy, in the canonical order the hybrid dispatcher uses.
    pub const ALL: [Algorithm; 17] = [
        Algorithm::IdaStar,
        Algorithm::AStar,
        Algorithm::Dijkstra,
        Algorithm::Bfs,
        Algorithm::DfsBounded,
        Algorithm::Iddfs,
        Algorithm::Bibfs,
        Algorithm::Greedy,
        Algorithm::Rbfs,
        Algorithm::Sma,
        Algorithm::Dfbnb,
        Algorithm::Bfbnb,
        Algorithm::HillClimbing,
        Algorithm::SimulatedAnnealing,
        Algorithm::Beam,
        Algorithm::Genetic,
        Algorithm::Tabu,
    ];

    /// Stable text name used in traces, CLI arguments and logs.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::IdaStar => "ida_star",
            Algorithm::AStar => "a_star",
            Algorithm::Dijkstra => "dijkstra",
            Algorithm::Bfs => "bfs",
            Algorithm::DfsBounded => "dfs_bounded",
            Algorithm::Iddfs => "iddfs",
            Algorithm::Bibfs => "bibfs",
            Algorithm::Greedy => "greedy",
            Algorithm::Rbfs => "rbfs",
            Algorithm::Sma => "sma_star",
            Algorithm::Dfbnb => "dfbnb",
            Algorithm::Bfbnb => "bfbnb",
            Algorithm::HillClimbing => "hill_climbing",
            Algorithm::SimulatedAnnealing => "simulated_annealing",
            Algorithm::Beam => "beam",
            Algorithm::Genetic => "genetic",
            Algorithm::Tabu => "tabu",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| format!("unknown algorithm '{}'", s))
    }
}

/// Runs one strategy against an unmodified start state.
pub fn run(
    algorithm: Algorithm,
    search: &Search<'_>,
    start: &PuzzleState,
) -> Result<Vec<u8>, SearchError> {
    match algorithm {
        Algorithm::IdaStar => ida::ida_star(search, start),
        Algorithm::AStar => best_first::a_star(search, start),
        Algorithm::Dijkstra => best_first::dijkstra(search, start),
        Algorithm::Bfs => blind::bfs(search, start),
        Algorithm::DfsBounded => blind::dfs_bounded(search, start),
        Algorithm::Iddfs => blind::iddfs(search, start),
        Algorithm::Bibfs => blind::bibfs(search, start),
        Algorithm::Greedy => best_first::greedy(search, start),
        Algorithm::Rbfs => best_first::rbfs(search, start),
        Algorithm::Sma => best_first::sma(search, start),
        Algorithm::Dfbnb => bound::dfbnb(search, start),
        Algorithm::Bfbnb => bound::bfbnb(search, start),
        Algorithm::HillClimbing => local::hill_climbing(search, start),
        Algorithm::SimulatedAnnealing => local::simulated_annealing(search, start),
        Algorithm::Beam => local::beam(search, start),
        Algorithm::Genetic => local::genetic(search, start),
        Algorithm::Tabu => local::tabu(search, start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PuzzleState;
    use crate::heuristics::manhattan;

    fn whole_board_search<'a>(h: &'a HeuristicFn, goal: &'a GoalFn) -> Search<'a> {
        Search::new(h, goal)
    }

    #[test]
    fn test_algorithm_names_round_trip() {
        for algorithm in Algorithm::ALL {
            let parsed: Algorithm = algorithm.name().parse().unwrap();
            assert_eq!(parsed, algorithm);
        }
        assert!("no_such_algorithm".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_every_algorithm_short_circuits_on_solved_start() {
        let start = PuzzleState::solved(3);
        let goal: &GoalFn = &|s: &PuzzleState| s.is_solved();
        let h: &HeuristicFn = &manhattan;
        for algorithm in Algorithm::ALL {
            let mut search = whole_board_search(h, goal);
            // A zero node cap proves no expansion happens before the check.
            search.limits.node_cap = Some(0);
            let moves = run(algorithm, &search, &start)
                .unwrap_or_else(|e| panic!("{} failed on solved start: {}", algorithm, e));
            assert!(moves.is_empty(), "{} expanded a solved start", algorithm);
        }
    }

    #[test]
    fn test_complete_algorithms_solve_a_light_scramble() {
        let start = PuzzleState::solved(3).scramble(8, 42);
        let goal: &GoalFn = &|s: &PuzzleState| s.is_solved();
        let h: &HeuristicFn = &manhattan;
        let complete = [
            Algorithm::IdaStar,
            Algorithm::AStar,
            Algorithm::Dijkstra,
            Algorithm::Bfs,
            Algorithm::Iddfs,
            Algorithm::Bibfs,
            Algorithm::Rbfs,
            Algorithm::Dfbnb,
            Algorithm::Bfbnb,
        ];
        for algorithm in complete {
            let mut search = whole_board_search(h, goal);
            search.limits.node_cap = Some(500_000);
            let moves = run(algorithm, &search, &start)
                .unwrap_or_else(|e| panic!("{} failed: {}", algorithm, e));
            let mut replay = start.clone();
            for &tile in &moves {
                assert!(replay.apply_move_value(tile), "{} produced an illegal move", algorithm);
            }
            assert!(replay.is_solved(), "{} did not reach the goal", algorithm);
        }
    }

    #[test]
    fn test_meter_node_cap() {
        let limits = Limits {
            node_cap: Some(2),
            ..Limits::default()
        };
        let mut meter = Meter::new(&limits, None);
        assert!(meter.tick().is_ok());
        assert!(meter.tick().is_ok());
        assert_eq!(meter.tick().unwrap_err(), SearchError::NodeCapExceeded);
        assert_eq!(meter.nodes(), 3);
    }

    #[test]
    fn test_meter_found_flag_abandons() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut meter = Meter::new(&Limits::default(), Some(flag.clone()));
        assert!(meter.tick().is_ok());
        flag.store(true, Ordering::Relaxed);
        assert_eq!(meter.tick().unwrap_err(), SearchError::Abandoned);
    }

    #[test]
    fn test_min_opt_and_within() {
        assert_eq!(min_opt(None, None), None);
        assert_eq!(min_opt(Some(3), None), Some(3));
        assert_eq!(min_opt(Some(3), Some(2)), Some(2));
        assert!(within(5, None));
        assert!(within(5, Some(5)));
        assert!(!within(6, Some(5)));
    }
}
