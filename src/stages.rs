//! Staged solving for 4x4 and 5x5 boards, and the [`Engine`] that ties
//! validation, staging and the hybrid dispatcher into one request/response
//! entry point.
//!
//! Whole-board optimal search is intractable for these sizes within bounded
//! resources, so the controller locks goal positions one at a time: each
//! locking stage is an IDA* sub-search whose goal is "the first k positions
//! hold their goal tiles" and whose move generation refuses to disturb the
//! already-locked positions. Once the prefix is placed, the remaining free
//! sub-board is solved as an ordinary whole-board problem, with bidirectional
//! BFS as the fallback. Any stage that exhausts its budget aborts the whole
//! staged solve; partial progress is discarded, never reported.

use crate::dispatch;
use crate::engine::PuzzleState;
use crate::error::SearchError;
use crate::heuristics::{self, PatternDb};
use crate::solver::{self, Algorithm, GoalFn, HeuristicFn, Limits, Search};
use crate::worker::{SolveMode, SolveRequest, SolveResponse};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// Budgets for one stage of the decomposition.
#[derive(Clone, Debug)]
pub struct StageBudget {
    pub node_cap: Option<u64>,
    pub time_cap: Option<Duration>,
    pub depth_cap: Option<u32>,
}

impl StageBudget {
    fn limits(&self) -> Limits {
        Limits {
            node_cap: self.node_cap,
            time_cap: self.time_cap,
            depth_cap: self.depth_cap,
            memory_cap: None,
        }
    }
}

/// Per-board-size decomposition plan.
#[derive(Clone, Debug)]
pub struct SizePlan {
    /// How many goal positions stage 1 locks, one at a time.
    pub locked_prefix: usize,
    /// Depth bound of the pattern database for the full locked prefix.
    pub pdb_depth: u32,
    /// Budget for each individual locking sub-search.
    pub stage1: StageBudget,
    /// Budget for the final free sub-board search.
    pub stage2: StageBudget,
    /// Budget for the bidirectional BFS fallback after stage 2.
    pub fallback: StageBudget,
    /// Number of racing stage-2 threads (1 = run inline).
    pub race_threads: usize,
}

/// Full engine configuration: one plan per staged board size plus the
/// dispatcher fallback switch.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub four: SizePlan,
    pub five: SizePlan,
    /// Try the hybrid dispatcher once before giving up on a failed staged
    /// solve.
    pub hybrid_fallback: bool,
}

impl EngineConfig {
    /// The standard preset.
    pub fn standard() -> Self {
        EngineConfig {
            four: SizePlan {
                locked_prefix: 6,
                pdb_depth: 14,
                stage1: StageBudget {
                    node_cap: Some(300_000),
                    time_cap: Some(Duration::from_millis(4_000)),
                    depth_cap: Some(18),
                },
                stage2: StageBudget {
                    node_cap: Some(800_000),
                    time_cap: Some(Duration::from_millis(16_000)),
                    depth_cap: Some(40),
                },
                fallback: StageBudget {
                    node_cap: Some(200_000),
                    time_cap: None,
                    depth_cap: Some(40),
                },
                race_threads: 1,
            },
            five: SizePlan {
                locked_prefix: 12,
                pdb_depth: 16,
                stage1: StageBudget {
                    node_cap: Some(250_000),
                    time_cap: Some(Duration::from_millis(3_000)),
                    depth_cap: Some(25),
                },
                stage2: StageBudget {
                    node_cap: Some(400_000),
                    time_cap: Some(Duration::from_millis(9_000)),
                    depth_cap: Some(60),
                },
                fallback: StageBudget {
                    node_cap: Some(400_000),
                    time_cap: None,
                    depth_cap: Some(60),
                },
                race_threads: 4,
            },
            hybrid_fallback: true,
        }
    }

    /// The historical conservative variant: tighter caps, shallower pattern
    /// databases, no threaded race and no dispatcher fallback.
    pub fn legacy() -> Self {
        let mut config = Self::standard();
        config.four.pdb_depth = 10;
        config.four.stage1.node_cap = Some(150_000);
        config.four.stage2.node_cap = Some(400_000);
        config.five.pdb_depth = 12;
        config.five.stage1.node_cap = Some(120_000);
        config.five.stage2.node_cap = Some(200_000);
        config.five.race_threads = 1;
        config.hybrid_fallback = false;
        config
    }

    /// The historical generous variant: larger caps and deeper pattern
    /// databases, for callers willing to wait.
    pub fn aggressive() -> Self {
        let mut config = Self::standard();
        config.four.pdb_depth = 16;
        config.four.stage1.node_cap = Some(600_000);
        config.four.stage2.node_cap = Some(2_000_000);
        config.four.stage2.time_cap = Some(Duration::from_millis(30_000));
        config.five.pdb_depth = 18;
        config.five.stage1.node_cap = Some(500_000);
        config.five.stage2.node_cap = Some(1_000_000);
        config.five.stage2.time_cap = Some(Duration::from_millis(20_000));
        config
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Which phase of a staged solve gave up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StagePhase {
    Locking,
    Final,
}

/// Long-lived solver instance. Owns the configuration and the lazily built
/// pattern databases, one per (size, locked prefix).
pub struct Engine {
    config: EngineConfig,
    pdbs: HashMap<(usize, usize), Arc<PatternDb>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            config,
            pdbs: HashMap::new(),
        }
    }

    /// Full request-to-response flow: validation, already-solved and
    /// solvability short-circuits, then the staged path for 4x4/5x5 or the
    /// hybrid dispatcher for 3x3.
    pub fn solve(&mut self, request: &SolveRequest) -> SolveResponse {
        let state = match PuzzleState::from_tiles(request.tiles.clone(), request.size) {
            Ok(state) => state,
            Err(reason) => {
                log::warn!("rejected request: {}", reason);
                return SolveResponse::failure("invalid_input");
            }
        };
        if state.is_solved() {
            return SolveResponse::success(Vec::new(), "already_solved");
        }
        if !state.is_solvable() {
            log::info!("{}x{} board has unreachable parity", state.size(), state.size());
            return SolveResponse::failure("unsolvable");
        }
        match state.size() {
            3 => self.dispatch(&state, request.mode),
            _ => self.solve_large(&state, request.mode),
        }
    }

    fn dispatch(&self, state: &PuzzleState, mode: SolveMode) -> SolveResponse {
        let limits = dispatch::limits_for(state.size());
        let (moves, trace) = match mode {
            SolveMode::HybridSequential => dispatch::run_sequential(state, &limits),
            SolveMode::HybridAll => dispatch::run_parallel(state, &limits),
        };
        let method = match mode {
            SolveMode::HybridSequential => "hybrid-multi",
            SolveMode::HybridAll => "hybrid-all",
        };
        match moves {
            Some(moves) => SolveResponse::success(moves, method).with_trace(trace),
            None => SolveResponse::failure(method).with_trace(trace),
        }
    }

    fn solve_large(&mut self, state: &PuzzleState, mode: SolveMode) -> SolveResponse {
        let n = state.size();
        match self.solve_staged(state) {
            Ok((moves, method)) => SolveResponse::success(moves, &method),
            Err(phase) => {
                let fail_tag = match phase {
                    StagePhase::Locking => format!("{}x{}_stage1_fail", n, n),
                    StagePhase::Final => format!("{}x{}_stage2_fail", n, n),
                };
                if self.config.hybrid_fallback {
                    log::warn!("staged solve failed ({}), trying the dispatcher", fail_tag);
                    let response = self.dispatch(state, mode);
                    if response.moves.is_some() {
                        return response;
                    }
                    let mut failed = SolveResponse::failure(&fail_tag);
                    failed.trace = response.trace;
                    return failed;
                }
                SolveResponse::failure(&fail_tag)
            }
        }
    }

    /// Runs the full decomposition. On success returns the concatenated move
    /// list and the method tag of the final phase that produced it.
    fn solve_staged(&mut self, start: &PuzzleState) -> Result<(Vec<u8>, String), StagePhase> {
        let n = start.size();
        let plan = match n {
            4 => self.config.four.clone(),
            _ => self.config.five.clone(),
        };
        let mut current = start.clone();
        let mut moves: Vec<u8> = Vec::new();
        let mut locked: HashSet<usize> = HashSet::new();

        for i in 0..plan.locked_prefix {
            if current.prefix_placed(i + 1) {
                locked.insert(i);
                continue;
            }
            let stage_moves = self.lock_one(&current, &locked, i, &plan).map_err(|e| {
                log::warn!("{}x{} locking stage {} failed: {}", n, n, i, e);
                StagePhase::Locking
            })?;
            apply_all(&mut current, &stage_moves);
            moves.extend(stage_moves);
            locked.insert(i);
        }
        debug_assert!(current.prefix_placed(plan.locked_prefix));

        match self.finish(&current, &locked, &plan) {
            Ok((tail, tag)) => {
                moves.extend(tail);
                Ok((moves, format!("{}x{}_{}", n, n, tag)))
            }
            Err(e) => {
                log::warn!("{}x{} final stage failed: {}", n, n, e);
                Err(StagePhase::Final)
            }
        }
    }

    /// One locking sub-search: place the tile for goal position `i` without
    /// disturbing positions `0..i`. The last locking stage uses the pattern
    /// database for the full prefix; earlier stages use the prefix-restricted
    /// Manhattan sum.
    fn lock_one(
        &mut self,
        current: &PuzzleState,
        locked: &HashSet<usize>,
        i: usize,
        plan: &SizePlan,
    ) -> Result<Vec<u8>, SearchError> {
        let n = current.size();
        let prefix = i + 1;
        let goal = move |s: &PuzzleState| s.prefix_placed(prefix);
        let goal: &GoalFn = &goal;
        let limits = plan.stage1.limits();
        if prefix == plan.locked_prefix {
            let pdb = Arc::clone(
                self.pdbs
                    .entry((n, prefix))
                    .or_insert_with(|| Arc::new(PatternDb::build(n, prefix, plan.pdb_depth))),
            );
            let h = move |s: &PuzzleState| pdb.heuristic(s);
            let h: &HeuristicFn = &h;
            run_stage1(h, goal, locked, limits, current)
        } else {
            let h = move |s: &PuzzleState| heuristics::manhattan_targets(s, prefix);
            let h: &HeuristicFn = &h;
            run_stage1(h, goal, locked, limits, current)
        }
    }

    /// The final free sub-board search: IDA* (raced across threads for 5x5),
    /// then bidirectional BFS as the fallback.
    fn finish(
        &mut self,
        current: &PuzzleState,
        locked: &HashSet<usize>,
        plan: &SizePlan,
    ) -> Result<(Vec<u8>, &'static str), SearchError> {
        let ida = if plan.race_threads > 1 {
            race_ida(current, locked, plan)
        } else {
            let h: &HeuristicFn = &heuristics::manhattan_with_conflicts;
            let goal: &GoalFn = &|s: &PuzzleState| s.is_solved();
            let mut search = Search::new(h, goal);
            search.locked = Some(locked);
            search.limits = plan.stage2.limits();
            solver::run(Algorithm::IdaStar, &search, current)
        };
        match ida {
            Ok(moves) => return Ok((moves, "stage2_ida")),
            Err(e) => log::info!("stage2 ida gave up ({}), falling back to bibfs", e),
        }
        let h: &HeuristicFn = &heuristics::manhattan;
        let goal: &GoalFn = &|s: &PuzzleState| s.is_solved();
        let mut search = Search::new(h, goal);
        search.locked = Some(locked);
        search.limits = plan.fallback.limits();
        let moves = solver::run(Algorithm::Bibfs, &search, current)?;
        Ok((moves, "stage2_bibfs"))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

fn run_stage1(
    h: &HeuristicFn,
    goal: &GoalFn,
    locked: &HashSet<usize>,
    limits: Limits,
    current: &PuzzleState,
) -> Result<Vec<u8>, SearchError> {
    let mut search = Search::new(h, goal);
    search.locked = Some(locked);
    search.limits = limits;
    search.symmetry = true;
    solver::run(Algorithm::IdaStar, &search, current)
}

/// Races several stage-2 IDA* variants, each on its own thread with its own
/// heuristic weighting. The first success flips the shared found flag so the
/// losers stand down at their next expansion; their results are discarded.
fn race_ida(
    current: &PuzzleState,
    locked: &HashSet<usize>,
    plan: &SizePlan,
) -> Result<Vec<u8>, SearchError> {
    let found = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel();
    let mut handles = Vec::with_capacity(plan.race_threads);
    for k in 0..plan.race_threads {
        let tx = tx.clone();
        let found = Arc::clone(&found);
        let start = current.clone();
        let locked = locked.clone();
        let limits = plan.stage2.limits();
        handles.push(thread::spawn(move || {
            // Thread 0 searches with the strongest admissible estimate; the
            // others run increasingly greedy weighted variants so the racers
            // explore genuinely different orderings.
            let weight = k as u32;
            let h = move |s: &PuzzleState| {
                if weight == 0 {
                    heuristics::manhattan_with_conflicts(s)
                } else {
                    heuristics::manhattan(s) * (weight + 1)
                }
            };
            let h: &HeuristicFn = &h;
            let goal: &GoalFn = &|s: &PuzzleState| s.is_solved();
            let mut search = Search::new(h, goal);
            search.locked = Some(&locked);
            search.limits = limits;
            search.found = Some(Arc::clone(&found));
            let result = solver::run(Algorithm::IdaStar, &search, &start);
            if result.is_ok() {
                found.store(true, std::sync::atomic::Ordering::Relaxed);
            }
            let _ = tx.send((k, result));
        }));
    }
    drop(tx);
    let mut winner: Option<Vec<u8>> = None;
    let mut last_err = SearchError::Exhausted;
    for (k, result) in rx {
        match result {
            Ok(moves) if winner.is_none() => {
                log::debug!("stage2 racer {} won with {} moves", k, moves.len());
                winner = Some(moves);
            }
            Ok(_) => {}
            Err(e) => last_err = e,
        }
    }
    for handle in handles {
        let _ = handle.join();
    }
    winner.ok_or(last_err)
}

fn apply_all(state: &mut PuzzleState, moves: &[u8]) {
    for &tile in moves {
        let applied = state.apply_move_value(tile);
        debug_assert!(applied, "search produced an illegal move");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(tiles: Vec<u8>, size: usize) -> SolveRequest {
        SolveRequest {
            tiles,
            size,
            mode: SolveMode::HybridSequential,
        }
    }

    #[test]
    fn test_already_solved_short_circuit() {
        let mut engine = Engine::default();
        let response = engine.solve(&request(vec![1, 2, 3, 4, 5, 6, 7, 8, 0], 3));
        assert_eq!(response.method, "already_solved");
        assert_eq!(response.moves, Some(Vec::new()));
    }

    #[test]
    fn test_invalid_input_rejected_before_search() {
        let mut engine = Engine::default();
        for size in 3..=5 {
            let cells = size * size;
            // Duplicate first tile, missing the last one.
            let mut tiles: Vec<u8> = (0..cells as u8).collect();
            tiles[cells - 1] = tiles[0];
            let response = engine.solve(&request(tiles, size));
            assert_eq!(response.method, "invalid_input");
            assert_eq!(response.moves, None);
        }
    }

    #[test]
    fn test_unsolvable_parity_fails_fast() {
        // Goal with the first two tiles swapped: odd permutation, unreachable.
        let mut engine = Engine::default();
        let response = engine.solve(&request(vec![2, 1, 3, 4, 5, 6, 7, 8, 0], 3));
        assert_eq!(response.method, "unsolvable");
        assert_eq!(response.moves, None);
    }

    #[test]
    fn test_3x3_solve_replays_to_goal() {
        let mut engine = Engine::default();
        let start = PuzzleState::solved(3).scramble(25, 1);
        let response = engine.solve(&request(start.key().to_vec(), 3));
        assert_eq!(response.method, "hybrid-multi");
        let moves = response.moves.expect("scrambled 3x3 must be solvable");
        let mut replay = start;
        for &tile in &moves {
            assert!(replay.apply_move_value(tile));
        }
        assert!(replay.is_solved());
    }

    #[test]
    fn test_4x4_staged_solve_keeps_locked_tiles_placed() {
        let mut engine = Engine::new(EngineConfig::standard());
        let start = PuzzleState::solved(4).scramble(30, 77);
        let response = engine.solve(&request(start.key().to_vec(), 4));
        let moves = response.moves.expect("light 4x4 scramble must solve");
        assert!(response.method.starts_with("4x4_stage2") || response.method.starts_with("hybrid"));

        // Replay. On the staged path, once the locking prefix is fully
        // placed it must never be disturbed again.
        let staged = response.method.starts_with("4x4_stage2");
        let prefix = engine.config.four.locked_prefix;
        let mut replay = start;
        let mut prefix_placed = false;
        for &tile in &moves {
            assert!(replay.apply_move_value(tile));
            if prefix_placed && staged {
                assert!(replay.prefix_placed(prefix), "a locked tile was disturbed");
            }
            prefix_placed |= replay.prefix_placed(prefix);
        }
        assert!(replay.is_solved());
    }

    #[test]
    fn test_pdb_locking_stage_places_prefix_and_caches_db() {
        let mut engine = Engine::new(EngineConfig::standard());
        let plan = engine.config.four.clone();
        // Displace only the last prefix tile: walk the empty up to position 5.
        let mut start = PuzzleState::solved(4);
        for tile in [12, 8, 7, 6] {
            assert!(start.apply_move_value(tile));
        }
        assert!(start.prefix_placed(5));
        assert!(!start.prefix_placed(6));

        let locked: HashSet<usize> = (0..5).collect();
        let moves = engine
            .lock_one(&start, &locked, 5, &plan)
            .expect("final locking stage must place the prefix");
        let mut replay = start.clone();
        for &tile in &moves {
            assert!(replay.apply_move_value(tile));
        }
        assert!(replay.prefix_placed(plan.locked_prefix));

        // The database is built once and reused on later stage runs.
        assert_eq!(engine.pdbs.len(), 1);
        let handle = Arc::clone(engine.pdbs.values().next().unwrap());
        engine
            .lock_one(&start, &locked, 5, &plan)
            .expect("cached database must serve the same stage");
        assert!(Arc::ptr_eq(&handle, engine.pdbs.values().next().unwrap()));
    }

    #[test]
    fn test_presets_differ() {
        let standard = EngineConfig::standard();
        let legacy = EngineConfig::legacy();
        let aggressive = EngineConfig::aggressive();
        assert!(legacy.four.pdb_depth < standard.four.pdb_depth);
        assert!(aggressive.four.pdb_depth > standard.four.pdb_depth);
        assert!(!legacy.hybrid_fallback);
        assert_eq!(legacy.five.race_threads, 1);
    }
}
