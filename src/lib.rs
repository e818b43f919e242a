//! # N-Puzzle Solver Library
//!
//! This library is a solver engine for the sliding-tile puzzle (boards 3x3
//! through 5x5): given a scrambled tile arrangement it computes a sequence
//! of tile moves reaching the canonical solved arrangement.
//!
//! It is used by three binaries:
//! - `solve`: Reads a board, runs the engine, prints the move list or a
//!   JSON response.
//! - `scramble`: Emits reproducible solvable scrambles.
//! - `benchmark`: Runs every search strategy over seeded scrambles and
//!   reports solve rates and solution lengths.
//!
//! ## Modules
//! - `engine`: The board representation (`PuzzleState`), move application,
//!   neighbor generation, validation, parity solvability and scrambling.
//! - `heuristics`: Distance estimators (Manhattan, misplaced tiles, linear
//!   conflicts) and the bounded pattern database.
//! - `solver`: The seventeen interchangeable search strategies and their
//!   shared primitives.
//! - `stages`: The staged 4x4/5x5 decomposition and the `Engine`
//!   request/response entry point.
//! - `dispatch`: The hybrid dispatcher (sequential and racing modes).
//! - `worker`: The background-solve message boundary.
//! - `error`: The failure taxonomy.
//! - `utils`: Board parsing and formatting helpers.

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod heuristics;
pub mod solver;
pub mod stages;
pub mod utils;
pub mod worker;

// Public items are accessed via their module path, e.g.
// `npuzzle_solver::stages::Engine`. This keeps the top-level namespace
// cleaner.
