//! Error taxonomy for the solver engine.
//!
//! Two families exist:
//! - [`InvalidInput`]: the request itself is malformed. Checked once, before
//!   any search work begins, and reported back to the caller as an
//!   `invalid_input` response.
//! - [`SearchError`]: a single algorithm attempt ended without a solution.
//!   These never escape the dispatcher; they only show up in per-attempt
//!   traces and logs.

use thiserror::Error;

/// Rejection reasons for a solve request, produced by tile-array validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    /// The requested board side length is outside the supported 3..=5 range.
    #[error("board size {0} is outside the supported range 3..=5")]
    UnsupportedSize(usize),

    /// The tile array length does not match `size * size`.
    #[error("expected {expected} tiles for the requested size, found {found}")]
    WrongTileCount { expected: usize, found: usize },

    /// The tile array is not a permutation of `0..n*n`
    /// (a value repeated, missing, or out of range).
    #[error("tiles are not a permutation of 0..{0}")]
    NotAPermutation(usize),
}

/// Why a single search attempt stopped without producing a move list.
///
/// Every algorithm returns one of these instead of panicking or blocking:
/// resource expiry is an ordinary, expected outcome under the budgets the
/// dispatcher and stage controller hand out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The node-expansion cap was reached.
    #[error("node expansion cap exceeded")]
    NodeCapExceeded,

    /// The wall-clock budget expired.
    #[error("wall-clock time limit expired")]
    TimedOut,

    /// The search space reachable under the configured bounds was exhausted
    /// without reaching the goal. For complete algorithms on a solvable
    /// input this means the bounds were too tight; for local searches it
    /// covers "stuck at a local optimum" as well.
    #[error("search exhausted without reaching the goal")]
    Exhausted,

    /// Another racing worker already reported success, so this run stood
    /// down cooperatively.
    #[error("abandoned after a sibling search succeeded")]
    Abandoned,
}
