//! Shared search data structures.
//!
//! - [`OpenEntry`]: a priority-queue element whose ordering turns
//!   `std::collections::BinaryHeap` into a deterministic min-heap: entries
//!   order by score first and by insertion sequence second, so equal-score
//!   pops always come out in insertion order and runs are reproducible.
//! - [`BoundedLru`]: a fixed-capacity recency set with least-recently-used
//!   eviction, used as the size-limited closed set of memory-bounded A* and
//!   as the tabu list.
//! - [`SymmetryTable`]: a duplicate-pruning table that recognizes all 8
//!   rotations/reflections of an expanded state, catching symmetric
//!   duplicates a literal-key visited set would miss.
//!
//! The FIFO needs of BFS and friends are served directly by
//! `std::collections::VecDeque`; it already gives amortized O(1) push-back
//! and pop-front.

use crate::engine::PuzzleState;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

/// One frontier element of a best-first search.
///
/// `score` is the ordering key (`g + h` for A*, `g` for Dijkstra, `h` for
/// greedy); `seq` is the insertion counter that breaks ties.
#[derive(Clone, Debug)]
pub struct OpenEntry {
    pub score: u32,
    pub seq: u64,
    pub g: u32,
    pub state: PuzzleState,
    pub moves: Vec<u8>,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.seq == other.seq
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reversed comparison so `BinaryHeap` pops the smallest `(score, seq)`.
impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Fixed-capacity set of state keys with least-recently-used eviction.
///
/// Insertion and membership refresh recency. Eviction is amortized O(1):
/// stale queue entries (superseded by a later touch of the same key) are
/// skipped lazily when they reach the front.
pub struct BoundedLru {
    capacity: usize,
    stamp: u64,
    stamps: HashMap<Vec<u8>, u64>,
    order: VecDeque<(u64, Vec<u8>)>,
}

impl BoundedLru {
    /// Creates an empty set that holds at most `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        BoundedLru {
            capacity: capacity.max(1),
            stamp: 0,
            stamps: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    /// Whether the set holds no keys.
    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    /// Whether `key` is present, refreshing its recency when it is.
    pub fn touch(&mut self, key: &[u8]) -> bool {
        if self.stamps.contains_key(key) {
            self.stamp += 1;
            self.stamps.insert(key.to_vec(), self.stamp);
            self.order.push_back((self.stamp, key.to_vec()));
            true
        } else {
            false
        }
    }

    /// Membership test without touching recency.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.stamps.contains_key(key)
    }

    /// Inserts `key` as most recently used, evicting the least recently
    /// used key when the set is full.
    pub fn insert(&mut self, key: &[u8]) {
        if self.touch(key) {
            return;
        }
        if self.stamps.len() == self.capacity {
            self.evict_one();
        }
        self.stamp += 1;
        self.stamps.insert(key.to_vec(), self.stamp);
        self.order.push_back((self.stamp, key.to_vec()));
    }

    fn evict_one(&mut self) {
        while let Some((stamp, key)) = self.order.pop_front() {
            if self.stamps.get(&key) == Some(&stamp) {
                self.stamps.remove(&key);
                return;
            }
            // Stale entry: the key was touched again later.
        }
    }
}

/// Duplicate-pruning table aware of the dihedral symmetries of the board.
///
/// Expanded states are recorded by their literal key; a candidate is
/// considered seen when any of the 8 rotations/reflections of its tile grid
/// matches a recorded key. Because the symmetry group is closed, checking
/// the 8 variants of the query against literal inserts is equivalent to
/// inserting all 8 variants and checking the literal query.
pub struct SymmetryTable {
    size: usize,
    keys: HashSet<Vec<u8>>,
}

impl SymmetryTable {
    /// Creates an empty table for boards of side `size`.
    pub fn new(size: usize) -> Self {
        SymmetryTable {
            size,
            keys: HashSet::new(),
        }
    }

    /// Number of recorded states.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no states are recorded.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Forgets all recorded states (reused between IDA* threshold passes).
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Records an expanded state.
    pub fn insert(&mut self, state: &PuzzleState) {
        self.keys.insert(state.key().to_vec());
    }

    /// Whether `state` or any of its 8 symmetric variants was recorded.
    pub fn seen_symmetric(&self, state: &PuzzleState) -> bool {
        all_symmetries(state.key(), self.size)
            .iter()
            .any(|variant| self.keys.contains(variant))
    }
}

fn rotate90(tiles: &[u8], size: usize) -> Vec<u8> {
    let mut out = vec![0u8; size * size];
    for r in 0..size {
        for c in 0..size {
            out[c * size + (size - 1 - r)] = tiles[r * size + c];
        }
    }
    out
}

fn reflect_h(tiles: &[u8], size: usize) -> Vec<u8> {
    let mut out = vec![0u8; size * size];
    for r in 0..size {
        for c in 0..size {
            out[r * size + (size - 1 - c)] = tiles[r * size + c];
        }
    }
    out
}

/// The 8 rotations/reflections of a tile grid, identity first.
pub fn all_symmetries(tiles: &[u8], size: usize) -> Vec<Vec<u8>> {
    let r90 = rotate90(tiles, size);
    let r180 = rotate90(&r90, size);
    let r270 = rotate90(&r180, size);
    vec![
        tiles.to_vec(),
        reflect_h(tiles, size),
        reflect_h(&r90, size),
        reflect_h(&r180, size),
        reflect_h(&r270, size),
        r90,
        r180,
        r270,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn test_open_entry_pops_smallest_score() {
        let state = PuzzleState::solved(3);
        let mut heap = BinaryHeap::new();
        for (score, seq) in [(5u32, 0u64), (2, 1), (7, 2), (2, 3)] {
            heap.push(OpenEntry {
                score,
                seq,
                g: 0,
                state: state.clone(),
                moves: Vec::new(),
            });
        }
        let order: Vec<(u32, u64)> = std::iter::from_fn(|| heap.pop())
            .map(|e| (e.score, e.seq))
            .collect();
        // Equal scores come out in insertion order.
        assert_eq!(order, vec![(2, 1), (2, 3), (5, 0), (7, 2)]);
    }

    #[test]
    fn test_bounded_lru_evicts_least_recently_used() {
        let mut lru = BoundedLru::new(2);
        lru.insert(b"a");
        lru.insert(b"b");
        assert!(lru.contains(b"a"));
        // Touch "a" so "b" becomes the eviction victim.
        assert!(lru.touch(b"a"));
        lru.insert(b"c");
        assert!(lru.contains(b"a"));
        assert!(!lru.contains(b"b"));
        assert!(lru.contains(b"c"));
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_bounded_lru_reinsert_refreshes() {
        let mut lru = BoundedLru::new(2);
        lru.insert(b"a");
        lru.insert(b"b");
        lru.insert(b"a"); // refresh, not duplicate
        assert_eq!(lru.len(), 2);
        lru.insert(b"c");
        assert!(!lru.contains(b"b"));
        assert!(lru.contains(b"a"));
    }

    #[test]
    fn test_symmetries_count_and_identity() {
        let tiles: Vec<u8> = (0..9).collect();
        let syms = all_symmetries(&tiles, 3);
        assert_eq!(syms.len(), 8);
        assert_eq!(syms[0], tiles);
        // Rotating four times returns to the identity.
        let r = rotate90(&tiles, 3);
        let r = rotate90(&r, 3);
        let r = rotate90(&r, 3);
        let r = rotate90(&r, 3);
        assert_eq!(r, tiles);
    }

    #[test]
    fn test_symmetry_table_detects_rotated_duplicate() {
        let state = PuzzleState::from_tiles(vec![1, 2, 3, 4, 5, 6, 7, 8, 0], 3).unwrap();
        let mut table = SymmetryTable::new(3);
        table.insert(&state);

        // Build the 90-degree rotation of the same grid as a state.
        let rotated_tiles = rotate90(state.key(), 3);
        let rotated = PuzzleState::from_tiles(rotated_tiles, 3).unwrap();
        assert!(table.seen_symmetric(&rotated));

        let unrelated = PuzzleState::from_tiles(vec![1, 2, 3, 4, 5, 6, 8, 7, 0], 3).unwrap();
        assert!(!table.seen_symmetric(&unrelated));
    }

    #[test]
    fn test_symmetry_table_clear() {
        let state = PuzzleState::solved(3);
        let mut table = SymmetryTable::new(3);
        table.insert(&state);
        assert!(!table.is_empty());
        table.clear();
        assert!(table.is_empty());
        assert!(!table.seen_symmetric(&state));
    }
}
