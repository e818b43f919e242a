//! Text parsing and formatting helpers for boards.

use crate::engine::PuzzleState;

/// Parses a tile list from text. Accepts comma and/or whitespace separated
/// integers, so `"1,2,3 4"` and `"1 2 3 4"` both work.
///
/// # Arguments
/// * `text` - The raw tile list, e.g. `"1,2,3,4,5,6,7,8,0"`.
///
/// # Returns
/// The tile values in order, or a description of the first bad token.
pub fn tiles_from_str(text: &str) -> Result<Vec<u8>, String> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<u8>()
                .map_err(|_| format!("invalid tile value '{}'", token))
        })
        .collect()
}

/// Infers the board side length from a tile count.
///
/// # Returns
/// `n` such that `tiles.len() == n * n` with `n` in 3..=5, or an error
/// naming the actual count.
pub fn size_from_len(len: usize) -> Result<usize, String> {
    (3..=5usize)
        .find(|n| n * n == len)
        .ok_or_else(|| format!("tile count {} is not a square board of side 3 to 5", len))
}

/// Renders a state as an aligned grid, one row per line, with the empty cell
/// shown as `.`.
pub fn format_board(state: &PuzzleState) -> String {
    let n = state.size();
    let mut out = String::new();
    for row in 0..n {
        for col in 0..n {
            let tile = state.tile_at(row * n + col);
            if col > 0 {
                out.push(' ');
            }
            if tile == 0 {
                out.push_str(" .");
            } else {
                out.push_str(&format!("{:2}", tile));
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiles_from_str_accepts_commas_and_spaces() {
        assert_eq!(
            tiles_from_str("1,2,3 4\n5,6,7,8,0").unwrap(),
            vec![1, 2, 3, 4, 5, 6, 7, 8, 0]
        );
    }

    #[test]
    fn test_tiles_from_str_reports_bad_token() {
        let err = tiles_from_str("1,2,x").unwrap_err();
        assert!(err.contains("'x'"));
    }

    #[test]
    fn test_size_from_len() {
        assert_eq!(size_from_len(9).unwrap(), 3);
        assert_eq!(size_from_len(16).unwrap(), 4);
        assert_eq!(size_from_len(25).unwrap(), 5);
        assert!(size_from_len(10).is_err());
        assert!(size_from_len(36).is_err());
    }

    #[test]
    fn test_format_board_marks_empty() {
        let board = format_board(&PuzzleState::solved(3));
        assert!(board.contains('.'));
        assert_eq!(board.lines().count(), 3);
    }
}
