//! The 3x3 board and the capture rule.

use knuckle_protocol::BoardGrid;

use crate::{DieFace, PlaceError};

/// Number of rows on a board.
pub const ROWS: usize = 3;

/// Number of cells in a row.
pub const COLUMNS: usize = 3;

/// Where a die landed and how many opposing dice it removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub row: usize,
    pub column: usize,
    pub face: DieFace,
    pub captured: usize,
}

/// One player's grid of placed dice.
///
/// Cells hold `Option<DieFace>`, so a cell is either empty or a face in
/// `1..=6`; the `[0, 6]` range of the wire form holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    cells: [[Option<DieFace>; COLUMNS]; ROWS],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `row` exists and has at least one empty cell.
    pub fn row_has_space(&self, row: usize) -> bool {
        self.cells
            .get(row)
            .is_some_and(|cells| cells.iter().any(Option::is_none))
    }

    /// Places `face` in the leftmost empty cell of `row`, then removes every
    /// die of the same face from the same row of `opponent`.
    ///
    /// The capture never touches this board, so placing a third 4 next to
    /// two 4s just fills the row.
    ///
    /// # Errors
    /// [`PlaceError::RowOutOfRange`] for a row outside `0..3`,
    /// [`PlaceError::RowFull`] if the row has no empty cell. Neither board
    /// is modified on error.
    pub fn place_capturing(
        &mut self,
        opponent: &mut Board,
        row: usize,
        face: DieFace,
    ) -> Result<Placement, PlaceError> {
        let cells = self
            .cells
            .get_mut(row)
            .ok_or(PlaceError::RowOutOfRange(row))?;
        let column = cells
            .iter()
            .position(Option::is_none)
            .ok_or(PlaceError::RowFull(row))?;
        cells[column] = Some(face);

        let captured = opponent.remove_matching(row, face);
        Ok(Placement {
            row,
            column,
            face,
            captured,
        })
    }

    /// Returns the face at `(row, column)`, or `None` if the cell is empty
    /// or out of range.
    pub fn cell(&self, row: usize, column: usize) -> Option<DieFace> {
        self.cells.get(row)?.get(column).copied().flatten()
    }

    /// Returns `true` if no cell holds a die.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(Option::is_none)
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Projects the board to its wire form (`0` for empty).
    pub fn to_grid(&self) -> BoardGrid {
        self.cells
            .map(|row| row.map(|cell| cell.map_or(0, DieFace::value)))
    }

    /// Zeroes every cell in `row` holding `face`. Returns how many were
    /// removed.
    fn remove_matching(&mut self, row: usize, face: DieFace) -> usize {
        let Some(cells) = self.cells.get_mut(row) else {
            return 0;
        };
        let mut removed = 0;
        for cell in cells.iter_mut().filter(|cell| **cell == Some(face)) {
            *cell = None;
            removed += 1;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(value: u8) -> DieFace {
        DieFace::new(value).unwrap()
    }

    /// Builds a board by placing faces row by row against a throwaway
    /// opponent.
    fn board_from(rows: [[u8; 3]; 3]) -> Board {
        let mut board = Board::new();
        let mut scratch = Board::new();
        for (row, values) in rows.iter().enumerate() {
            for value in values.iter().filter(|v| **v != 0) {
                board.place_capturing(&mut scratch, row, face(*value)).unwrap();
            }
        }
        board
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new();
        assert!(board.is_empty());
        assert_eq!(board.to_grid(), [[0; 3]; 3]);
    }

    #[test]
    fn test_place_fills_leftmost_empty_cell() {
        let mut board = Board::new();
        let mut opponent = Board::new();

        let first = board.place_capturing(&mut opponent, 1, face(5)).unwrap();
        let second = board.place_capturing(&mut opponent, 1, face(2)).unwrap();

        assert_eq!(first.column, 0);
        assert_eq!(second.column, 1);
        assert_eq!(board.to_grid()[1], [5, 2, 0]);
    }

    #[test]
    fn test_place_into_full_row_fails_and_leaves_boards_unchanged() {
        let mut board = board_from([[1, 2, 3], [0, 0, 0], [0, 0, 0]]);
        let mut opponent = board_from([[3, 0, 0], [0, 0, 0], [0, 0, 0]]);
        let (board_before, opponent_before) = (board, opponent);

        let result = board.place_capturing(&mut opponent, 0, face(3));

        assert_eq!(result, Err(PlaceError::RowFull(0)));
        assert_eq!(board, board_before);
        assert_eq!(opponent, opponent_before);
        assert!(!board.row_has_space(0));
    }

    #[test]
    fn test_place_out_of_range_row_fails() {
        let mut board = Board::new();
        let mut opponent = Board::new();
        let result = board.place_capturing(&mut opponent, 3, face(1));
        assert_eq!(result, Err(PlaceError::RowOutOfRange(3)));
        assert!(board.is_empty());
    }

    #[test]
    fn test_capture_removes_all_matching_dice_in_opponent_row() {
        let mut board = board_from([[0, 0, 0], [3, 0, 0], [0, 0, 0]]);
        let mut opponent = board_from([[0, 0, 0], [3, 3, 0], [0, 0, 0]]);

        let placement = board.place_capturing(&mut opponent, 1, face(3)).unwrap();

        assert_eq!(placement.captured, 2);
        assert_eq!(board.to_grid()[1], [3, 3, 0]);
        assert_eq!(opponent.to_grid()[1], [0, 0, 0]);
    }

    #[test]
    fn test_capture_only_touches_the_same_row() {
        let mut board = Board::new();
        let mut opponent = board_from([[4, 1, 4], [4, 0, 0], [4, 4, 4]]);

        board.place_capturing(&mut opponent, 0, face(4)).unwrap();

        assert_eq!(opponent.to_grid(), [[0, 1, 0], [4, 0, 0], [4, 4, 4]]);
    }

    #[test]
    fn test_matching_dice_on_own_board_are_kept() {
        let mut board = board_from([[4, 4, 0], [0, 0, 0], [0, 0, 0]]);
        let mut opponent = Board::new();

        let placement = board.place_capturing(&mut opponent, 0, face(4)).unwrap();

        assert_eq!(placement.captured, 0);
        assert_eq!(board.to_grid()[0], [4, 4, 4]);
    }

    #[test]
    fn test_place_after_capture_reuses_leftmost_hole() {
        let mut board = Board::new();
        let mut opponent = board_from([[2, 5, 2], [0, 0, 0], [0, 0, 0]]);
        board.place_capturing(&mut opponent, 0, face(2)).unwrap();
        assert_eq!(opponent.to_grid()[0], [0, 5, 0]);

        let placement = opponent.place_capturing(&mut board, 0, face(6)).unwrap();

        assert_eq!(placement.column, 0);
        assert_eq!(opponent.to_grid()[0], [6, 5, 0]);
    }

    #[test]
    fn test_row_has_space() {
        let board = board_from([[1, 1, 1], [2, 0, 0], [0, 0, 0]]);
        assert!(!board.row_has_space(0));
        assert!(board.row_has_space(1));
        assert!(board.row_has_space(2));
        assert!(!board.row_has_space(7));
    }

    #[test]
    fn test_clear_empties_the_board() {
        let mut board = board_from([[1, 2, 3], [4, 5, 6], [1, 0, 0]]);
        board.clear();
        assert!(board.is_empty());
    }

    #[test]
    fn test_cell_lookup() {
        let board = board_from([[0, 0, 0], [6, 0, 0], [0, 0, 0]]);
        assert_eq!(board.cell(1, 0), Some(face(6)));
        assert_eq!(board.cell(1, 1), None);
        assert_eq!(board.cell(9, 9), None);
    }
}
