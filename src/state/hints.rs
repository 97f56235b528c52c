//! "One away" hints.
//!
//! For every unclaimed cell, copy the owner grid, pretend the side owns
//! that cell, and ask the win detector. The board itself is never written,
//! so any number of observers can compute hints at once.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::board::Board;
use super::topology::{Position, Side};
use super::win::grid_has_path;

/// Unclaimed cells whose claim by `side` would complete its path.
pub fn one_away(board: &Board, side: Side) -> BTreeSet<Position> {
    let owners = board.owners();

    board
        .unclaimed()
        .map(|cell| cell.position())
        .filter(|pos| {
            let mut hypothetical = owners;
            hypothetical[pos.row][pos.col] = Some(side);
            grid_has_path(&hypothetical, side)
        })
        .collect()
}

/// Winning cells for both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hints {
    pub side_a: BTreeSet<Position>,
    pub side_b: BTreeSet<Position>,
}

impl Hints {
    pub fn for_side(&self, side: Side) -> &BTreeSet<Position> {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }

    /// Cells that would win the game for either side.
    pub fn contested(&self) -> impl Iterator<Item = &Position> {
        self.side_a.intersection(&self.side_b)
    }
}

/// Compute hints for both sides.
pub fn hints(board: &Board) -> Hints {
    Hints {
        side_a: one_away(board, Side::A),
        side_b: one_away(board, Side::B),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::board::tests::make_board;
    use pretty_assertions::assert_eq;

    fn claim_all(board: &mut Board, side: Side, cells: &[(usize, usize)]) {
        for &(r, c) in cells {
            board.get_mut(Position::new(r, c)).unwrap().owner = Some(side);
        }
    }

    fn positions(cells: &[(usize, usize)]) -> BTreeSet<Position> {
        cells.iter().map(|&(r, c)| Position::new(r, c)).collect()
    }

    #[test]
    fn test_empty_board_has_no_hints() {
        let board = make_board();
        assert!(one_away(&board, Side::A).is_empty());
        assert!(one_away(&board, Side::B).is_empty());
    }

    #[test]
    fn test_single_gap_in_column() {
        let mut board = make_board();
        claim_all(&mut board, Side::A, &[(0, 0), (1, 0), (3, 0)]);

        // (2,1) bridges as well: it is a diagonal of both (1,0) and (3,0).
        let got = one_away(&board, Side::A);
        assert!(got.contains(&Position::new(2, 0)));
        assert!(got.contains(&Position::new(2, 1)));
        assert!(got.iter().all(|p| board.owner(*p).is_none()));
    }

    #[test]
    fn test_exact_hint_set() {
        let mut board = make_board();
        claim_all(&mut board, Side::B, &[(0, 0), (0, 1), (0, 2), (0, 3)]);
        // (0,4) is the only right-edge neighbour of (0,3).
        assert_eq!(one_away(&board, Side::B), positions(&[(0, 4)]));
    }

    #[test]
    fn test_never_includes_claimed_cells() {
        let mut board = make_board();
        claim_all(&mut board, Side::A, &[(0, 2), (1, 2), (3, 2)]);
        claim_all(&mut board, Side::B, &[(2, 2)]);

        let got = one_away(&board, Side::A);
        assert!(!got.contains(&Position::new(2, 2)));
        for pos in &got {
            assert_eq!(board.owner(*pos), None);
        }
        // (2,3) is odd, so its diagonals are (1,2) and (3,2).
        assert!(got.contains(&Position::new(2, 3)));
    }

    #[test]
    fn test_cell_can_be_one_away_for_both_sides() {
        let mut board = make_board();
        claim_all(&mut board, Side::A, &[(0, 2), (1, 2), (3, 2)]);
        claim_all(&mut board, Side::B, &[(2, 0), (2, 1), (2, 3), (2, 4)]);

        let all = hints(&board);
        assert!(all.side_a.contains(&Position::new(2, 2)));
        assert!(all.side_b.contains(&Position::new(2, 2)));
        assert_eq!(
            all.contested().copied().collect::<Vec<_>>(),
            vec![Position::new(2, 2)]
        );
    }

    #[test]
    fn test_board_untouched() {
        let mut board = make_board();
        claim_all(&mut board, Side::A, &[(0, 0), (1, 0), (2, 0)]);
        let before = board.clone();
        let _ = hints(&board);
        assert_eq!(board, before);
    }
}
