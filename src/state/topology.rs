//! Board geometry.
//!
//! The board is a 4x5 hex grid laid out in columns. Odd columns are drawn
//! shifted half a cell, so the two diagonal neighbours of a cell depend on
//! the parity of its column.

use serde::{Deserialize, Serialize};

/// Number of board rows.
pub const ROWS: usize = 4;

/// Number of board columns.
pub const COLS: usize = 5;

/// Total number of cells.
pub const CELL_COUNT: usize = ROWS * COLS;

/// One of the two competing sides.
///
/// `A` connects the top edge (row 0) to the bottom edge (row 3).
/// `B` connects the left edge (column 0) to the right edge (column 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "side_a")]
    A,
    #[serde(rename = "side_b")]
    B,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "side_a",
            Self::B => "side_b",
        }
    }

    /// The other side.
    pub fn opponent(&self) -> Side {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Whether the position lies on the edge a path for this side starts from.
    pub fn is_start_edge(&self, pos: Position) -> bool {
        match self {
            Self::A => pos.row == 0,
            Self::B => pos.col == 0,
        }
    }

    /// Whether the position lies on the edge a path for this side must reach.
    pub fn is_finish_edge(&self, pos: Position) -> bool {
        match self {
            Self::A => pos.row == ROWS - 1,
            Self::B => pos.col == COLS - 1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Check if position is valid (within board bounds).
    pub fn is_valid(&self) -> bool {
        self.row < ROWS && self.col < COLS
    }

    /// Check if two positions share a hex edge.
    pub fn is_adjacent_to(&self, other: &Position) -> bool {
        neighbors(*self).contains(other)
    }

    /// Row-major index into a flat cell array.
    pub fn index(&self) -> usize {
        self.row * COLS + self.col
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Offsets shared by every column: left, right, up, down.
const ORTHOGONAL: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// Diagonal offsets for even columns.
const EVEN_DIAGONALS: [(i32, i32); 2] = [(-1, 1), (1, 1)];

/// Diagonal offsets for odd columns.
const ODD_DIAGONALS: [(i32, i32); 2] = [(-1, -1), (1, -1)];

/// Cells sharing an edge with `pos`, clipped to the board.
///
/// Returns at most six positions. The diagonal pair flips between even and
/// odd columns; swapping them silently breaks connectivity.
pub fn neighbors(pos: Position) -> Vec<Position> {
    let diagonals = if pos.col % 2 == 0 {
        EVEN_DIAGONALS
    } else {
        ODD_DIAGONALS
    };

    ORTHOGONAL
        .iter()
        .chain(diagonals.iter())
        .filter_map(|&(dr, dc)| {
            let row = pos.row as i32 + dr;
            let col = pos.col as i32 + dc;
            if row < 0 || col < 0 {
                return None;
            }
            let next = Position::new(row as usize, col as usize);
            next.is_valid().then_some(next)
        })
        .collect()
}

/// Every board position in row-major order.
pub fn all_positions() -> impl Iterator<Item = Position> {
    (0..ROWS).flat_map(|row| (0..COLS).map(move |col| Position::new(row, col)))
}
