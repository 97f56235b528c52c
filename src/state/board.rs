//! Board and cell state.
//!
//! A board is created once per game with a fixed letter on every cell. The
//! only thing that ever changes afterwards is a cell's owner, which moves
//! from unclaimed to one side and then stays put.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::topology::{all_positions, Position, Side, CELL_COUNT, COLS, ROWS};

/// Compact owner-only view of a board.
///
/// This is `Copy`, so path searches can work on private hypothetical
/// copies without touching the real board.
pub type OwnerGrid = [[Option<Side>; COLS]; ROWS];

/// A single board cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub letter: char,
    pub owner: Option<Side>,
    /// Game revision at which this cell last changed. Zero until claimed.
    pub version: u64,
    pub claimed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Cell {
    pub fn new(pos: Position, letter: char) -> Self {
        Self {
            row: pos.row,
            col: pos.col,
            letter: letter.to_ascii_uppercase(),
            owner: None,
            version: 0,
            claimed_at: None,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.row, self.col)
    }

    pub fn is_claimed(&self) -> bool {
        self.owner.is_some()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "row": self.row,
            "col": self.col,
            "letter": self.letter.to_string(),
            "version": self.version
        });
        if let Some(owner) = &self.owner {
            obj["owner"] = serde_json::json!(owner.as_str());
        }
        obj
    }
}

/// Board construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("expected {expected} letters, got {got}")]
    WrongLetterCount { expected: usize, got: usize },

    #[error("expected {expected} cells, got {got}")]
    WrongCellCount { expected: usize, got: usize },

    #[error("letter '{0}' is not alphabetic")]
    InvalidLetter(char),

    #[error("cell {pos} is out of bounds")]
    OutOfBounds { pos: Position },

    #[error("cell {pos} appears more than once")]
    DuplicateCell { pos: Position },
}

/// The 4x5 game board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Vec<Cell>,
}

impl Board {
    /// Build a board from exactly one letter per cell, in row-major order.
    pub fn from_letters(letters: &[char]) -> Result<Self, BoardError> {
        if letters.len() != CELL_COUNT {
            return Err(BoardError::WrongLetterCount {
                expected: CELL_COUNT,
                got: letters.len(),
            });
        }
        if let Some(&bad) = letters.iter().find(|c| !c.is_ascii_alphabetic()) {
            return Err(BoardError::InvalidLetter(bad));
        }

        let cells = all_positions()
            .zip(letters.iter())
            .map(|(pos, &letter)| Cell::new(pos, letter))
            .collect();
        Ok(Self { cells })
    }

    /// Build a board of distinct random letters.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut alphabet: Vec<char> = ('A'..='Z').collect();
        alphabet.shuffle(rng);
        let cells = all_positions()
            .zip(alphabet)
            .map(|(pos, letter)| Cell::new(pos, letter))
            .collect();
        Self { cells }
    }

    /// Rebuild a board from a full set of cells, as received in a snapshot.
    pub fn from_cells(cells: Vec<Cell>) -> Result<Self, BoardError> {
        if cells.len() != CELL_COUNT {
            return Err(BoardError::WrongCellCount {
                expected: CELL_COUNT,
                got: cells.len(),
            });
        }

        let mut slots: Vec<Option<Cell>> = vec![None; CELL_COUNT];
        for cell in cells {
            let pos = cell.position();
            if !pos.is_valid() {
                return Err(BoardError::OutOfBounds { pos });
            }
            let slot = &mut slots[pos.index()];
            if slot.is_some() {
                return Err(BoardError::DuplicateCell { pos });
            }
            *slot = Some(cell);
        }

        // Right count, all in bounds, no duplicates: every slot is filled.
        let cells = slots.into_iter().flatten().collect();
        Ok(Self { cells })
    }

    /// Get cell at position.
    pub fn get(&self, pos: Position) -> Option<&Cell> {
        if pos.is_valid() {
            self.cells.get(pos.index())
        } else {
            None
        }
    }

    /// Get mutable cell at position.
    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        if pos.is_valid() {
            self.cells.get_mut(pos.index())
        } else {
            None
        }
    }

    /// Owner of the cell at `pos`, `None` when unclaimed or out of bounds.
    pub fn owner(&self, pos: Position) -> Option<Side> {
        self.get(pos).and_then(|c| c.owner)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn unclaimed(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| !c.is_claimed())
    }

    pub fn claimed_count(&self, side: Side) -> usize {
        self.cells.iter().filter(|c| c.owner == Some(side)).count()
    }

    /// Copy out the owner of every cell.
    pub fn owners(&self) -> OwnerGrid {
        let mut grid: OwnerGrid = [[None; COLS]; ROWS];
        for cell in &self.cells {
            grid[cell.row][cell.col] = cell.owner;
        }
        grid
    }

    pub fn to_json(&self) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = self
            .cells
            .chunks(COLS)
            .map(|row| serde_json::Value::Array(row.iter().map(|c| c.to_json()).collect()))
            .collect();
        serde_json::Value::Array(rows)
    }
}
