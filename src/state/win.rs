//! Win detection.
//!
//! A side wins once its cells form a chain from its start edge to its
//! finish edge. The search works on an [`OwnerGrid`] so callers can ask
//! about hypothetical boards without touching real state.

use std::collections::VecDeque;

use super::board::{Board, OwnerGrid};
use super::topology::{all_positions, neighbors, Position, Side, COLS, ROWS};

/// Whether `side` has a completed path on `board`.
pub fn has_path(board: &Board, side: Side) -> bool {
    grid_has_path(&board.owners(), side)
}

/// Whether `side` has a completed path on an owner grid.
pub fn grid_has_path(grid: &OwnerGrid, side: Side) -> bool {
    search(grid, side).is_some()
}

/// One chain of `side` cells from the start edge to the finish edge, if any.
///
/// The chain is ordered from the start edge outward. Any connecting chain
/// may be returned; it is not guaranteed to be the shortest.
pub fn winning_path(board: &Board, side: Side) -> Option<Vec<Position>> {
    let grid = board.owners();
    let (end, parents) = search(&grid, side)?;

    let mut path = vec![end];
    let mut current = end;
    while let Some(prev) = parents[current.row][current.col] {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    Some(path)
}

type Parents = [[Option<Position>; COLS]; ROWS];

/// Breadth-first search seeded from every owned start-edge cell.
///
/// Returns the first finish-edge cell reached plus the parent links needed
/// to walk back to the start edge.
fn search(grid: &OwnerGrid, side: Side) -> Option<(Position, Parents)> {
    let owned = |pos: Position| grid[pos.row][pos.col] == Some(side);

    let mut visited = [[false; COLS]; ROWS];
    let mut parents: Parents = [[None; COLS]; ROWS];
    let mut queue = VecDeque::new();

    for pos in all_positions().filter(|&p| side.is_start_edge(p) && owned(p)) {
        visited[pos.row][pos.col] = true;
        queue.push_back(pos);
    }

    while let Some(current) = queue.pop_front() {
        if side.is_finish_edge(current) {
            return Some((current, parents));
        }
        for next in neighbors(current) {
            if visited[next.row][next.col] || !owned(next) {
                continue;
            }
            visited[next.row][next.col] = true;
            parents[next.row][next.col] = Some(current);
            queue.push_back(next);
        }
    }

    None
}
