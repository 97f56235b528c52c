//! Observer synchronization.
//!
//! An observer attaches with a full [`Snapshot`] and then follows a stream
//! of [`ChangeEvent`]s. Every event carries the whole new value of one
//! entity, so applying it is a replacement, never a merge.
//!
//! Delivery order is only meaningful per cell. A [`GameView`] ignores a
//! cell update whose version is older than what it already holds, which
//! keeps a late `Unclaimed` from overwriting a claim it has already seen.
//!
//! ```text
//!   GameRegistry ──subscribe──▶ (Snapshot, Subscription)
//!        │                          │            │
//!        │ claim / join             ▼            ▼
//!        └──broadcast──▶ ChangeEvent ──apply──▶ GameView
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::board::{Board, BoardError, Cell};
use super::game::{Game, GameInfo, GameStatus, Seats};
use super::hints::{self, Hints};
use super::topology::{Position, Side};
use super::win;

/// A change to one entity of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ChangeEvent {
    CellChanged(Cell),
    SeatsChanged(Seats),
    GameStatusChanged(GameInfo),
}

impl ChangeEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CellChanged(_) => "cell_changed",
            Self::SeatsChanged(_) => "seats_changed",
            Self::GameStatusChanged(_) => "game_status_changed",
        }
    }
}

/// Point-in-time copy of a whole game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub game: GameInfo,
    pub seats: Seats,
    pub cells: Vec<Cell>,
    pub revision: u64,
    pub taken_at: chrono::DateTime<chrono::Utc>,
}

impl Snapshot {
    pub fn of(game: &Game) -> Self {
        Self {
            game: game.info(),
            seats: game.seats().clone(),
            cells: game.board().cells().cloned().collect(),
            revision: game.revision(),
            taken_at: chrono::Utc::now(),
        }
    }
}

/// Synchronization errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// The observer fell behind and events were dropped. Re-fetch a snapshot.
    #[error("observer lagged behind by {0} events; resync required")]
    Lagged(u64),

    /// The game was removed from the registry.
    #[error("event stream closed")]
    Closed,

    #[error("corrupt snapshot: {0}")]
    Corrupt(#[from] BoardError),

    #[error("event for cell {pos} is outside the board")]
    InvalidCell { pos: Position },
}

/// Live event stream for one game.
///
/// Dropping the subscription unsubscribes. The stream cannot be rewound;
/// after [`SyncError::Lagged`] the observer must take a fresh snapshot.
#[derive(Debug)]
pub struct Subscription {
    game_id: String,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub(crate) fn new(game_id: String, receiver: broadcast::Receiver<ChangeEvent>) -> Self {
        Self { game_id, receiver }
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Wait for the next event.
    pub async fn next(&mut self) -> Result<ChangeEvent, SyncError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Lagged(n) => SyncError::Lagged(n),
            broadcast::error::RecvError::Closed => SyncError::Closed,
        })
    }

    /// Take the next event if one is already queued.
    pub fn try_next(&mut self) -> Result<Option<ChangeEvent>, SyncError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Err(SyncError::Lagged(n)),
            Err(broadcast::error::TryRecvError::Closed) => Err(SyncError::Closed),
        }
    }

    /// Drain every queued event.
    pub fn drain(&mut self) -> Result<Vec<ChangeEvent>, SyncError> {
        let mut events = Vec::new();
        while let Some(event) = self.try_next()? {
            events.push(event);
        }
        Ok(events)
    }

    /// Stop receiving events. Dropping the subscription does the same.
    pub fn unsubscribe(self) {
        drop(self.receiver);
    }
}

/// Observer-side replica of one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameView {
    game: GameInfo,
    seats: Seats,
    board: Board,
}

impl GameView {
    /// Build a view from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, SyncError> {
        Ok(Self {
            game: snapshot.game,
            seats: snapshot.seats,
            board: Board::from_cells(snapshot.cells)?,
        })
    }

    /// Replace everything with a fresh snapshot, e.g. after a lag.
    pub fn resync(&mut self, snapshot: Snapshot) -> Result<(), SyncError> {
        *self = Self::from_snapshot(snapshot)?;
        Ok(())
    }

    /// Apply one event.
    ///
    /// Returns `false` when a cell event was older than the local copy and
    /// was skipped.
    pub fn apply(&mut self, event: &ChangeEvent) -> Result<bool, SyncError> {
        match event {
            ChangeEvent::CellChanged(incoming) => {
                let pos = incoming.position();
                let local = self
                    .board
                    .get_mut(pos)
                    .ok_or(SyncError::InvalidCell { pos })?;
                if incoming.version < local.version {
                    return Ok(false);
                }
                *local = incoming.clone();
                Ok(true)
            }
            ChangeEvent::SeatsChanged(seats) => {
                self.seats = seats.clone();
                Ok(true)
            }
            ChangeEvent::GameStatusChanged(info) => {
                self.game = info.clone();
                Ok(true)
            }
        }
    }

    pub fn game(&self) -> &GameInfo {
        &self.game
    }

    pub fn status(&self) -> GameStatus {
        self.game.status
    }

    pub fn winner(&self) -> Option<Side> {
        self.game.winner
    }

    pub fn seats(&self) -> &Seats {
        &self.seats
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn has_path(&self, side: Side) -> bool {
        win::has_path(&self.board, side)
    }

    pub fn one_away(&self, side: Side) -> BTreeSet<Position> {
        hints::one_away(&self.board, side)
    }

    pub fn hints(&self) -> Hints {
        hints::hints(&self.board)
    }

    /// Chain to highlight for the winner's banner.
    pub fn winning_path(&self) -> Option<Vec<Position>> {
        self.game
            .winner
            .and_then(|side| win::winning_path(&self.board, side))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::tests::make_active_game;
    use crate::state::game::ClaimOutcome;
    use pretty_assertions::assert_eq;

    fn claimed_cell(game: &mut Game, row: usize, col: usize, side: Side) -> Cell {
        match game.claim(Position::new(row, col), side, true).unwrap() {
            ClaimOutcome::Claimed { cell, .. } => cell,
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_view_from_snapshot() {
        let mut game = make_active_game();
        claimed_cell(&mut game, 1, 1, Side::A);

        let view = GameView::from_snapshot(Snapshot::of(&game)).unwrap();
        assert_eq!(view.status(), GameStatus::Active);
        assert_eq!(view.board(), game.board());
        assert_eq!(view.seats(), game.seats());
    }

    #[test]
    fn test_apply_cell_change() {
        let mut game = make_active_game();
        let mut view = GameView::from_snapshot(Snapshot::of(&game)).unwrap();

        let cell = claimed_cell(&mut game, 2, 3, Side::B);
        assert!(view.apply(&ChangeEvent::CellChanged(cell)).unwrap());
        assert_eq!(view.board().owner(Position::new(2, 3)), Some(Side::B));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut game = make_active_game();
        let mut view = GameView::from_snapshot(Snapshot::of(&game)).unwrap();

        let event = ChangeEvent::CellChanged(claimed_cell(&mut game, 0, 0, Side::A));
        view.apply(&event).unwrap();
        let once = view.clone();
        view.apply(&event).unwrap();
        assert_eq!(view, once);
    }

    #[test]
    fn test_stale_cell_event_ignored() {
        let game = make_active_game();
        let stale = game.board().get(Position::new(1, 2)).unwrap().clone();

        let mut later = game.clone();
        let claimed = claimed_cell(&mut later, 1, 2, Side::A);

        let mut view = GameView::from_snapshot(Snapshot::of(&game)).unwrap();
        view.apply(&ChangeEvent::CellChanged(claimed)).unwrap();

        // The unclaimed copy shows up late.
        assert!(!view.apply(&ChangeEvent::CellChanged(stale)).unwrap());
        assert_eq!(view.board().owner(Position::new(1, 2)), Some(Side::A));
    }

    #[test]
    fn test_out_of_order_across_cells() {
        let mut game = make_active_game();
        let first = claimed_cell(&mut game, 0, 0, Side::A);
        let second = claimed_cell(&mut game, 0, 1, Side::B);

        let mut view = GameView::from_snapshot(Snapshot::of(&make_active_game())).unwrap();
        assert!(view.apply(&ChangeEvent::CellChanged(second)).unwrap());
        assert!(view.apply(&ChangeEvent::CellChanged(first)).unwrap());
        assert_eq!(view.board().owner(Position::new(0, 0)), Some(Side::A));
        assert_eq!(view.board().owner(Position::new(0, 1)), Some(Side::B));
    }

    #[test]
    fn test_invalid_cell_event() {
        let game = make_active_game();
        let mut view = GameView::from_snapshot(Snapshot::of(&game)).unwrap();
        let mut bogus = game.board().get(Position::new(0, 0)).unwrap().clone();
        bogus.row = 9;
        assert_eq!(
            view.apply(&ChangeEvent::CellChanged(bogus)),
            Err(SyncError::InvalidCell {
                pos: Position::new(9, 0)
            })
        );
    }

    #[test]
    fn test_status_and_seats_replace() {
        let mut game = make_active_game();
        let mut view = GameView::from_snapshot(Snapshot::of(&game)).unwrap();

        let mut cells = Vec::new();
        for row in 0..4 {
            cells.push(claimed_cell(&mut game, row, 0, Side::A));
        }
        for cell in cells {
            view.apply(&ChangeEvent::CellChanged(cell)).unwrap();
        }
        view.apply(&ChangeEvent::GameStatusChanged(game.info()))
            .unwrap();
        view.apply(&ChangeEvent::SeatsChanged(Seats::default()))
            .unwrap();

        assert_eq!(view.status(), GameStatus::Finished);
        assert_eq!(view.winner(), Some(Side::A));
        assert!(view.has_path(Side::A));
        assert_eq!(view.seats().bound_count(), 0);

        let path = view.winning_path().unwrap();
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_view_hints_match_engine() {
        let mut game = make_active_game();
        for row in [0, 1, 3] {
            claimed_cell(&mut game, row, 0, Side::A);
        }
        let view = GameView::from_snapshot(Snapshot::of(&game)).unwrap();
        assert_eq!(
            view.one_away(Side::A),
            hints::one_away(game.board(), Side::A)
        );
        assert!(view.hints().side_a.contains(&Position::new(2, 0)));
    }

    #[test]
    fn test_corrupt_snapshot() {
        let game = make_active_game();
        let mut snapshot = Snapshot::of(&game);
        snapshot.cells.pop();
        assert!(matches!(
            GameView::from_snapshot(snapshot),
            Err(SyncError::Corrupt(BoardError::WrongCellCount { .. }))
        ));
    }

    #[test]
    fn test_event_json_shape() {
        let game = make_active_game();
        let event = ChangeEvent::GameStatusChanged(game.info());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "game_status_changed");
        assert_eq!(json["data"]["status"], "active");
        assert_eq!(event.kind(), "game_status_changed");

        let back: ChangeEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
