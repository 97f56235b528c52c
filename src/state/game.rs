//! Game state management.
//!
//! A game owns its board and its two seats. All mutation goes through
//! [`Game::join`], [`Game::start`] and [`Game::claim`]; the registry calls
//! them while holding the game's lock, which makes each call one
//! indivisible step.

use serde::{Deserialize, Serialize};

use super::board::{Board, Cell};
use super::topology::{Position, Side};
use super::win::has_path;

/// Length of a room code.
pub const ROOM_CODE_LEN: usize = 5;

/// Game state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Waiting for both seats to fill
    #[default]
    Waiting,
    /// Claims are accepted
    Active,
    /// A side completed its path
    Finished,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Finished => "finished",
        }
    }

    /// Check if game is active (can receive claims).
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Check if game is terminal (cannot change).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A participant bound to one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub side: Side,
    /// Opaque identity from the session provider
    pub identity: String,
    pub display_name: String,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl Seat {
    pub fn new(side: Side, identity: String, display_name: String) -> Self {
        Self {
            side,
            identity,
            display_name,
            joined_at: chrono::Utc::now(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "side": self.side.as_str(),
            "identity": self.identity,
            "display_name": self.display_name
        })
    }
}

/// The two seats of a game. A bound seat is never vacated or reassigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seats {
    pub side_a: Option<Seat>,
    pub side_b: Option<Seat>,
}

impl Seats {
    pub fn get(&self, side: Side) -> Option<&Seat> {
        match side {
            Side::A => self.side_a.as_ref(),
            Side::B => self.side_b.as_ref(),
        }
    }

    fn slot_mut(&mut self, side: Side) -> &mut Option<Seat> {
        match side {
            Side::A => &mut self.side_a,
            Side::B => &mut self.side_b,
        }
    }

    /// Check if a participant is bound to `side`.
    pub fn is_bound(&self, side: Side) -> bool {
        self.get(side).is_some()
    }

    pub fn is_full(&self) -> bool {
        self.side_a.is_some() && self.side_b.is_some()
    }

    pub fn bound_count(&self) -> usize {
        usize::from(self.side_a.is_some()) + usize::from(self.side_b.is_some())
    }

    /// Side a participant is seated on.
    pub fn side_of(&self, identity: &str) -> Option<Side> {
        [Side::A, Side::B]
            .into_iter()
            .find(|&side| self.get(side).is_some_and(|s| s.identity == identity))
    }

    /// First unbound side, SideA before SideB.
    pub fn first_free(&self) -> Option<Side> {
        [Side::A, Side::B]
            .into_iter()
            .find(|&side| !self.is_bound(side))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "side_a": self.side_a.as_ref().map(|s| s.to_json()),
            "side_b": self.side_b.as_ref().map(|s| s.to_json())
        })
    }
}

/// Game-level fields carried by status events and snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub id: String,
    pub room_code: String,
    pub status: GameStatus,
    pub winner: Option<Side>,
}

/// Result of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Joined {
    pub side: Side,
    /// False when the identity was already seated
    pub newly_bound: bool,
    /// True when this join moved the game to `Active`
    pub activated: bool,
}

/// Result of an accepted claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Correct answer; the cell now belongs to the claiming side.
    Claimed { cell: Cell, winner: Option<Side> },
    /// Wrong answer; the cell stays open to both sides.
    Missed { pos: Position },
}

impl ClaimOutcome {
    pub fn winner(&self) -> Option<Side> {
        match self {
            Self::Claimed { winner, .. } => *winner,
            Self::Missed { .. } => None,
        }
    }
}

/// Claim rejections. Each carries a stable reason code, see [`ClaimError::code`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    #[error("game is not active (status: {status})")]
    GameNotActive { status: GameStatus },

    #[error("cell ({row}, {col}) is outside the board")]
    InvalidCoordinate { row: usize, col: usize },

    #[error("cell {pos} is already claimed")]
    CellAlreadyClaimed { pos: Position },

    #[error("{side} has no participant in this game")]
    UnknownSeat { side: Side },

    #[error("'{identity}' is not seated in this game")]
    UnknownParticipant { identity: String },

    #[error("game '{0}' not found")]
    GameNotFound(String),

    #[error("game state unavailable: {0}")]
    Unavailable(String),
}

impl ClaimError {
    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::GameNotActive { .. } => "game_not_active",
            Self::InvalidCoordinate { .. } => "invalid_coordinate",
            Self::CellAlreadyClaimed { .. } => "cell_already_claimed",
            Self::UnknownSeat { .. } | Self::UnknownParticipant { .. } => "unknown_seat",
            Self::GameNotFound(_) => "game_not_found",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

/// Seat and lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("invalid game status for this action")]
    InvalidStatus,
    #[error("both seats are taken")]
    GameFull,
    #[error("game has already finished")]
    GameFinished,
    #[error("not enough players to start")]
    NotEnoughPlayers,
    #[error("identity must not be empty")]
    EmptyIdentity,
}

/// Game session state.
#[derive(Debug, Clone)]
pub struct Game {
    /// Unique game ID
    pub id: String,

    /// Uppercase room code
    pub room_code: String,

    status: GameStatus,

    winner: Option<Side>,

    board: Board,

    seats: Seats,

    /// Bumped on every cell write
    revision: u64,

    /// When game was created
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// When game started (status -> Active)
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,

    /// When game ended
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Game {
    /// Create a new game in `Waiting`.
    pub fn new(id: String, room_code: &str, board: Board) -> Self {
        Self {
            id,
            room_code: room_code.to_ascii_uppercase(),
            status: GameStatus::Waiting,
            winner: None,
            board,
            seats: Seats::default(),
            revision: 0,
            created_at: chrono::Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn seats(&self) -> &Seats {
        &self.seats
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn info(&self) -> GameInfo {
        GameInfo {
            id: self.id.clone(),
            room_code: self.room_code.clone(),
            status: self.status,
            winner: self.winner,
        }
    }

    /// Bind a participant to the first free seat.
    ///
    /// Joining again with an identity that already holds a seat returns that
    /// seat unchanged. Filling the second seat activates the game.
    pub fn join(&mut self, identity: &str, display_name: &str) -> Result<Joined, GameError> {
        if identity.is_empty() {
            return Err(GameError::EmptyIdentity);
        }

        if let Some(side) = self.seats.side_of(identity) {
            return Ok(Joined {
                side,
                newly_bound: false,
                activated: false,
            });
        }

        if self.status.is_terminal() {
            return Err(GameError::GameFinished);
        }

        let side = self.seats.first_free().ok_or(GameError::GameFull)?;
        *self.seats.slot_mut(side) = Some(Seat::new(
            side,
            identity.to_string(),
            display_name.to_string(),
        ));

        let activated = self.status == GameStatus::Waiting && self.seats.is_full();
        if activated {
            self.activate();
        }

        Ok(Joined {
            side,
            newly_bound: true,
            activated,
        })
    }

    /// Start before the second seat fills.
    ///
    /// Lets a game with one bound seat go `Active` ahead of the usual
    /// activation on the second join. Claims for the empty side then fail
    /// with `UnknownSeat`.
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.status != GameStatus::Waiting {
            return Err(GameError::InvalidStatus);
        }

        if self.seats.bound_count() == 0 {
            return Err(GameError::NotEnoughPlayers);
        }

        self.activate();
        Ok(())
    }

    fn activate(&mut self) {
        self.status = GameStatus::Active;
        self.started_at = Some(chrono::Utc::now());
    }

    /// Validate and apply one claim.
    ///
    /// Checks run in a fixed order: game status, coordinate, cell owner,
    /// seat. A correct answer takes the cell and, if that completes the
    /// claiming side's path, finishes the game in the same call. A wrong
    /// answer changes nothing.
    pub fn claim(
        &mut self,
        pos: Position,
        side: Side,
        is_correct: bool,
    ) -> Result<ClaimOutcome, ClaimError> {
        self.check_claimable(pos)?;
        if !self.seats.is_bound(side) {
            return Err(ClaimError::UnknownSeat { side });
        }
        self.take(pos, side, is_correct)
    }

    /// Claim for the side held by `identity`.
    ///
    /// Same check order as [`Game::claim`]; an unseated identity is the last
    /// thing rejected.
    pub fn claim_as(
        &mut self,
        identity: &str,
        pos: Position,
        is_correct: bool,
    ) -> Result<ClaimOutcome, ClaimError> {
        self.check_claimable(pos)?;
        let side = self
            .seats
            .side_of(identity)
            .ok_or_else(|| ClaimError::UnknownParticipant {
                identity: identity.to_string(),
            })?;
        self.take(pos, side, is_correct)
    }

    /// Status, coordinate and owner checks, in that order.
    fn check_claimable(&self, pos: Position) -> Result<(), ClaimError> {
        if !self.status.is_active() {
            return Err(ClaimError::GameNotActive {
                status: self.status,
            });
        }

        let cell = self.board.get(pos).ok_or(ClaimError::InvalidCoordinate {
            row: pos.row,
            col: pos.col,
        })?;
        if cell.is_claimed() {
            return Err(ClaimError::CellAlreadyClaimed { pos });
        }
        Ok(())
    }

    fn take(
        &mut self,
        pos: Position,
        side: Side,
        is_correct: bool,
    ) -> Result<ClaimOutcome, ClaimError> {
        if !is_correct {
            return Ok(ClaimOutcome::Missed { pos });
        }

        self.revision += 1;
        let revision = self.revision;
        let cell = self
            .board
            .get_mut(pos)
            .ok_or(ClaimError::InvalidCoordinate {
                row: pos.row,
                col: pos.col,
            })?;
        cell.owner = Some(side);
        cell.version = revision;
        cell.claimed_at = Some(chrono::Utc::now());
        let cell = cell.clone();

        let winner = has_path(&self.board, side).then_some(side);
        if let Some(side) = winner {
            self.status = GameStatus::Finished;
            self.winner = Some(side);
            self.ended_at = Some(chrono::Utc::now());
        }

        Ok(ClaimOutcome::Claimed { cell, winner })
    }

    /// Convert full game state to JSON snapshot.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "game_id": self.id,
            "room_code": self.room_code,
            "status": self.status.as_str(),
            "winner": self.winner.map(|s| s.as_str()),
            "revision": self.revision,
            "seats": self.seats.to_json(),
            "board": self.board.to_json()
        })
    }
}
