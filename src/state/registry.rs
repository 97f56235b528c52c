//! Game registry.
//!
//! Holds every live game, indexed by id and by room code. Each game sits
//! behind its own mutex, so claims on different games never wait on each
//! other; the shared index is only read-locked long enough to clone out an
//! `Arc` to the game.
//!
//! Change events are sent while the game's lock is still held. Sending on a
//! broadcast channel never blocks, and doing it under the lock means every
//! observer sees one game's events in the order they happened.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use super::board::Board;
use super::game::{ClaimError, ClaimOutcome, Game, GameError, GameInfo, ROOM_CODE_LEN};
use super::sync::{ChangeEvent, Snapshot, Subscription};
use super::topology::{Position, Side};
use crate::config::EngineConfig;

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("room code '{0}' must be {len} letters or digits", len = ROOM_CODE_LEN)]
    InvalidRoomCode(String),

    #[error("room code '{0}' is already in use")]
    RoomCodeTaken(String),

    #[error("registry is full ({0} games)")]
    RegistryFull(usize),

    #[error("game '{0}' not found")]
    GameNotFound(String),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("game state unavailable: {0}")]
    Unavailable(String),
}

/// One game plus its event channel.
#[derive(Debug)]
struct GameHandle {
    game: Mutex<Game>,
    events: broadcast::Sender<ChangeEvent>,
}

impl GameHandle {
    fn lock(&self) -> Result<MutexGuard<'_, Game>, String> {
        self.game
            .lock()
            .map_err(|_| "game lock poisoned".to_string())
    }

    /// Broadcast to whoever is listening. Nobody listening is fine.
    fn publish(&self, game_id: &str, event: ChangeEvent) {
        let kind = event.kind();
        match self.events.send(event) {
            Ok(receivers) => debug!(game_id, kind, receivers, "Published event"),
            Err(_) => debug!(game_id, kind, "No observers for event"),
        }
    }
}

#[derive(Debug, Default)]
struct Index {
    /// Games by ID
    games: HashMap<String, Arc<GameHandle>>,
    /// Uppercase room code to game ID
    codes: HashMap<String, String>,
}

/// Registry of all live games.
#[derive(Debug, Default)]
pub struct GameRegistry {
    config: EngineConfig,
    index: RwLock<Index>,
}

/// Normalize and validate a room code.
pub fn normalize_room_code(code: &str) -> Result<String, RoomError> {
    let code = code.trim();
    if code.chars().count() != ROOM_CODE_LEN || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(RoomError::InvalidRoomCode(code.to_string()));
    }
    Ok(code.to_ascii_uppercase())
}

impl GameRegistry {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            index: RwLock::new(Index::default()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create a game with a random board.
    pub fn create_game(&self, room_code: &str) -> Result<GameInfo, RoomError> {
        let board = Board::random(&mut rand::thread_rng());
        self.create_game_with_board(room_code, board)
    }

    /// Create a game in `Waiting` with the given board.
    #[instrument(skip(self, board))]
    pub fn create_game_with_board(
        &self,
        room_code: &str,
        board: Board,
    ) -> Result<GameInfo, RoomError> {
        let code = normalize_room_code(room_code)?;
        let mut index = self.write_index()?;

        if index.codes.contains_key(&code) {
            warn!(room_code = %code, "Room code already in use");
            return Err(RoomError::RoomCodeTaken(code));
        }
        if let Some(max) = self.config.max_games {
            if index.games.len() >= max {
                warn!(max, "Registry full");
                return Err(RoomError::RegistryFull(max));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let game = Game::new(id.clone(), &code, board);
        let info = game.info();
        let (events, _) = broadcast::channel(self.config.event_capacity.max(1));

        index.codes.insert(code.clone(), id.clone());
        index.games.insert(
            id.clone(),
            Arc::new(GameHandle {
                game: Mutex::new(game),
                events,
            }),
        );

        info!(game_id = %id, room_code = %code, "Created game");
        Ok(info)
    }

    /// Look up a game ID by room code, case-insensitively.
    pub fn find_by_code(&self, room_code: &str) -> Option<String> {
        let code = room_code.trim().to_ascii_uppercase();
        let index = self.index.read().ok()?;
        index.codes.get(&code).cloned()
    }

    /// Bind a participant to a seat.
    #[instrument(skip(self, display_name))]
    pub fn join(
        &self,
        game_id: &str,
        identity: &str,
        display_name: &str,
    ) -> Result<Side, RoomError> {
        let handle = self.handle(game_id)?;
        let mut game = handle.lock().map_err(RoomError::Unavailable)?;

        let joined = game.join(identity, display_name).map_err(|e| {
            warn!(game_id, error = %e, "Join rejected");
            e
        })?;

        if joined.newly_bound {
            info!(game_id, side = %joined.side, "Seat bound");
            handle.publish(game_id, ChangeEvent::SeatsChanged(game.seats().clone()));
        }
        if joined.activated {
            info!(game_id, "Game active");
            handle.publish(game_id, ChangeEvent::GameStatusChanged(game.info()));
        }

        Ok(joined.side)
    }

    /// Start a game before its second seat fills.
    #[instrument(skip(self))]
    pub fn start(&self, game_id: &str) -> Result<(), RoomError> {
        let handle = self.handle(game_id)?;
        let mut game = handle.lock().map_err(RoomError::Unavailable)?;
        game.start()?;

        info!(game_id, "Game started early");
        handle.publish(game_id, ChangeEvent::GameStatusChanged(game.info()));
        Ok(())
    }

    /// The claim entrypoint.
    ///
    /// The status check, cell write, win check and status write all happen
    /// under the game's lock. Of two racing claims for one cell, exactly one
    /// sees it unclaimed; the other gets `CellAlreadyClaimed`.
    #[instrument(skip(self))]
    pub fn claim(
        &self,
        game_id: &str,
        row: usize,
        col: usize,
        side: Side,
        is_correct: bool,
    ) -> Result<ClaimOutcome, ClaimError> {
        let handle = self.claim_handle(game_id)?;
        let mut game = handle.lock().map_err(ClaimError::Unavailable)?;
        let pos = Position::new(row, col);
        let result = game.claim(pos, side, is_correct);
        Self::publish_claim(&handle, &game, pos, result)
    }

    /// Claim on behalf of a seated participant.
    ///
    /// The participant's side is resolved under the same lock as the claim,
    /// after the status and cell checks.
    #[instrument(skip(self))]
    pub fn claim_as(
        &self,
        game_id: &str,
        identity: &str,
        row: usize,
        col: usize,
        is_correct: bool,
    ) -> Result<ClaimOutcome, ClaimError> {
        let handle = self.claim_handle(game_id)?;
        let mut game = handle.lock().map_err(ClaimError::Unavailable)?;
        let pos = Position::new(row, col);
        let result = game.claim_as(identity, pos, is_correct);
        Self::publish_claim(&handle, &game, pos, result)
    }

    /// Log a claim result and send its events. Runs under the game lock.
    fn publish_claim(
        handle: &GameHandle,
        game: &Game,
        pos: Position,
        result: Result<ClaimOutcome, ClaimError>,
    ) -> Result<ClaimOutcome, ClaimError> {
        let outcome = result.map_err(|e| {
            warn!(game_id = %game.id, %pos, reason = e.code(), error = %e, "Claim rejected");
            e
        })?;

        match &outcome {
            ClaimOutcome::Claimed { cell, winner } => {
                debug!(game_id = %game.id, %pos, version = cell.version, "Cell claimed");
                handle.publish(&game.id, ChangeEvent::CellChanged(cell.clone()));
                if let Some(winner) = winner {
                    info!(game_id = %game.id, winner = %winner, "Game won");
                    handle.publish(&game.id, ChangeEvent::GameStatusChanged(game.info()));
                }
            }
            ClaimOutcome::Missed { .. } => {
                debug!(game_id = %game.id, %pos, "Wrong answer, cell stays open");
            }
        }

        Ok(outcome)
    }

    /// Full point-in-time copy of a game.
    pub fn snapshot(&self, game_id: &str) -> Result<Snapshot, RoomError> {
        let handle = self.handle(game_id)?;
        let game = handle.lock().map_err(RoomError::Unavailable)?;
        Ok(Snapshot::of(&game))
    }

    /// Attach an observer.
    ///
    /// The subscription is opened under the game lock before the snapshot is
    /// taken, so every change after the snapshot arrives on the stream.
    #[instrument(skip(self))]
    pub fn subscribe(&self, game_id: &str) -> Result<(Snapshot, Subscription), RoomError> {
        let handle = self.handle(game_id)?;
        let game = handle.lock().map_err(RoomError::Unavailable)?;
        let receiver = handle.events.subscribe();
        let snapshot = Snapshot::of(&game);

        debug!(
            game_id,
            observers = handle.events.receiver_count(),
            "Observer attached"
        );
        Ok((snapshot, Subscription::new(game_id.to_string(), receiver)))
    }

    /// Current game-level info.
    pub fn info(&self, game_id: &str) -> Result<GameInfo, RoomError> {
        let handle = self.handle(game_id)?;
        let game = handle.lock().map_err(RoomError::Unavailable)?;
        Ok(game.info())
    }

    /// Drop finished games and free their room codes.
    ///
    /// Open subscriptions to a dropped game end with `SyncError::Closed`.
    #[instrument(skip(self))]
    pub fn cleanup_finished(&self) -> Result<Vec<String>, RoomError> {
        let mut index = self.write_index()?;

        let finished: Vec<(String, String)> = index
            .games
            .iter()
            .filter_map(|(id, handle)| {
                let game = handle.lock().ok()?;
                if game.status().is_terminal() {
                    Some((id.clone(), game.room_code.clone()))
                } else {
                    None
                }
            })
            .collect();

        for (id, code) in &finished {
            index.games.remove(id);
            index.codes.remove(code);
        }

        if !finished.is_empty() {
            info!(count = finished.len(), "Removed finished games");
        }
        Ok(finished.into_iter().map(|(id, _)| id).collect())
    }

    /// Count games that are accepting claims.
    pub fn active_count(&self) -> usize {
        let Ok(index) = self.index.read() else {
            return 0;
        };
        index
            .games
            .values()
            .filter(|h| h.lock().is_ok_and(|g| g.status().is_active()))
            .count()
    }

    /// Total game count.
    pub fn count(&self) -> usize {
        self.index.read().map(|i| i.games.len()).unwrap_or(0)
    }

    fn handle(&self, game_id: &str) -> Result<Arc<GameHandle>, RoomError> {
        let index = self
            .index
            .read()
            .map_err(|_| RoomError::Unavailable("registry lock poisoned".to_string()))?;
        index
            .games
            .get(game_id)
            .cloned()
            .ok_or_else(|| RoomError::GameNotFound(game_id.to_string()))
    }

    fn claim_handle(&self, game_id: &str) -> Result<Arc<GameHandle>, ClaimError> {
        self.handle(game_id).map_err(|e| match e {
            RoomError::GameNotFound(id) => ClaimError::GameNotFound(id),
            other => ClaimError::Unavailable(other.to_string()),
        })
    }

    fn write_index(&self) -> Result<std::sync::RwLockWriteGuard<'_, Index>, RoomError> {
        self.index
            .write()
            .map_err(|_| RoomError::Unavailable("registry lock poisoned".to_string()))
    }
}
