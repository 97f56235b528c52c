//! State management module for HexClaim.
//!
//! This module provides the core state types and the registry:
//!
//! - `topology` - Board coordinates and hex adjacency
//! - `board` - Cells, letters and ownership
//! - `win` - Path search deciding whether a side has won
//! - `hints` - Cells one claim away from winning
//! - `game` - One game: seats, status and the claim rules
//! - `sync` - Snapshots, change events and the observer replica
//! - `registry` - All live games, per-game locking and event fan-out
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          GameRegistry                            │
//! │                                                                  │
//! │   room code ──▶ game_id ──▶ GameHandle                           │
//! │                              ├─ Mutex<Game>                      │
//! │                              │    ├─ Board (4x5 Cells)           │
//! │                              │    └─ Seats (SideA, SideB)        │
//! │                              └─ broadcast::Sender<ChangeEvent>   │
//! └──────────────────────────────────────────────────────────────────┘
//!                 │                                   │
//!        claim/join (locked)                  subscribe/snapshot
//!                 ▼                                   ▼
//!      Game::claim ──▶ win::has_path           GameView ──▶ hints::one_away
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use hexclaim_state::state::{GameRegistry, GameView, Side};
//!
//! let registry = GameRegistry::default();
//! let game = registry.create_game("ROOM1")?;
//! registry.join(&game.id, "user-a", "Alice")?;
//! registry.join(&game.id, "user-b", "Bob")?;
//!
//! let (snapshot, mut events) = registry.subscribe(&game.id)?;
//! let mut view = GameView::from_snapshot(snapshot)?;
//!
//! registry.claim(&game.id, 0, 0, Side::A, true)?;
//! for event in events.drain()? {
//!     view.apply(&event)?;
//! }
//! ```

pub mod board;
pub mod game;
pub mod hints;
pub mod registry;
pub mod sync;
pub mod topology;
pub mod win;

// Re-export commonly used types
pub use board::{Board, BoardError, Cell, OwnerGrid};
pub use game::{
    ClaimError, ClaimOutcome, Game, GameError, GameInfo, GameStatus, Joined, Seat, Seats,
    ROOM_CODE_LEN,
};
pub use hints::{hints, one_away, Hints};
pub use registry::{normalize_room_code, GameRegistry, RoomError};
pub use sync::{ChangeEvent, GameView, Snapshot, Subscription, SyncError};
pub use topology::{all_positions, neighbors, Position, Side, CELL_COUNT, COLS, ROWS};
pub use win::{grid_has_path, has_path, winning_path};
