//! HexClaim State Library
//!
//! This crate provides the authoritative state engine for HexClaim, a
//! two-player connection game on a 4x5 hex board where each cell is won by
//! answering a question.
//!
//! # Overview
//!
//! - **Topology** - Column-offset hex adjacency. Side A links the top and
//!   bottom rows, side B links the left and right columns.
//!
//! - **Win Detection** - Breadth-first search over a side's cells.
//!
//! - **Hints** - Open cells that would win the game for a side.
//!
//! - **Claims** - Race-safe cell claims. Of two concurrent claims for one
//!   cell exactly one succeeds, and the winning claim finishes the game in
//!   the same step.
//!
//! - **Sync** - Snapshots plus a per-game stream of change events that
//!   observers apply to a local replica.
//!
//! # Design Principles
//!
//! 1. **One lock per game** - Every mutation of a game happens under its own
//!    mutex; different games never contend.
//!
//! 2. **Typed failures** - Rejected claims come back as [`state::ClaimError`]
//!    with a stable reason code.
//!
//! 3. **No networking** - This crate is pure state, no WebSocket or HTTP.
//!
//! 4. **Serialization-ready** - Snapshots and events serialize to JSON.
//!
//! # Example
//!
//! ```rust
//! use hexclaim_state::state::{GameRegistry, GameStatus, GameView, Side};
//!
//! let registry = GameRegistry::default();
//! let game = registry.create_game("abc12").unwrap();
//! assert_eq!(registry.find_by_code("ABC12"), Some(game.id.clone()));
//!
//! registry.join(&game.id, "user-a", "Alice").unwrap();
//! registry.join(&game.id, "user-b", "Bob").unwrap();
//!
//! let (snapshot, mut events) = registry.subscribe(&game.id).unwrap();
//! let mut view = GameView::from_snapshot(snapshot).unwrap();
//!
//! for row in 0..4 {
//!     registry.claim(&game.id, row, 0, Side::A, true).unwrap();
//! }
//!
//! for event in events.drain().unwrap() {
//!     view.apply(&event).unwrap();
//! }
//! assert_eq!(view.status(), GameStatus::Finished);
//! assert_eq!(view.winner(), Some(Side::A));
//! ```

pub mod config;
pub mod question;
pub mod state;

pub use config::{ConfigError, EngineConfig};
