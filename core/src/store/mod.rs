//! Persistence collaborator
//!
//! The launcher core never talks to storage directly; it consumes the
//! [`GameStore`] trait. Implementations never surface errors past this
//! boundary: a failed write returns `false`, a failed read returns `None` or
//! an empty list, and the failure is logged.
//!
//! Two implementations are provided:
//! - [`MemoryStore`]: process-local, used by tests and embedders
//! - [`JsonStore`]: a write-through `library.json` file with an explicit
//!   open/close lifecycle

mod data;
mod json;
mod memory;

use chrono::{DateTime, Local};
use thlauncher_shared::{Game, GameId, PlaySession, SessionId};

pub use data::LibraryData;
pub use json::JsonStore;
pub use memory::MemoryStore;

/// Storage operations consumed by the launcher core.
pub trait GameStore: Send + Sync {
    /// All games ordered by number.
    fn all_games(&self) -> Vec<Game>;

    /// Installed games ordered by number.
    fn installed_games(&self) -> Vec<Game>;

    fn game_by_id(&self, id: GameId) -> Option<Game>;

    /// Add a game, assigning its id. Returns the new id on success.
    fn insert_game(&self, game: Game) -> Option<GameId>;

    /// Overwrite a stored game. Returns `false` if it does not exist or the
    /// write failed.
    fn update_game(&self, game: &Game) -> bool;

    /// Store a new session, assigning `session.id` on success.
    fn create_session(&self, session: &mut PlaySession) -> bool;

    /// Record the end of a session.
    fn end_session(&self, id: SessionId, end_time: DateTime<Local>, duration_seconds: i64)
    -> bool;

    /// Sum of `duration_seconds` over the game's closed sessions.
    fn total_play_time(&self, game_id: GameId) -> i64;

    /// Sessions for one game, newest first.
    fn sessions_for_game(&self, game_id: GameId) -> Vec<PlaySession>;

    /// The most recent sessions across all games, newest first.
    fn recent_sessions(&self, limit: usize) -> Vec<PlaySession>;
}
