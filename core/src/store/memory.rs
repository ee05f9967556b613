//! Process-local store.

use chrono::{DateTime, Local};
use std::sync::Mutex;
use thlauncher_shared::{Game, GameId, PlaySession, SessionId};

use super::{GameStore, LibraryData};
use crate::sync::lock;

/// A [`GameStore`] that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<LibraryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `games`, assigning ids in order.
    pub fn with_games(games: impl IntoIterator<Item = Game>) -> Self {
        let mut data = LibraryData::default();
        for game in games {
            data.insert_game(game);
        }
        Self {
            data: Mutex::new(data),
        }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> LibraryData {
        lock(&self.data, "memory store").clone()
    }
}

impl GameStore for MemoryStore {
    fn all_games(&self) -> Vec<Game> {
        lock(&self.data, "memory store").all_games()
    }

    fn installed_games(&self) -> Vec<Game> {
        lock(&self.data, "memory store").installed_games()
    }

    fn game_by_id(&self, id: GameId) -> Option<Game> {
        lock(&self.data, "memory store").game_by_id(id)
    }

    fn insert_game(&self, game: Game) -> Option<GameId> {
        Some(lock(&self.data, "memory store").insert_game(game))
    }

    fn update_game(&self, game: &Game) -> bool {
        lock(&self.data, "memory store").update_game(game)
    }

    fn create_session(&self, session: &mut PlaySession) -> bool {
        lock(&self.data, "memory store").create_session(session);
        true
    }

    fn end_session(
        &self,
        id: SessionId,
        end_time: DateTime<Local>,
        duration_seconds: i64,
    ) -> bool {
        lock(&self.data, "memory store").end_session(id, end_time, duration_seconds)
    }

    fn total_play_time(&self, game_id: GameId) -> i64 {
        lock(&self.data, "memory store").total_play_time(game_id)
    }

    fn sessions_for_game(&self, game_id: GameId) -> Vec<PlaySession> {
        lock(&self.data, "memory store").sessions_for_game(game_id)
    }

    fn recent_sessions(&self, limit: usize) -> Vec<PlaySession> {
        lock(&self.data, "memory store").recent_sessions(limit)
    }
}
