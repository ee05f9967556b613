//! In-memory library contents shared by the store implementations.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thlauncher_shared::{Game, GameId, PlaySession, SessionId};

/// Games and sessions as stored in `library.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryData {
    #[serde(default)]
    pub games: Vec<Game>,
    #[serde(default)]
    pub sessions: Vec<PlaySession>,
    #[serde(default)]
    next_game_id: GameId,
    #[serde(default)]
    next_session_id: SessionId,
}

impl LibraryData {
    pub fn all_games(&self) -> Vec<Game> {
        let mut games = self.games.clone();
        games.sort_by_key(|g| g.number);
        games
    }

    pub fn installed_games(&self) -> Vec<Game> {
        let mut games: Vec<Game> = self.games.iter().filter(|g| g.installed).cloned().collect();
        games.sort_by_key(|g| g.number);
        games
    }

    pub fn game_by_id(&self, id: GameId) -> Option<Game> {
        self.games.iter().find(|g| g.id == id).cloned()
    }

    pub fn insert_game(&mut self, mut game: Game) -> GameId {
        // Ids start at 1; files written by hand may omit the counter.
        let max_id = self.games.iter().map(|g| g.id).max().unwrap_or(0);
        self.next_game_id = self.next_game_id.max(max_id) + 1;
        game.id = self.next_game_id;
        self.games.push(game);
        self.next_game_id
    }

    pub fn update_game(&mut self, game: &Game) -> bool {
        match self.games.iter_mut().find(|g| g.id == game.id) {
            Some(stored) => {
                *stored = game.clone();
                true
            }
            None => false,
        }
    }

    pub fn create_session(&mut self, session: &mut PlaySession) -> SessionId {
        let max_id = self.sessions.iter().map(|s| s.id).max().unwrap_or(0);
        self.next_session_id = self.next_session_id.max(max_id) + 1;
        session.id = self.next_session_id;
        self.sessions.push(session.clone());
        session.id
    }

    pub fn end_session(
        &mut self,
        id: SessionId,
        end_time: DateTime<Local>,
        duration_seconds: i64,
    ) -> bool {
        match self.sessions.iter_mut().find(|s| s.id == id) {
            Some(session) => {
                session.end_time = Some(end_time);
                session.duration_seconds = duration_seconds;
                true
            }
            None => false,
        }
    }

    pub fn total_play_time(&self, game_id: GameId) -> i64 {
        self.sessions
            .iter()
            .filter(|s| s.game_id == game_id && !s.is_open())
            .map(|s| s.duration_seconds)
            .sum()
    }

    pub fn sessions_for_game(&self, game_id: GameId) -> Vec<PlaySession> {
        let mut sessions: Vec<PlaySession> = self
            .sessions
            .iter()
            .filter(|s| s.game_id == game_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        sessions
    }

    pub fn recent_sessions(&self, limit: usize) -> Vec<PlaySession> {
        let mut sessions = self.sessions.clone();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        sessions.truncate(limit);
        sessions
    }
}
