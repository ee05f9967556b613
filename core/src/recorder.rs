//! Play session bookkeeping against the persistence layer.

use chrono::{DateTime, Local};
use std::sync::Arc;
use thlauncher_shared::{Game, PlaySession};

use crate::store::GameStore;

/// Opens and closes [`PlaySession`]s and keeps each game's accumulated play
/// time in step with its closed sessions.
///
/// Persistence failures are logged and otherwise ignored: a game that is
/// already running must not be affected by a failed write.
#[derive(Clone)]
pub struct SessionRecorder {
    store: Arc<dyn GameStore>,
}

impl SessionRecorder {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn GameStore> {
        &self.store
    }

    /// Create and store an open session for `game` starting at `start_time`.
    pub fn open(&self, game: &Game, start_time: DateTime<Local>) -> PlaySession {
        let mut session = PlaySession::open(game.id, start_time);
        if self.store.create_session(&mut session) {
            tracing::debug!("Opened session {} for {}", session.id, game.display_name());
        } else {
            tracing::warn!(
                "Failed to store new session for {}; play time will not be recorded",
                game.display_name()
            );
        }
        session
    }

    /// Close `session` at `end_time` and persist the close.
    pub fn close(&self, session: &mut PlaySession, end_time: DateTime<Local>) {
        let end_time = end_time.max(session.start_time);
        session.close(end_time);
        if !self
            .store
            .end_session(session.id, end_time, session.duration_seconds)
        {
            tracing::warn!("Failed to store end of session {}", session.id);
        }
        tracing::debug!(
            "Closed session {} after {}s",
            session.id,
            session.duration_seconds
        );
    }

    /// Recompute `game`'s total play time from its closed sessions and
    /// persist it along with the last-played time.
    ///
    /// The total is always re-summed, never incremented, so drift between
    /// the game record and its sessions heals on the next close.
    pub fn refresh_totals(&self, game: &mut Game, played_at: DateTime<Local>) -> i64 {
        let total = self.store.total_play_time(game.id);
        game.total_play_seconds = total;
        game.last_played = Some(played_at);
        game.installed = true;
        if !self.store.update_game(game) {
            tracing::warn!("Failed to store play time for {}", game.display_name());
        }
        tracing::info!("Total play time for {}: {}s", game.display_name(), total);
        total
    }
}
