//! Play session records.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::game::GameId;

/// Identifier assigned by the persistence layer.
pub type SessionId = i64;

/// What the player was doing during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    #[default]
    Normal,
    Practice,
    Replay,
}

impl SessionKind {
    pub fn display_name(self) -> &'static str {
        match self {
            SessionKind::Normal => "Normal play",
            SessionKind::Practice => "Practice",
            SessionKind::Replay => "Replay viewing",
        }
    }
}

/// One launch of a game, from process start to process end.
///
/// A session is open while `end_time` is `None`. Once closed, `end_time` is
/// never earlier than `start_time` and `duration_seconds` holds the whole
/// seconds between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaySession {
    pub id: SessionId,
    pub game_id: GameId,
    pub start_time: DateTime<Local>,
    #[serde(default)]
    pub end_time: Option<DateTime<Local>>,
    #[serde(default)]
    pub duration_seconds: i64,
    #[serde(default)]
    pub kind: SessionKind,
    #[serde(default)]
    pub note: String,
}

impl PlaySession {
    /// Create an open normal session starting at `start_time`.
    pub fn open(game_id: GameId, start_time: DateTime<Local>) -> Self {
        Self {
            id: 0,
            game_id,
            start_time,
            end_time: None,
            duration_seconds: 0,
            kind: SessionKind::Normal,
            note: String::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Close the session at `end_time`.
    ///
    /// An end time before the start (clock adjustment) is clamped to the start.
    pub fn close(&mut self, end_time: DateTime<Local>) {
        let end_time = end_time.max(self.start_time);
        self.duration_seconds = (end_time - self.start_time).num_seconds();
        self.end_time = Some(end_time);
    }

    /// Duration as `HH:MM:SS`, or `MM:SS` under an hour.
    pub fn formatted_duration(&self) -> String {
        let total = self.duration_seconds.max(0);
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;
        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{:02}:{:02}", minutes, seconds)
        }
    }
}
