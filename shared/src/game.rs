//! Installed game records.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identifier assigned by the persistence layer.
pub type GameId = i64;

/// A game tracked by the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Unique game identifier
    pub id: GameId,
    /// Ordinal number within the series (6 for TH06, ...)
    pub number: u32,
    /// Japanese title
    #[serde(default)]
    pub title_ja: String,
    /// Chinese title
    #[serde(default)]
    pub title_zh: String,
    /// English title or abbreviation
    #[serde(default)]
    pub title_en: String,
    /// Directory the game is installed in (also its working directory)
    #[serde(default)]
    pub install_path: String,
    /// Executable file name relative to `install_path`
    #[serde(default)]
    pub exe_name: String,
    /// Directory holding the game's `.rpy` replays
    #[serde(default)]
    pub replay_dir: String,
    /// Sum of all closed session durations
    #[serde(default)]
    pub total_play_seconds: i64,
    #[serde(default)]
    pub last_played: Option<DateTime<Local>>,
    #[serde(default)]
    pub installed: bool,
}

impl Game {
    /// Create an uninstalled game with only its number and titles set.
    pub fn new(
        number: u32,
        title_ja: impl Into<String>,
        title_zh: impl Into<String>,
        title_en: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            number,
            title_ja: title_ja.into(),
            title_zh: title_zh.into(),
            title_en: title_en.into(),
            install_path: String::new(),
            exe_name: String::new(),
            replay_dir: String::new(),
            total_play_seconds: 0,
            last_played: None,
            installed: false,
        }
    }

    /// Localized title, preferring Chinese, then Japanese, then English.
    pub fn title(&self) -> &str {
        [&self.title_zh, &self.title_ja, &self.title_en]
            .into_iter()
            .find(|t| !t.is_empty())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Display name such as `TH06 - 东方红魔乡`.
    pub fn display_name(&self) -> String {
        format!("TH{:02} - {}", self.number, self.title())
    }

    /// Full path to the game's executable.
    ///
    /// Returns `None` if either the install path or executable name is empty.
    /// Existence on disk is not checked here.
    pub fn executable_path(&self) -> Option<PathBuf> {
        if self.install_path.is_empty() || self.exe_name.is_empty() {
            return None;
        }
        Some(PathBuf::from(&self.install_path).join(&self.exe_name))
    }

    /// Accumulated play time as `"{h}h {m}m"`, or `"{m}m"` under an hour.
    pub fn formatted_play_time(&self) -> String {
        let total = self.total_play_seconds.max(0);
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        if hours > 0 {
            format!("{}h {}m", hours, minutes)
        } else {
            format!("{}m", minutes)
        }
    }
}
