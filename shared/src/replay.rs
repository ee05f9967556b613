//! Decoded replay records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::game::GameId;

/// A replay file and the fields decoded from it.
///
/// Replays are produced fresh by every scan and are never persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Replay {
    /// Owning game, stamped by the scanner (0 when decoded standalone)
    pub game_id: GameId,
    /// Owning game's display name, stamped by the scanner
    pub game_title: String,

    pub file_name: String,
    pub file_path: PathBuf,
    pub file_size: u64,

    /// Inferred game version such as `TH06`, or `TH??`
    pub game_version: String,
    pub difficulty: String,
    /// Character name followed by the shot variant, if any
    pub shot_type: String,
    pub score: i64,
    /// Recording date; absent only for records not produced by a decoder
    pub date: Option<NaiveDateTime>,
    pub stage: String,
    pub slow_rate: f64,
    pub player_name: String,
    pub frame_count: u64,
    /// Payload exactly as extracted from the decoder output
    pub raw_payload: String,

    /// Data-quality diagnostics reported by the decoder.
    ///
    /// A non-empty list does not make the replay invalid.
    pub errors: Vec<String>,
}

impl Replay {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Score with thousands separators, e.g. `1,234,567`.
    pub fn formatted_score(&self) -> String {
        let digits = self.score.unsigned_abs().to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
        if self.score < 0 {
            out.push('-');
        }
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        out
    }

    /// Short difficulty label (`E`, `N`, `H`, `L`, `Ex`, `Ph`).
    ///
    /// Unrecognized difficulties are returned unchanged.
    pub fn difficulty_display(&self) -> &str {
        match self.difficulty.to_uppercase().as_str() {
            "EASY" => "E",
            "NORMAL" => "N",
            "HARD" => "H",
            "LUNATIC" => "L",
            "EXTRA" => "Ex",
            "PHANTASM" => "Ph",
            _ if self.difficulty.is_empty() => "Unknown",
            _ => &self.difficulty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_score() {
        let mut replay = Replay::default();
        assert_eq!(replay.formatted_score(), "0");
        replay.score = 999;
        assert_eq!(replay.formatted_score(), "999");
        replay.score = 1_000;
        assert_eq!(replay.formatted_score(), "1,000");
        replay.score = 123_456_789;
        assert_eq!(replay.formatted_score(), "123,456,789");
        replay.score = -42_000;
        assert_eq!(replay.formatted_score(), "-42,000");
    }

    #[test]
    fn test_difficulty_display() {
        let mut replay = Replay {
            difficulty: "Lunatic".to_string(),
            ..Default::default()
        };
        assert_eq!(replay.difficulty_display(), "L");
        replay.difficulty = "Phantasm".to_string();
        assert_eq!(replay.difficulty_display(), "Ph");
        replay.difficulty = "Overdrive".to_string();
        assert_eq!(replay.difficulty_display(), "Overdrive");
        replay.difficulty.clear();
        assert_eq!(replay.difficulty_display(), "Unknown");
    }
}
