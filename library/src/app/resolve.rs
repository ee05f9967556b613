//! Resolve games and replays from user queries
//!
//! Games can be named by number (`6`, `th06`), by library id (`#3`), or by
//! a case-insensitive title prefix. Replays are named by file name, with the
//! same exact / case-insensitive / unique-prefix rules.

use thlauncher_shared::{Game, Replay};

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ResolutionError {
    pub message: String,
    /// Candidates when the query was ambiguous
    pub suggestions: Vec<String>,
}

/// Resolve `query` against the ids produced by `get_id`.
///
/// Priority order:
/// 1. Exact case-sensitive match
/// 2. Exact case-insensitive match (if unique)
/// 3. Case-insensitive prefix match (if unique)
pub fn resolve_id<'a, T>(
    query: &str,
    items: &'a [T],
    get_id: impl Fn(&T) -> &str,
    item_kind: &str,
) -> Result<&'a T, ResolutionError> {
    if query.is_empty() {
        return Err(ResolutionError {
            message: format!("Empty {} name", item_kind),
            suggestions: Vec::new(),
        });
    }

    if let Some(item) = items.iter().find(|item| get_id(item) == query) {
        return Ok(item);
    }

    let lower_query = query.to_lowercase();
    let exact: Vec<&T> = items
        .iter()
        .filter(|item| get_id(item).to_lowercase() == lower_query)
        .collect();
    if exact.len() == 1 {
        return Ok(exact[0]);
    }

    let prefix: Vec<&T> = items
        .iter()
        .filter(|item| get_id(item).to_lowercase().starts_with(&lower_query))
        .collect();
    match prefix.as_slice() {
        [] => Err(ResolutionError {
            message: format!("{} '{}' not found", item_kind, query),
            suggestions: Vec::new(),
        }),
        [item] => Ok(*item),
        _ => Err(ResolutionError {
            message: format!("Ambiguous {} '{}' matches multiple items", item_kind, query),
            suggestions: prefix.iter().map(|item| get_id(item).to_string()).collect(),
        }),
    }
}

/// Parse `6`, `06`, `th06` or `TH6` into a game number.
fn parse_game_number(query: &str) -> Option<u32> {
    let digits = query
        .strip_prefix("th")
        .or_else(|| query.strip_prefix("TH"))
        .or_else(|| query.strip_prefix("Th"))
        .unwrap_or(query);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

pub fn resolve_game<'a>(query: &str, games: &'a [Game]) -> Result<&'a Game, ResolutionError> {
    let query = query.trim();

    if let Some(id) = query.strip_prefix('#') {
        let found = id
            .parse()
            .ok()
            .and_then(|id: i64| games.iter().find(|g| g.id == id));
        return found.ok_or_else(|| ResolutionError {
            message: format!("No game with id {}", id),
            suggestions: Vec::new(),
        });
    }

    if let Some(number) = parse_game_number(query) {
        return games
            .iter()
            .find(|g| g.number == number)
            .ok_or_else(|| ResolutionError {
                message: format!("TH{:02} is not in the library", number),
                suggestions: Vec::new(),
            });
    }

    resolve_id(query, games, |g| g.title(), "Game")
}

pub fn resolve_replay<'a>(
    query: &str,
    replays: &'a [Replay],
) -> Result<&'a Replay, ResolutionError> {
    resolve_id(query.trim(), replays, |r| r.file_name.as_str(), "Replay")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> Vec<Game> {
        let mut games = vec![
            Game::new(6, "東方紅魔郷", "东方红魔乡", "Embodiment of Scarlet Devil"),
            Game::new(7, "東方妖々夢", "", "Perfect Cherry Blossom"),
            Game::new(8, "", "", "Imperishable Night"),
            Game::new(10, "", "", "Mountain of Faith"),
        ];
        for (i, game) in games.iter_mut().enumerate() {
            game.id = i as i64 + 1;
        }
        games
    }

    fn replay(name: &str) -> Replay {
        Replay {
            file_name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_by_number() {
        let games = library();
        assert_eq!(resolve_game("6", &games).unwrap().number, 6);
        assert_eq!(resolve_game("th07", &games).unwrap().number, 7);
        assert_eq!(resolve_game("TH10", &games).unwrap().number, 10);
        assert!(resolve_game("th09", &games).is_err());
    }

    #[test]
    fn test_resolve_by_id() {
        let games = library();
        assert_eq!(resolve_game("#3", &games).unwrap().number, 8);
        assert!(resolve_game("#99", &games).is_err());
        assert!(resolve_game("#x", &games).is_err());
    }

    #[test]
    fn test_resolve_by_title() {
        let games = library();
        // Titles resolve through the localized title (zh, then ja, then en).
        assert_eq!(resolve_game("东方红魔乡", &games).unwrap().number, 6);
        assert_eq!(resolve_game("東方妖", &games).unwrap().number, 7);
        assert_eq!(resolve_game("imperishable night", &games).unwrap().number, 8);
        assert_eq!(resolve_game("mount", &games).unwrap().number, 10);
    }

    #[test]
    fn test_resolve_empty_and_unknown() {
        let games = library();
        assert!(resolve_game("", &games).is_err());
        let err = resolve_game("Subterranean", &games).unwrap_err();
        assert!(err.message.contains("not found"));
    }

    #[test]
    fn test_resolve_replay_names() {
        let replays = vec![
            replay("th06_01.rpy"),
            replay("th06_02.rpy"),
            replay("TH07_01.RPY"),
        ];
        assert_eq!(
            resolve_replay("th06_01.rpy", &replays).unwrap().file_name,
            "th06_01.rpy"
        );
        assert_eq!(
            resolve_replay("th07_01.rpy", &replays).unwrap().file_name,
            "TH07_01.RPY"
        );
        assert_eq!(
            resolve_replay("th06_02", &replays).unwrap().file_name,
            "th06_02.rpy"
        );

        let err = resolve_replay("th06", &replays).unwrap_err();
        assert_eq!(err.suggestions, vec!["th06_01.rpy", "th06_02.rpy"]);
    }
}
