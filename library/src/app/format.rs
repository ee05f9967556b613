//! Text rendering for library listings and launcher events.

use thlauncher_core::LauncherEvent;
use thlauncher_shared::{Game, PlaySession, Replay};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn game_line(game: &Game) -> String {
    let last_played = game
        .last_played
        .map(|t| t.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "never".to_string());
    let status = if game.installed { "" } else { "  (not installed)" };
    format!(
        "#{:<3} {:<40} {:>9}  last played {}{}",
        game.id,
        game.display_name(),
        game.formatted_play_time(),
        last_played,
        status
    )
}

/// `game_title` is looked up by the caller; sessions only carry the game id.
pub fn session_line(session: &PlaySession, game_title: &str) -> String {
    let duration = if session.is_open() {
        "playing".to_string()
    } else {
        session.formatted_duration()
    };
    format!(
        "{}  {:>8}  {:<8} {}",
        session.start_time.format(DATE_FORMAT),
        duration,
        session.kind.display_name(),
        game_title
    )
}

pub fn replay_line(replay: &Replay) -> String {
    let date = replay
        .date
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "????-??-?? ??:??".to_string());
    let flag = if replay.has_errors() { " !" } else { "" };
    format!(
        "{}  {:<5} {:<3} {:<14} {:>15}  {}{}",
        date,
        replay.game_version,
        replay.difficulty_display(),
        replay.shot_type,
        replay.formatted_score(),
        replay.file_name,
        flag
    )
}

/// One-line description of an event for the console.
pub fn describe_event(event: &LauncherEvent) -> String {
    match event {
        LauncherEvent::CountdownTick { remaining, .. } => format!("Starting in {}...", remaining),
        LauncherEvent::CountdownFinished { .. } => "Launching".to_string(),
        LauncherEvent::CountdownCancelled { .. } => "Launch cancelled".to_string(),
        LauncherEvent::GameStarted { session_id, .. } => {
            format!("Game started (session {})", session_id)
        }
        LauncherEvent::GameEnded {
            session,
            total_play_seconds,
            ..
        } => format!(
            "Game ended after {} (total {}h {}m)",
            session.formatted_duration(),
            total_play_seconds / 3600,
            (total_play_seconds % 3600) / 60
        ),
        LauncherEvent::LaunchFailed { reason, .. } => format!("Launch failed: {}", reason),
        LauncherEvent::ScanFinished { replays, skipped } => format!(
            "Found {} replays ({} could not be read)",
            replays.len(),
            skipped.len()
        ),
    }
}
