//! Library application state
//!
//! [`App`] owns the library file handle for the lifetime of the launcher and
//! wires it into the lifecycle coordinator and replay scanner. Background
//! work reports back through one event channel that the app drains on its
//! own turn.

pub mod format;
pub mod resolve;

use anyhow::{Context, Result, bail};
use std::sync::Arc;
use std::time::Duration;

use thlauncher_core::config::Config;
use thlauncher_core::events::{self, EventQueue, EventSender};
use thlauncher_core::replay::{ReplayDecoder, ScanReport};
use thlauncher_core::{
    GameLifecycleCoordinator, GameStore, JsonStore, LauncherEvent, ReplayDirectoryScanner,
};
use thlauncher_shared::{Game, PlaySession};

/// How long a blocking wait sleeps between event checks.
const EVENT_POLL: Duration = Duration::from_millis(100);

/// Library application state
pub struct App {
    config: Config,
    store: Arc<JsonStore>,
    coordinator: GameLifecycleCoordinator,
    scanner: ReplayDirectoryScanner,
    event_tx: EventSender,
    events: EventQueue,
}

impl App {
    /// Open the library file named by `config` and start the workers.
    pub fn new(config: Config) -> Result<Self> {
        let path = config
            .library_path()
            .context("No data directory available for the library file")?;
        let store = JsonStore::open(&path)
            .with_context(|| format!("Failed to open library {}", path.display()))?;
        tracing::info!("Library: {}", path.display());

        let store = Arc::new(store);
        let (event_tx, events) = events::channel();
        let coordinator = GameLifecycleCoordinator::new(
            store.clone(),
            event_tx.clone(),
            config.launcher.coordinator_options(),
        )
        .context("Failed to start the game lifecycle worker")?;
        let scanner = ReplayDirectoryScanner::new(
            store.clone(),
            Arc::new(config.decoder.worker_decoder()),
        );

        Ok(Self {
            config,
            store,
            coordinator,
            scanner,
            event_tx,
            events,
        })
    }

    /// Replace the replay decoder.
    pub fn with_decoder(mut self, decoder: Arc<dyn ReplayDecoder>) -> Self {
        self.scanner = ReplayDirectoryScanner::new(self.store.clone(), decoder);
        self
    }

    pub fn games(&self) -> Vec<Game> {
        self.store.all_games()
    }

    /// Find a game by number, `#id`, or title.
    pub fn find_game(&self, query: &str) -> Result<Game> {
        let games = self.games();
        if games.is_empty() {
            bail!("The library is empty. Add a game with `thlauncher add`.");
        }
        resolve::resolve_game(query, &games)
            .cloned()
            .map_err(|e| anyhow::anyhow!(e))
    }

    /// Add an installed game, or update the paths of the one with the same
    /// number.
    pub fn add_game(
        &self,
        number: u32,
        title: &str,
        install_path: &str,
        exe_name: &str,
        replay_dir: &str,
    ) -> Result<Game> {
        let existing = self.games().into_iter().find(|g| g.number == number);
        let mut game = existing.unwrap_or_else(|| Game::new(number, "", title, ""));
        if !title.is_empty() {
            game.title_zh = title.to_string();
        }
        game.install_path = install_path.to_string();
        game.exe_name = exe_name.to_string();
        game.replay_dir = replay_dir.to_string();
        game.installed = true;

        if game.id == 0 {
            let id = self
                .store
                .insert_game(game)
                .context("Failed to save the library")?;
            return self.store.game_by_id(id).context("Added game disappeared");
        }
        if !self.store.update_game(&game) {
            bail!("Failed to save the library");
        }
        Ok(game)
    }

    pub fn recent_sessions(&self, limit: usize) -> Vec<PlaySession> {
        self.store.recent_sessions(limit)
    }

    /// Title for a session listing, or a placeholder for removed games.
    pub fn game_title(&self, game_id: i64) -> String {
        self.store
            .game_by_id(game_id)
            .map(|g| g.display_name())
            .unwrap_or_else(|| format!("(game {})", game_id))
    }

    /// Every event pending right now.
    pub fn poll_events(&self) -> Vec<LauncherEvent> {
        let events = self.events.drain();
        for event in &events {
            tracing::debug!("Event: {:?}", event);
        }
        events
    }

    /// Count down, launch `game` and block until its session ends.
    ///
    /// `on_event` sees every event drained while waiting.
    pub fn play(&self, game: Game, mut on_event: impl FnMut(&LauncherEvent)) -> Result<PlaySession> {
        let game_id = game.id;
        let seconds = self.config.launcher.countdown_seconds;
        if !self.coordinator.launch_with_countdown(game, seconds) {
            bail!("The launcher is shutting down");
        }

        loop {
            let Some(event) = self.events.next_timeout(EVENT_POLL) else {
                continue;
            };
            on_event(&event);
            match event {
                LauncherEvent::GameEnded {
                    game_id: id,
                    session,
                    ..
                } if id == game_id => return Ok(session),
                LauncherEvent::LaunchFailed { game_id: id, reason } if id == game_id => {
                    bail!(reason)
                }
                LauncherEvent::CountdownCancelled { game_id: id } if id == game_id => {
                    bail!("Launch cancelled")
                }
                _ => {}
            }
        }
    }

    pub fn is_game_running(&self) -> bool {
        self.coordinator.is_running()
    }

    pub fn stop_game(&self) -> bool {
        self.coordinator.force_stop()
    }

    /// Scan every installed game's replays on the scan thread and wait for
    /// the result.
    pub fn scan_replays(&self, mut on_event: impl FnMut(&LauncherEvent)) -> Result<ScanReport> {
        let handle = self
            .scanner
            .spawn_scan(self.event_tx.clone())
            .context("Failed to start the replay scan")?;

        loop {
            // Checked before waiting: a finished scan has already posted.
            let finished = handle.is_finished();
            match self.events.next_timeout(EVENT_POLL) {
                Some(event) => {
                    on_event(&event);
                    if let LauncherEvent::ScanFinished { replays, skipped } = event {
                        return Ok(ScanReport { replays, skipped });
                    }
                }
                None if finished => bail!("Replay scan ended without a result"),
                None => {}
            }
        }
    }

    /// Start the owning game in replay mode for the replay named `query`.
    pub fn watch_replay(&self, query: &str, on_event: impl FnMut(&LauncherEvent)) -> Result<()> {
        let report = self.scan_replays(on_event)?;
        let replay = resolve::resolve_replay(query, &report.replays).map_err(|e| anyhow::anyhow!(e))?;
        if !self.scanner.play_replay(replay) {
            bail!("Failed to start {} for {}", replay.game_title, replay.file_name);
        }
        Ok(())
    }

    /// Stop any running game, join the workers and close the library file.
    pub fn shutdown(self) -> Result<()> {
        let Self {
            store,
            coordinator,
            scanner,
            ..
        } = self;

        coordinator.shutdown();
        drop(coordinator);
        drop(scanner);

        match Arc::try_unwrap(store) {
            Ok(store) => store.close(),
            Err(_) => {
                tracing::warn!("Library still in use at shutdown; relying on write-through");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;
    use thlauncher_core::replay::DecodeError;
    use thlauncher_shared::Replay;

    fn test_config(dir: &Path) -> Config {
        let mut config = Config::default();
        config.library.path = Some(dir.join("library.json"));
        config.launcher.countdown_seconds = 0;
        config.launcher.monitor_poll_ms = 5;
        config
    }

    /// Decodes every file into an otherwise empty replay.
    struct NameOnlyDecoder;

    impl ReplayDecoder for NameOnlyDecoder {
        fn decode(&self, path: &Path) -> Result<Replay, DecodeError> {
            Ok(Replay {
                file_name: path.file_name().unwrap().to_string_lossy().into_owned(),
                file_path: path.to_path_buf(),
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_add_and_find_game() {
        let temp = TempDir::new().unwrap();
        let app = App::new(test_config(temp.path())).unwrap();
        assert!(app.find_game("6").is_err());

        let game = app
            .add_game(6, "东方红魔乡", "/games/th06", "th06.exe", "replay")
            .unwrap();
        assert!(game.id > 0);
        assert!(game.installed);
        assert_eq!(app.find_game("th06").unwrap().id, game.id);
        assert_eq!(app.find_game("东方").unwrap().id, game.id);

        // Same number updates in place.
        let moved = app.add_game(6, "", "/mnt/th06", "th06e.exe", "").unwrap();
        assert_eq!(moved.id, game.id);
        assert_eq!(moved.title_zh, "东方红魔乡");
        assert_eq!(app.games().len(), 1);
        assert_eq!(app.games()[0].install_path, "/mnt/th06");
    }

    #[test]
    fn test_library_survives_restart() {
        let temp = TempDir::new().unwrap();
        let app = App::new(test_config(temp.path())).unwrap();
        app.add_game(7, "东方妖妖梦", "/games/th07", "th07.exe", "replay")
            .unwrap();
        app.shutdown().unwrap();

        let app = App::new(test_config(temp.path())).unwrap();
        assert_eq!(app.find_game("7").unwrap().title(), "东方妖妖梦");
        assert_eq!(app.game_title(99), "(game 99)");
    }

    #[test]
    fn test_scan_and_watch_unknown_replay() {
        let temp = TempDir::new().unwrap();
        let install = temp.path().join("th06");
        std::fs::create_dir_all(install.join("replay")).unwrap();
        std::fs::write(install.join("replay").join("th06_01.rpy"), b"rpy").unwrap();

        let app = App::new(test_config(temp.path()))
            .unwrap()
            .with_decoder(Arc::new(NameOnlyDecoder));
        app.add_game(6, "", &install.display().to_string(), "th06.exe", "replay")
            .unwrap();

        let mut seen = 0;
        let report = app.scan_replays(|_| seen += 1).unwrap();
        assert_eq!(seen, 1);
        assert_eq!(report.replays.len(), 1);
        assert_eq!(report.replays[0].game_title, "TH06 - ");

        assert!(app.watch_replay("th07_01.rpy", |_| {}).is_err());
        // The executable doesn't exist, so playback can't start.
        assert!(app.watch_replay("th06_01.rpy", |_| {}).is_err());
    }

    #[test]
    fn test_play_missing_executable_fails() {
        let temp = TempDir::new().unwrap();
        let app = App::new(test_config(temp.path())).unwrap();
        let game = app
            .add_game(8, "", &temp.path().display().to_string(), "th08.exe", "")
            .unwrap();

        let mut events = Vec::new();
        let err = app.play(game, |e| events.push(e.clone())).unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(matches!(
            events.last(),
            Some(LauncherEvent::LaunchFailed { .. })
        ));
        assert!(!app.is_game_running());
        assert!(app.recent_sessions(10).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_play_records_session() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let exe = temp.path().join("th10.sh");
        std::fs::write(&exe, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let app = App::new(test_config(temp.path())).unwrap();
        let game = app
            .add_game(10, "东方风神录", &temp.path().display().to_string(), "th10.sh", "")
            .unwrap();

        let session = app.play(game.clone(), |_| {}).unwrap();
        assert!(!session.is_open());
        assert!(app.poll_events().is_empty());

        let sessions = app.recent_sessions(5);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, session.id);
        assert!(app.find_game("10").unwrap().last_played.is_some());
        assert!(!app.stop_game());
        app.shutdown().unwrap();
    }
}
