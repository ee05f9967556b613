//! Replay discovery across the installed library.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;

use thlauncher_shared::{Game, Replay};

use super::ReplayDecoder;
use crate::events::{EventSender, LauncherEvent};
use crate::store::GameStore;

/// A replay file a scan could not decode.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedReplay {
    pub path: PathBuf,
    pub error: String,
}

/// Everything a full scan found, including the files it skipped.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Decoded replays, newest first
    pub replays: Vec<Replay>,
    pub skipped: Vec<SkippedReplay>,
}

/// `true` for names ending in `.rpy`, any case.
pub fn is_replay_file(name: &str) -> bool {
    name.to_lowercase().ends_with(".rpy")
}

/// Finds and decodes the replays of every installed game.
///
/// Scans are best-effort: a file that fails to decode is logged and left
/// out, and never stops the rest of the scan.
#[derive(Clone)]
pub struct ReplayDirectoryScanner {
    store: Arc<dyn GameStore>,
    decoder: Arc<dyn ReplayDecoder>,
}

impl ReplayDirectoryScanner {
    pub fn new(store: Arc<dyn GameStore>, decoder: Arc<dyn ReplayDecoder>) -> Self {
        Self { store, decoder }
    }

    /// Decoded replays of all installed games, newest first.
    pub fn scan_all_games(&self) -> Vec<Replay> {
        self.scan_all_games_report().replays
    }

    /// Like [`scan_all_games`](Self::scan_all_games), but also reports the
    /// files that were skipped and why.
    pub fn scan_all_games_report(&self) -> ScanReport {
        let mut report = ScanReport::default();
        for game in self.store.installed_games() {
            if game.replay_dir.is_empty() {
                continue;
            }
            self.scan_into(&game, &mut report);
        }

        sort_newest_first(&mut report.replays);
        tracing::info!(
            "Replay scan found {} replays ({} skipped)",
            report.replays.len(),
            report.skipped.len()
        );
        report
    }

    /// Decoded replays in `game`'s replay directory, in file name order.
    ///
    /// A missing replay directory yields nothing.
    pub fn scan_game_replays(&self, game: &Game) -> Vec<Replay> {
        let mut report = ScanReport::default();
        self.scan_into(game, &mut report);
        report.replays
    }

    fn scan_into(&self, game: &Game, report: &mut ScanReport) {
        let dir = replay_dir(game);
        if !dir.is_dir() {
            tracing::debug!("No replay directory for {}: {}", game.display_name(), dir.display());
            return;
        }

        let title = game.display_name();
        for path in list_replay_files(&dir) {
            match self.decoder.decode(&path) {
                Ok(mut replay) => {
                    replay.game_id = game.id;
                    replay.game_title = title.clone();
                    report.replays.push(replay);
                }
                Err(e) => {
                    tracing::warn!("Skipping replay {}: {}", path.display(), e);
                    report.skipped.push(SkippedReplay {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    /// Start the owning game in replay playback mode.
    ///
    /// Returns whether the game process started, not whether playback
    /// worked.
    pub fn play_replay(&self, replay: &Replay) -> bool {
        let Some(game) = self.store.game_by_id(replay.game_id) else {
            tracing::warn!("No game with id {} for replay {}", replay.game_id, replay.file_name);
            return false;
        };
        let Some(exe_path) = game.executable_path() else {
            tracing::warn!("{} has no executable configured", game.display_name());
            return false;
        };

        let arg = format!("replay/{}", replay.file_name);
        tracing::info!("Playing {} with {}", arg, exe_path.display());

        let child = Command::new(&exe_path)
            .arg(&arg)
            .current_dir(&game.install_path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn();

        match child {
            Ok(mut child) => {
                // Reap the process when it exits.
                let reaper = thread::Builder::new()
                    .name("replay-playback".to_string())
                    .spawn(move || {
                        if let Err(e) = child.wait() {
                            tracing::debug!("Failed to wait for replay playback: {}", e);
                        }
                    });
                if let Err(e) = reaper {
                    tracing::debug!("Failed to spawn playback reaper thread: {}", e);
                }
                true
            }
            Err(e) => {
                tracing::error!("Failed to start {}: {}", exe_path.display(), e);
                false
            }
        }
    }

    /// Run [`scan_all_games_report`](Self::scan_all_games_report) on a
    /// background thread and post the result as `ScanFinished`.
    pub fn spawn_scan(&self, events: EventSender) -> std::io::Result<thread::JoinHandle<()>> {
        let scanner = self.clone();
        thread::Builder::new()
            .name("replay-scan".to_string())
            .spawn(move || {
                let ScanReport { replays, skipped } = scanner.scan_all_games_report();
                events.send(LauncherEvent::ScanFinished { replays, skipped });
            })
    }
}

/// Relative replay directories are taken from the install directory.
fn replay_dir(game: &Game) -> PathBuf {
    Path::new(&game.install_path).join(&game.replay_dir)
}

/// Replay files directly inside `dir`, sorted by name.
fn list_replay_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to read replay directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    // `is_file` follows symlinks; names need not be UTF-8.
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .is_some_and(|n| is_replay_file(&n.to_string_lossy()))
        })
        .collect();
    files.sort();
    files
}

/// Stable sort by date, newest first. Undated replays go last, in their
/// scan order.
fn sort_newest_first(replays: &mut [Replay]) {
    replays.sort_by(|a, b| match (a.date, b.date) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
