//! `library.json` file store.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thlauncher_shared::{Game, GameId, PlaySession, SessionId};

use super::{GameStore, LibraryData};
use crate::sync::lock;

/// A [`GameStore`] persisted as a single JSON document.
///
/// The handle is opened once at startup and closed at shutdown. Every
/// mutation is written through to disk before it returns; if the write
/// fails the in-memory state is rolled back so memory and disk agree.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    data: Mutex<LibraryData>,
}

impl JsonStore {
    /// Open the store at `path`.
    ///
    /// A missing file is treated as an empty library; the file is created on
    /// the first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse library file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No library file at {}, starting empty", path.display());
                LibraryData::default()
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read library file {}", path.display()));
            }
        };

        tracing::debug!("Opened library file: {}", path.display());
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush the library to disk and release the handle.
    pub fn close(self) -> Result<()> {
        let Self { path, data } = self;
        let data = data.into_inner().unwrap_or_else(|e| e.into_inner());
        write_library(&path, &data)?;
        tracing::debug!("Closed library file: {}", path.display());
        Ok(())
    }

    fn read<R>(&self, f: impl FnOnce(&LibraryData) -> R) -> R {
        f(&lock(&self.data, "library file"))
    }

    /// Apply `f` and write the result through. Returns `None` (with the
    /// change undone) if the write fails.
    fn mutate<R>(&self, f: impl FnOnce(&mut LibraryData) -> R) -> Option<R> {
        let mut data = lock(&self.data, "library file");
        let backup = data.clone();
        let result = f(&mut data);

        match write_library(&self.path, &data) {
            Ok(()) => Some(result),
            Err(e) => {
                tracing::error!("Failed to write library file: {:#}", e);
                *data = backup;
                None
            }
        }
    }
}

fn write_library(path: &Path, data: &LibraryData) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let content = serde_json::to_string_pretty(data).context("Failed to serialize library")?;

    // Write beside the target and rename so a crash never leaves half a file.
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

impl GameStore for JsonStore {
    fn all_games(&self) -> Vec<Game> {
        self.read(LibraryData::all_games)
    }

    fn installed_games(&self) -> Vec<Game> {
        self.read(LibraryData::installed_games)
    }

    fn game_by_id(&self, id: GameId) -> Option<Game> {
        self.read(|data| data.game_by_id(id))
    }

    fn insert_game(&self, game: Game) -> Option<GameId> {
        self.mutate(|data| data.insert_game(game))
    }

    fn update_game(&self, game: &Game) -> bool {
        self.mutate(|data| data.update_game(game)).unwrap_or(false)
    }

    fn create_session(&self, session: &mut PlaySession) -> bool {
        let mut pending = session.clone();
        match self.mutate(|data| data.create_session(&mut pending)) {
            Some(id) => {
                session.id = id;
                true
            }
            None => false,
        }
    }

    fn end_session(
        &self,
        id: SessionId,
        end_time: DateTime<Local>,
        duration_seconds: i64,
    ) -> bool {
        self.mutate(|data| data.end_session(id, end_time, duration_seconds))
            .unwrap_or(false)
    }

    fn total_play_time(&self, game_id: GameId) -> i64 {
        self.read(|data| data.total_play_time(game_id))
    }

    fn sessions_for_game(&self, game_id: GameId) -> Vec<PlaySession> {
        self.read(|data| data.sessions_for_game(game_id))
    }

    fn recent_sessions(&self, limit: usize) -> Vec<PlaySession> {
        self.read(|data| data.recent_sessions(limit))
    }
}
