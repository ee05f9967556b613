//! Configuration management (config.toml)
//!
//! Settings are stored in TOML format in the platform-specific config
//! directory. Missing sections and fields take their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::lifecycle::CoordinatorOptions;
use crate::replay::WorkerDecoder;

const CONFIG_FILE: &str = "config.toml";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Countdown and process monitoring
    #[serde(default)]
    pub launcher: LauncherConfig,
    /// External replay decoder
    #[serde(default)]
    pub decoder: DecoderConfig,
    /// Library data file
    #[serde(default)]
    pub library: LibraryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// Seconds counted down before a launch (default: 3)
    #[serde(default = "default_countdown_seconds")]
    pub countdown_seconds: u32,
    /// How often a running game is checked for exit, in ms (default: 200)
    #[serde(default = "default_monitor_poll_ms")]
    pub monitor_poll_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Worker program (default: `python3`, `python` on Windows)
    #[serde(default = "default_decoder_program")]
    pub program: String,
    /// Arguments placed before the replay path
    #[serde(default = "default_decoder_args")]
    pub args: Vec<String>,
    /// Seconds before a worker is killed (default: 30)
    #[serde(default = "default_decoder_timeout")]
    pub timeout_secs: u64,
    /// Working directory for the worker; the launcher's own if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LibraryConfig {
    /// Library file; `<data_dir>/library.json` if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_countdown_seconds() -> u32 {
    3
}
fn default_monitor_poll_ms() -> u64 {
    200
}
fn default_decoder_program() -> String {
    let program = if cfg!(windows) { "python" } else { "python3" };
    program.to_string()
}
fn default_decoder_args() -> Vec<String> {
    vec!["parser/threp/threp_parser_wrapper.py".to_string()]
}
fn default_decoder_timeout() -> u64 {
    WorkerDecoder::DEFAULT_TIMEOUT.as_secs()
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            countdown_seconds: default_countdown_seconds(),
            monitor_poll_ms: default_monitor_poll_ms(),
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            program: default_decoder_program(),
            args: default_decoder_args(),
            timeout_secs: default_decoder_timeout(),
            working_dir: None,
        }
    }
}

impl LauncherConfig {
    pub fn coordinator_options(&self) -> CoordinatorOptions {
        CoordinatorOptions {
            monitor_poll: Duration::from_millis(self.monitor_poll_ms.max(1)),
            ..CoordinatorOptions::default()
        }
    }
}

impl DecoderConfig {
    pub fn worker_decoder(&self) -> WorkerDecoder {
        let decoder = WorkerDecoder::new(self.program.clone(), self.args.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs.max(1)));
        match &self.working_dir {
            Some(dir) => decoder.with_working_dir(dir.clone()),
            None => decoder,
        }
    }
}

impl Config {
    /// Library file location, or `None` if no data directory is available.
    pub fn library_path(&self) -> Option<PathBuf> {
        self.library
            .path
            .clone()
            .or_else(|| data_dir().map(|dir| dir.join("library.json")))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("io.thlauncher", "", "thlauncher")
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\thlauncher\config`
/// On macOS: `~/Library/Application Support/io.thlauncher.thlauncher`
/// On Linux: `~/.config/thlauncher`
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Returns the platform-specific data directory (library file).
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Loads `config.toml` from the config directory, or defaults.
pub fn load() -> Config {
    match config_dir() {
        Some(dir) => load_from(&dir.join(CONFIG_FILE)),
        None => Config::default(),
    }
}

/// Loads a config file. Returns defaults if it doesn't exist or can't be
/// parsed.
pub fn load_from(path: &Path) -> Config {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    toml::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
        Config::default()
    })
}

/// Saves `config.toml` to the config directory, creating it if needed.
pub fn save(config: &Config) -> Result<()> {
    let dir = config_dir().context("No config directory on this platform")?;
    save_to(config, &dir.join(CONFIG_FILE))
}

pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
