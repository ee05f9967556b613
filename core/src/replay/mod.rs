//! Replay decoding pipeline
//!
//! Replay files are decoded by an external worker process, one file per
//! invocation. The worker prints diagnostics and a JSON payload bounded by
//! sentinel lines onto its merged stdout/stderr:
//!
//! ```text
//! reading th06_01.rpy ...
//! ###JSON_START###
//! {"baseInfoDic": {"character": "Reimu", "shottype": "A", ...}, ...}
//! ###JSON_END###
//! ```
//!
//! - [`WorkerDecoder`] runs the worker with a timeout and maps the payload
//!   into a [`Replay`], writing a text report beside the file.
//! - [`ReplayDirectoryScanner`] walks every installed game's replay
//!   directory and aggregates the results, skipping files that fail.
//!
//! Anything implementing [`ReplayDecoder`] can stand in for the worker.

mod error;
mod payload;
mod report;
mod scanner;
mod worker;

pub use error::DecodeError;
pub use payload::{JSON_END, JSON_START, extract_payload, infer_game_version, parse_payload};
pub use report::{render_report, report_path, write_report};
pub use scanner::{ReplayDirectoryScanner, ScanReport, SkippedReplay, is_replay_file};
pub use worker::WorkerDecoder;

use std::path::Path;
use thlauncher_shared::Replay;

/// Turns one replay file into a [`Replay`].
///
/// `game_id` and `game_title` are left for the caller to fill in.
pub trait ReplayDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Replay, DecodeError>;
}
