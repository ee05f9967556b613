//! thlauncher core
//!
//! Two subsystems live here:
//!
//! - **Game lifecycle**: countdown, launch, exit monitoring and exactly-once
//!   end-of-session bookkeeping for the one game that may run at a time
//!   ([`lifecycle::GameLifecycleCoordinator`]).
//! - **Replay decoding**: running the external decoder worker per `.rpy`
//!   file, pulling the structured payload out of its output, and scanning
//!   every installed game's replay directory ([`replay`]).
//!
//! Persistence is consumed through the [`store::GameStore`] trait. Results
//! flow back to the interface layer as [`events::LauncherEvent`]s over a
//! channel the interface drains on its own turn.

pub mod config;
pub mod countdown;
pub mod events;
pub mod executor;
pub mod lifecycle;
pub mod recorder;
pub mod replay;
pub mod store;
mod sync;

pub use events::{EventQueue, EventSender, LauncherEvent};
pub use lifecycle::{GameLifecycleCoordinator, LaunchError};
pub use replay::{DecodeError, ReplayDecoder, ReplayDirectoryScanner, WorkerDecoder};
pub use store::{GameStore, JsonStore, MemoryStore};
