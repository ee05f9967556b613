//! Shared types for the thlauncher game library.
//!
//! These are the records passed between the persistence layer, the launcher
//! core and the interface layer. They carry no behavior beyond formatting and
//! path resolution.

pub mod game;
pub mod replay;
pub mod session;

pub use game::{Game, GameId};
pub use replay::Replay;
pub use session::{PlaySession, SessionId, SessionKind};
