//! thlauncher library
//!
//! The interface layer of the launcher: application state that owns the
//! library file, runs games through the lifecycle coordinator, and drains
//! launcher events on its own turn.

pub mod app;
