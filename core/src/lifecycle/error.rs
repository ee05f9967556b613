/// Why a game could not be launched.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("A game is already running: {title}")]
    ProcessAlreadyRunning { title: String },

    #[error("A countdown is in progress for {title}")]
    CountdownInProgress { title: String },

    #[error("Game executable not found: '{path}'")]
    ExecutableNotFound { path: String },

    #[error("Failed to start '{path}': {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Launcher is shutting down")]
    ShuttingDown,
}
