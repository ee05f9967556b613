use std::path::PathBuf;
use std::time::Duration;

/// Why a single replay file could not be decoded.
///
/// All of these are per-file; a scan logs them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Replay file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Decoder did not finish within {}s", .timeout.as_secs())]
    DecodeTimeout { timeout: Duration },

    #[error("Decoder exited with {}", exit_label(.exit_code))]
    DecodeProcessError {
        exit_code: Option<i32>,
        output: String,
    },

    #[error("No payload found in decoder output")]
    PayloadNotFound { output: String },

    #[error("Decoder payload is not valid JSON: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Decoder reported an error: {0}")]
    DecodeSemanticError(String),

    #[error("Failed to {action}: {source}")]
    Io {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl DecodeError {
    pub(crate) fn io(action: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| Self::Io { action, source }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}
