//! [`ReplayDecoder`] backed by an external worker process.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thlauncher_shared::Replay;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use super::{DecodeError, ReplayDecoder, extract_payload, parse_payload, write_report};

/// Runs `<program> <args...> <absolute replay path>` per file.
#[derive(Debug, Clone)]
pub struct WorkerDecoder {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    working_dir: Option<PathBuf>,
    write_reports: bool,
}

impl WorkerDecoder {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: Self::DEFAULT_TIMEOUT,
            working_dir: None,
            write_reports: true,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Whether a text report is written beside each decoded file (default on).
    pub fn with_reports(mut self, write_reports: bool) -> Self {
        self.write_reports = write_reports;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the worker on `path` and return its merged output.
    ///
    /// Fails if the worker can't be started, runs past the timeout (it is
    /// killed), or exits unsuccessfully.
    pub fn run_worker(&self, path: &Path) -> Result<String, DecodeError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(DecodeError::io("create decoder runtime"))?;

        let (status, output) = rt.block_on(self.run_worker_async(path))?;
        if !status.success() {
            tracing::warn!("Decoder exited with {}:\n{}", status, output);
            return Err(DecodeError::DecodeProcessError {
                exit_code: status.code(),
                output,
            });
        }
        Ok(output)
    }

    async fn run_worker_async(&self, path: &Path) -> Result<(ExitStatus, String), DecodeError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(DecodeError::io("start decoder"))?;
        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(DecodeError::Io {
                action: "capture decoder output",
                source: std::io::Error::other("stdio not piped"),
            });
        };

        let run = async {
            let output = merge_output(stdout, stderr).await?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, output))
        };
        let result = tokio::time::timeout(self.timeout, run).await;

        match result {
            Ok(Ok(done)) => Ok(done),
            Ok(Err(source)) => Err(DecodeError::Io {
                action: "read decoder output",
                source,
            }),
            Err(_) => {
                tracing::warn!(
                    "Decoder timed out after {}s on {}, killing it",
                    self.timeout.as_secs(),
                    path.display()
                );
                if let Err(e) = child.kill().await {
                    tracing::debug!("Kill failed (decoder may have exited): {}", e);
                }
                Err(DecodeError::DecodeTimeout {
                    timeout: self.timeout,
                })
            }
        }
    }
}

impl ReplayDecoder for WorkerDecoder {
    fn decode(&self, path: &Path) -> Result<Replay, DecodeError> {
        if !path.exists() {
            return Err(DecodeError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let absolute = std::path::absolute(path).map_err(DecodeError::io("resolve replay path"))?;
        let file_size = std::fs::metadata(&absolute)
            .map_err(DecodeError::io("read replay metadata"))?
            .len();

        tracing::debug!("Decoding {}", absolute.display());
        let output = self.run_worker(&absolute)?;
        let payload = extract_payload(&output).ok_or_else(|| DecodeError::PayloadNotFound {
            output: output.clone(),
        })?;

        let mut replay = parse_payload(payload)?;
        replay.file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        replay.file_path = path.to_path_buf();
        replay.file_size = file_size;

        tracing::info!(
            "Decoded {}: {} {} {} ({})",
            replay.file_name,
            replay.game_version,
            replay.shot_type,
            replay.difficulty,
            replay.formatted_score()
        );

        if self.write_reports {
            if let Err(e) = write_report(&replay) {
                tracing::warn!("Failed to write report for {}: {}", replay.file_name, e);
            }
        }

        Ok(replay)
    }
}

/// Read stdout and stderr concurrently into one buffer, line by line, in
/// the order lines arrive.
async fn merge_output(
    stdout: impl AsyncRead + Unpin,
    stderr: impl AsyncRead + Unpin,
) -> std::io::Result<String> {
    let mut out = BufReader::new(stdout);
    let mut err = BufReader::new(stderr);
    let (mut out_line, mut err_line) = (Vec::new(), Vec::new());
    let (mut out_done, mut err_done) = (false, false);
    let mut merged = Vec::new();

    while !(out_done && err_done) {
        // Partial reads stay in the line buffers, so losing the race is safe.
        tokio::select! {
            n = out.read_until(b'\n', &mut out_line), if !out_done => {
                out_done = n? == 0;
                merged.append(&mut out_line);
            }
            n = err.read_until(b'\n', &mut err_line), if !err_done => {
                err_done = n? == 0;
                merged.append(&mut err_line);
            }
        }
    }

    Ok(String::from_utf8_lossy(&merged).into_owned())
}
