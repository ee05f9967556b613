//! Game process lifecycle and play-session management
//!
//! The coordinator owns a single slot holding the running game process and
//! its open session. At most one game runs per coordinator.
//!
//! ```text
//! Idle -> CountingDown -> Running -> Idle      (natural exit or force_stop)
//!         CountingDown -> Idle                 (cancel_countdown)
//! ```
//!
//! All countdown, launch and monitor work for one coordinator runs on its own
//! [`SerialExecutor`], so two launch sequences never overlap. The slot is
//! taken atomically under its mutex by whichever of the exit monitor and
//! [`GameLifecycleCoordinator::force_stop`] gets there first; only that
//! caller performs end-of-session bookkeeping.

mod error;

pub use error::LaunchError;

use chrono::Local;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use thlauncher_shared::{Game, PlaySession, SessionId};

use crate::countdown::{CancelToken, CountdownOutcome, CountdownScheduler};
use crate::events::{EventSender, LauncherEvent};
use crate::executor::SerialExecutor;
use crate::recorder::SessionRecorder;
use crate::store::GameStore;
use crate::sync::lock;

/// Timing knobs for a coordinator.
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorOptions {
    /// Length of one countdown tick
    pub countdown_interval: Duration,
    /// How often the exit monitor polls the game process
    pub monitor_poll: Duration,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            countdown_interval: Duration::from_secs(1),
            monitor_poll: Duration::from_millis(200),
        }
    }
}

/// The running game, its process, and its open session.
struct RunningGame {
    launch_id: u64,
    child: Child,
    game: Game,
    session: PlaySession,
    started: Instant,
}

#[derive(Default)]
struct Slot {
    running: Option<RunningGame>,
    /// Game a countdown is running for
    counting_down: Option<String>,
    /// Game whose session is being closed, after it left `running`
    finishing: Option<String>,
    closed: bool,
}

impl Slot {
    /// Take the running game for end-of-session bookkeeping. The slot stays
    /// busy until [`Shared::finish`] releases it.
    fn take_for_finish(&mut self) -> Option<RunningGame> {
        let running = self.running.take()?;
        self.finishing = Some(running.game.display_name());
        Some(running)
    }
}

struct Shared {
    recorder: SessionRecorder,
    events: EventSender,
    countdown: CountdownScheduler,
    countdown_token: Mutex<CancelToken>,
    slot: Mutex<Slot>,
    next_launch_id: AtomicU64,
    monitor_poll: Duration,
    executor: SerialExecutor,
}

/// Launches games, monitors them, and records their play sessions.
pub struct GameLifecycleCoordinator {
    shared: Arc<Shared>,
}

impl GameLifecycleCoordinator {
    /// Create a coordinator and spawn its worker thread.
    pub fn new(
        store: Arc<dyn GameStore>,
        events: EventSender,
        options: CoordinatorOptions,
    ) -> std::io::Result<Self> {
        let executor = SerialExecutor::spawn("game-lifecycle")?;
        Ok(Self {
            shared: Arc::new(Shared {
                recorder: SessionRecorder::new(store),
                events,
                countdown: CountdownScheduler::new(options.countdown_interval),
                countdown_token: Mutex::new(CancelToken::new()),
                slot: Mutex::new(Slot::default()),
                next_launch_id: AtomicU64::new(1),
                monitor_poll: options.monitor_poll,
                executor,
            }),
        })
    }

    /// Count down `seconds` and then launch `game`, in the background.
    ///
    /// Posts `CountdownTick` once per second, then `CountdownFinished`
    /// followed by the launch. If [`cancel_countdown`](Self::cancel_countdown)
    /// is called first, posts `CountdownCancelled` and launches nothing. A
    /// launch failure after the countdown is posted as `LaunchFailed`.
    ///
    /// Returns `false` if the coordinator has been shut down.
    pub fn launch_with_countdown(&self, game: Game, seconds: u32) -> bool {
        let token = lock(&self.shared.countdown_token, "countdown token").clone();
        let shared = self.shared.clone();
        self.shared
            .executor
            .submit(move || shared.run_countdown(game, seconds, &token))
    }

    /// Interrupt any pending or in-progress countdown.
    pub fn cancel_countdown(&self) {
        let old = std::mem::take(&mut *lock(&self.shared.countdown_token, "countdown token"));
        old.cancel();
    }

    /// Launch `game` now.
    ///
    /// On success the session is open, `GameStarted` has been posted, and the
    /// exit monitor is scheduled. Returns the new session's id.
    /// Fails while a countdown is in progress on this coordinator.
    pub fn launch(&self, game: Game) -> Result<SessionId, LaunchError> {
        self.shared.start(game, false)
    }

    /// Terminate the running game and finish its session.
    ///
    /// Returns `true` if a live process was stopped. A game that already
    /// exited but was not yet noticed by the exit monitor still has its
    /// session finished here, and `false` is returned. Bookkeeping has
    /// completed by the time this returns.
    pub fn force_stop(&self) -> bool {
        let (running, alive) = {
            let mut slot = lock(&self.shared.slot, "game slot");
            let alive = match slot.running.as_mut() {
                Some(running) => !matches!(running.child.try_wait(), Ok(Some(_))),
                None => return false,
            };
            (slot.take_for_finish(), alive)
        };

        let Some(running) = running else {
            return false;
        };
        if alive {
            self.shared.terminate(running);
        } else {
            tracing::info!("{} had already exited", running.game.display_name());
            self.shared.finish(running);
        }
        alive
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared.slot, "game slot").running.is_some()
    }

    pub fn current_game(&self) -> Option<Game> {
        lock(&self.shared.slot, "game slot")
            .running
            .as_ref()
            .map(|r| r.game.clone())
    }

    /// Time since the current game was launched, or zero if none is running.
    pub fn current_session_elapsed(&self) -> Duration {
        lock(&self.shared.slot, "game slot")
            .running
            .as_ref()
            .map(|r| r.started.elapsed())
            .unwrap_or_default()
    }

    /// Cancel countdowns, stop the running game, and join the worker thread.
    ///
    /// Launches attempted afterwards fail with [`LaunchError::ShuttingDown`].
    pub fn shutdown(&self) {
        self.cancel_countdown();

        let running = {
            let mut slot = lock(&self.shared.slot, "game slot");
            slot.closed = true;
            slot.take_for_finish()
        };
        if let Some(running) = running {
            self.shared.terminate(running);
        }

        self.shared.executor.shutdown();
    }
}

impl Drop for GameLifecycleCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Shared {
    fn run_countdown(self: &Arc<Self>, game: Game, seconds: u32, token: &CancelToken) {
        let game_id = game.id;
        tracing::info!(
            "Starting {}s countdown for {}",
            seconds,
            game.display_name()
        );
        lock(&self.slot, "game slot").counting_down = Some(game.display_name());

        let outcome = self.countdown.run(seconds, token, |remaining| {
            self.events
                .send(LauncherEvent::CountdownTick { game_id, remaining });
        });

        if outcome == CountdownOutcome::Cancelled {
            lock(&self.slot, "game slot").counting_down = None;
            tracing::info!("Countdown cancelled for {}", game.display_name());
            self.events.send(LauncherEvent::CountdownCancelled { game_id });
            return;
        }

        self.events.send(LauncherEvent::CountdownFinished { game_id });

        if let Err(e) = self.start(game, true) {
            tracing::warn!("Launch after countdown failed: {}", e);
            self.events.send(LauncherEvent::LaunchFailed {
                game_id,
                reason: e.to_string(),
            });
        }
    }

    /// Spawn `game` and open its session. `from_countdown` is set when the
    /// countdown that owns the slot is handing over to its own launch.
    fn start(self: &Arc<Self>, game: Game, from_countdown: bool) -> Result<SessionId, LaunchError> {
        // Held across spawn so two launches cannot both see an empty slot.
        let mut slot = lock(&self.slot, "game slot");
        if from_countdown {
            slot.counting_down = None;
        }
        if slot.closed {
            return Err(LaunchError::ShuttingDown);
        }
        if let Some(title) = &slot.counting_down {
            return Err(LaunchError::CountdownInProgress {
                title: title.clone(),
            });
        }
        let busy = slot
            .running
            .as_ref()
            .map(|r| r.game.display_name())
            .or_else(|| slot.finishing.clone());
        if let Some(title) = busy {
            return Err(LaunchError::ProcessAlreadyRunning { title });
        }

        let exe_path = match game.executable_path() {
            Some(path) if path.exists() => path,
            other => {
                return Err(LaunchError::ExecutableNotFound {
                    path: other.map(|p| p.display().to_string()).unwrap_or_default(),
                });
            }
        };

        tracing::info!("Launching {}: {}", game.display_name(), exe_path.display());

        let child = Command::new(&exe_path)
            .current_dir(&game.install_path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                path: exe_path.display().to_string(),
                source,
            })?;

        let session = self.recorder.open(&game, Local::now());
        let session_id = session.id;
        let game_id = game.id;
        let launch_id = self.next_launch_id.fetch_add(1, Ordering::Relaxed);

        tracing::info!("Game started: {} (pid {})", game.display_name(), child.id());

        slot.running = Some(RunningGame {
            launch_id,
            child,
            game,
            session,
            started: Instant::now(),
        });
        drop(slot);

        self.events
            .send(LauncherEvent::GameStarted { game_id, session_id });

        let shared = self.clone();
        if !self.executor.submit(move || shared.monitor(launch_id)) {
            tracing::warn!("Exit monitor could not be scheduled; use force_stop to end the session");
        }

        Ok(session_id)
    }

    /// Wait for launch `launch_id` to exit, then finish its session.
    ///
    /// Returns early if a forced stop has already taken the slot.
    fn monitor(&self, launch_id: u64) {
        loop {
            let exited = {
                let mut slot = lock(&self.slot, "game slot");
                let Some(running) = slot.running.as_mut() else {
                    return;
                };
                if running.launch_id != launch_id {
                    return;
                }

                match running.child.try_wait() {
                    Ok(Some(status)) => {
                        tracing::debug!("Game process exited: {}", status);
                        slot.take_for_finish()
                    }
                    Ok(None) => None,
                    Err(e) => {
                        tracing::warn!("Failed to poll game process, ending session: {}", e);
                        slot.take_for_finish()
                    }
                }
            };

            if let Some(running) = exited {
                self.finish(running);
                return;
            }

            thread::sleep(self.monitor_poll);
        }
    }

    /// Kill a game taken out of the slot and finish its session.
    fn terminate(&self, mut running: RunningGame) {
        tracing::info!("Force stopping {}", running.game.display_name());
        if let Err(e) = running.child.kill() {
            tracing::debug!("Kill failed (process may have exited): {}", e);
        }
        if let Err(e) = running.child.wait() {
            tracing::warn!("Failed to reap game process: {}", e);
        }
        self.finish(running);
    }

    /// End-of-session bookkeeping. Called exactly once per launch, by the
    /// caller that took the game out of the slot, and releases the slot.
    fn finish(&self, running: RunningGame) {
        let RunningGame {
            game, mut session, ..
        } = running;

        let now = Local::now();
        self.recorder.close(&mut session, now);

        // Prefer the stored record so edits made while playing are kept.
        let mut game = self
            .recorder
            .store()
            .game_by_id(game.id)
            .unwrap_or(game);
        let total_play_seconds = self.recorder.refresh_totals(&mut game, now);
        lock(&self.slot, "game slot").finishing = None;

        tracing::info!(
            "Game ended: {} after {}",
            game.display_name(),
            session.formatted_duration()
        );

        self.events.send(LauncherEvent::GameEnded {
            game_id: game.id,
            session,
            total_play_seconds,
        });
    }
}
