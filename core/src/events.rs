//! Notifications from background work to the interface layer.
//!
//! Background threads never call into the interface directly. They post
//! [`LauncherEvent`]s through an [`EventSender`]; the interface owns the
//! matching [`EventQueue`] and drains it on its own turn (once per frame,
//! once per loop iteration, ...). Events from one sender arrive in the order
//! they were sent.

use std::sync::mpsc;
use std::time::Duration;

use thlauncher_shared::{GameId, PlaySession, Replay, SessionId};

use crate::replay::SkippedReplay;

/// Something the interface layer may want to react to.
#[derive(Debug, Clone)]
pub enum LauncherEvent {
    /// One second of a pre-launch countdown, `remaining` counting down to 1
    CountdownTick { game_id: GameId, remaining: u32 },
    /// Countdown ran to completion; the launch follows immediately
    CountdownFinished { game_id: GameId },
    /// Countdown was interrupted; nothing will be launched
    CountdownCancelled { game_id: GameId },
    /// The game process is running and its session is open
    GameStarted { game_id: GameId, session_id: SessionId },
    /// The game process ended and bookkeeping has completed
    GameEnded {
        game_id: GameId,
        session: PlaySession,
        total_play_seconds: i64,
    },
    /// A launch requested from a background countdown failed
    LaunchFailed { game_id: GameId, reason: String },
    /// A background replay scan completed
    ScanFinished {
        replays: Vec<Replay>,
        skipped: Vec<SkippedReplay>,
    },
}

/// Create a connected sender/queue pair.
pub fn channel() -> (EventSender, EventQueue) {
    let (tx, rx) = mpsc::channel();
    (EventSender { tx }, EventQueue { rx })
}

/// Posting side of the event channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<LauncherEvent>,
}

impl EventSender {
    /// Post an event. Dropped silently if the interface has gone away.
    pub fn send(&self, event: LauncherEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Event queue closed; dropping event");
        }
    }
}

/// Receiving side of the event channel, owned by the interface layer.
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::Receiver<LauncherEvent>,
}

impl EventQueue {
    /// Next pending event, without blocking.
    pub fn try_next(&self) -> Option<LauncherEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => None,
        }
    }

    /// Every event pending right now, in send order.
    pub fn drain(&self) -> Vec<LauncherEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Wait up to `timeout` for the next event.
    pub fn next_timeout(&self, timeout: Duration) -> Option<LauncherEvent> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order() {
        let (tx, queue) = channel();
        tx.send(LauncherEvent::CountdownTick {
            game_id: 1,
            remaining: 2,
        });
        tx.send(LauncherEvent::CountdownTick {
            game_id: 1,
            remaining: 1,
        });
        tx.send(LauncherEvent::CountdownFinished { game_id: 1 });

        let events = queue.drain();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0],
            LauncherEvent::CountdownTick { remaining: 2, .. }
        ));
        assert!(matches!(events[2], LauncherEvent::CountdownFinished { .. }));
        assert!(queue.try_next().is_none());
    }

    #[test]
    fn test_send_after_queue_dropped_is_ignored() {
        let (tx, queue) = channel();
        drop(queue);
        tx.send(LauncherEvent::CountdownFinished { game_id: 1 });
    }
}
