//! Cancelable one-shot timers for the session task.
//!
//! The session runs as a single task, so a timer cannot call back into it
//! directly.  Instead, each [`CancelableTask`] sleeps in its own small Tokio
//! task and then posts a [`TimerFired`] into the session's timer queue, where
//! it is handled in order with input events.
//!
//! # Why timers carry tickets
//!
//! Aborting a Tokio task does not retract a message it already posted.  A
//! timer can fire, post its [`TimerFired`], and then be "cancelled" before the
//! session reads the queue.  Every schedule therefore gets a fresh ticket, and
//! [`TimerSet::take_if_current`] only accepts a firing whose ticket still
//! matches the slot.  The session additionally stamps each timer with its own
//! generation so nothing scheduled by a torn-down session can act on a new one.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// The deferred actions a session can have pending.  Each kind has at most one
/// live timer at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Quiet window after the last touch-end; classifies the tap sequence.
    Classify,
    /// Sends the last unsent motion sample.
    MotionFlush,
    /// Sends Stop at the end of a short or long press.
    PressRelease,
    /// Long press on the first touch that starts a session.
    StartLongPress,
    /// Deferred teardown after the quit key.
    Quit,
}

impl TimerKind {
    const ALL: [TimerKind; 5] = [
        TimerKind::Classify,
        TimerKind::MotionFlush,
        TimerKind::PressRelease,
        TimerKind::StartLongPress,
        TimerKind::Quit,
    ];

    fn slot(self) -> usize {
        match self {
            TimerKind::Classify => 0,
            TimerKind::MotionFlush => 1,
            TimerKind::PressRelease => 2,
            TimerKind::StartLongPress => 3,
            TimerKind::Quit => 4,
        }
    }
}

/// Posted to the session when a timer's delay has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub kind: TimerKind,
    /// Session generation at scheduling time.
    pub generation: u64,
    /// Unique per schedule; see [`TimerSet::take_if_current`].
    pub ticket: u64,
}

/// A single scheduled timer.  Dropping it cancels it.
#[derive(Debug)]
pub struct CancelableTask {
    ticket: u64,
    handle: JoinHandle<()>,
}

impl CancelableTask {
    /// Spawns a task that posts `fired` to `queue` after `delay`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule(delay: Duration, fired: TimerFired, queue: mpsc::UnboundedSender<TimerFired>) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The session may already be gone; nothing to do then.
            let _ = queue.send(fired);
        });
        Self {
            ticket: fired.ticket,
            handle,
        }
    }

    /// Cancels the timer.  Has no effect if it already fired.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for CancelableTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// One slot per [`TimerKind`].  Scheduling a kind replaces (and cancels) the
/// timer already in its slot.
#[derive(Debug)]
pub struct TimerSet {
    slots: [Option<CancelableTask>; 5],
    next_ticket: u64,
    queue: mpsc::UnboundedSender<TimerFired>,
}

impl TimerSet {
    /// Creates an empty set posting into a fresh queue; returns the set and the
    /// receiving end of that queue.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerFired>) {
        let (queue, rx) = mpsc::unbounded_channel();
        (
            Self {
                slots: Default::default(),
                next_ticket: 0,
                queue,
            },
            rx,
        )
    }

    /// Arms the `kind` timer, cancelling any earlier one of the same kind.
    pub fn schedule(&mut self, kind: TimerKind, delay: Duration, generation: u64) {
        self.next_ticket += 1;
        let fired = TimerFired {
            kind,
            generation,
            ticket: self.next_ticket,
        };
        trace!(?kind, delay_ms = delay.as_millis() as u64, "timer armed");
        // Assigning drops (and so aborts) the previous task.
        self.slots[kind.slot()] = Some(CancelableTask::schedule(delay, fired, self.queue.clone()));
    }

    /// Cancels the `kind` timer if one is pending.
    pub fn cancel(&mut self, kind: TimerKind) {
        if let Some(task) = self.slots[kind.slot()].take() {
            task.cancel();
        }
    }

    /// Cancels every pending timer.
    pub fn cancel_all(&mut self) {
        for kind in TimerKind::ALL {
            self.cancel(kind);
        }
    }

    /// Returns `true` if a `kind` timer is armed and not yet consumed.
    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    /// Accepts a firing if it belongs to the timer currently in its slot and
    /// empties the slot.  Firings of replaced or cancelled timers return
    /// `false`.
    pub fn take_if_current(&mut self, fired: &TimerFired) -> bool {
        let slot = &mut self.slots[fired.kind.slot()];
        match slot {
            Some(task) if task.ticket == fired.ticket => {
                *slot = None;
                true
            }
            _ => false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, sleep};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        // Arrange
        let (mut timers, mut rx) = TimerSet::new();

        // Act
        timers.schedule(TimerKind::Classify, ms(200), 1);
        sleep(ms(199)).await;
        let early = rx.try_recv();
        sleep(ms(2)).await;
        let fired = rx.try_recv().expect("timer should have fired");

        // Assert
        assert!(early.is_err());
        assert_eq!(fired.kind, TimerKind::Classify);
        assert_eq!(fired.generation, 1);
        assert!(timers.take_if_current(&fired));
        assert!(!timers.is_pending(TimerKind::Classify));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_replaces_previous_timer() {
        let (mut timers, mut rx) = TimerSet::new();
        timers.schedule(TimerKind::MotionFlush, ms(100), 0);
        sleep(ms(50)).await;
        timers.schedule(TimerKind::MotionFlush, ms(100), 0);

        sleep(ms(200)).await;

        let fired = rx.try_recv().expect("second timer fires");
        assert!(timers.take_if_current(&fired));
        assert!(rx.try_recv().is_err(), "first timer must not fire");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_posts() {
        let (mut timers, mut rx) = TimerSet::new();
        timers.schedule(TimerKind::Quit, ms(20), 0);
        timers.cancel(TimerKind::Quit);

        sleep(ms(100)).await;

        assert!(rx.try_recv().is_err());
        assert!(!timers.is_pending(TimerKind::Quit));
    }

    #[tokio::test(start_paused = true)]
    async fn test_firing_posted_before_cancel_is_rejected() {
        // Arrange: let the timer post, then cancel before reading the queue
        let (mut timers, mut rx) = TimerSet::new();
        timers.schedule(TimerKind::PressRelease, ms(10), 0);
        sleep(ms(20)).await;
        timers.cancel(TimerKind::PressRelease);

        // Act
        let fired = rx.try_recv().expect("already posted");

        // Assert
        assert!(!timers.take_if_current(&fired));
    }

    #[tokio::test(start_paused = true)]
    async fn test_firing_of_replaced_timer_is_rejected() {
        let (mut timers, mut rx) = TimerSet::new();
        timers.schedule(TimerKind::Classify, ms(10), 0);
        sleep(ms(20)).await;
        timers.schedule(TimerKind::Classify, ms(10), 0);

        let stale = rx.try_recv().expect("first firing already posted");
        assert!(!timers.take_if_current(&stale));
        assert!(timers.is_pending(TimerKind::Classify));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_clears_every_slot() {
        let (mut timers, mut rx) = TimerSet::new();
        for kind in TimerKind::ALL {
            timers.schedule(kind, ms(5), 0);
        }

        timers.cancel_all();
        advance(ms(10)).await;
        tokio::task::yield_now().await;

        for kind in TimerKind::ALL {
            assert!(!timers.is_pending(kind));
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelable_task_drop_aborts() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let fired = TimerFired {
            kind: TimerKind::Quit,
            generation: 0,
            ticket: 1,
        };
        let task = CancelableTask::schedule(ms(5), fired, tx);
        drop(task);

        sleep(ms(10)).await;

        assert!(rx.try_recv().is_err());
    }
}
