//! Rate-limited relative-displacement batching.
//!
//! Pointers report absolute positions far more often than the receiver needs
//! them.  [`MotionBatcher`] turns that stream into at most one displacement per
//! `move_send_wait` while guaranteeing the *last* position of a burst is always
//! delivered: any sample that is not sent immediately becomes the pending
//! sample, and the caller arms a flush timer for it.
//!
//! Displacements are always measured from the last **sent** position, never the
//! last sampled one, so samples that are superseded before being sent are not
//! lost; their movement is included in the next send.
//!
//! # Timer contract
//!
//! The batcher owns no timer.  Each call to [`MotionBatcher::on_sample`]
//! supersedes the previous flush timer; the caller cancels it and, on
//! [`MotionDecision::Defer`], arms a new one that calls
//! [`MotionBatcher::flush`].

use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::config::InputOptions;
use crate::domain::input::Point;
use crate::protocol::messages::Displacement;

/// Outcome of feeding one sample to the batcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionDecision {
    /// Send this displacement now.  Any flush timer is obsolete.
    SendNow(Displacement),
    /// Arm (or re-arm) the flush timer with this delay.
    Defer(Duration),
    /// The sample became the new reference point; nothing to send and any
    /// flush timer is obsolete.
    Rebased,
    /// Sending is paused.  Nothing changed.
    Ignored,
}

/// Converts absolute pointer samples into rate-limited relative displacements.
#[derive(Debug, Clone)]
pub struct MotionBatcher {
    sensitivity: f64,
    send_interval: Duration,
    final_delay: Duration,
    last_sent: Option<Point>,
    pending: Option<Point>,
    burst_started: Option<Instant>,
    last_send_at: Option<Instant>,
    moves: u32,
    paused: bool,
    rebase_next: bool,
}

impl MotionBatcher {
    pub fn new(opts: &InputOptions) -> Self {
        Self {
            sensitivity: opts.sensitivity,
            send_interval: opts.move_send_interval(),
            final_delay: opts.final_move_delay(),
            last_sent: None,
            pending: None,
            burst_started: None,
            last_send_at: None,
            moves: 0,
            paused: false,
            rebase_next: false,
        }
    }

    /// Feeds one absolute pointer sample.
    pub fn on_sample(&mut self, at: Point, now: Instant) -> MotionDecision {
        if self.paused {
            return MotionDecision::Ignored;
        }
        if self.rebase_next {
            self.rebase_next = false;
            self.pending = None;
            self.last_sent = Some(at);
            debug!(x = at.x, y = at.y, "motion reference rebased after unpause");
            return MotionDecision::Rebased;
        }

        let burst_started = *self.burst_started.get_or_insert(now);
        self.moves = self.moves.saturating_add(1);
        self.pending = Some(at);

        let due = match self.last_send_at {
            None => now.saturating_duration_since(burst_started) >= self.send_interval,
            Some(sent_at) => now.saturating_duration_since(sent_at) >= self.send_interval,
        };

        if due {
            MotionDecision::SendNow(self.send(at, now))
        } else {
            MotionDecision::Defer(self.final_delay)
        }
    }

    /// Sends the pending sample, if any.  Called when the flush timer fires.
    pub fn flush(&mut self, now: Instant) -> Option<Displacement> {
        let at = self.pending?;
        Some(self.send(at, now))
    }

    /// Starts a new contact at `origin` (a touch-start).
    ///
    /// Flushes whatever is still pending from the previous contact, then makes
    /// `origin` the reference point so lifting and re-placing a finger never
    /// produces a jump.  The returned displacement, if any, must be sent before
    /// anything produced by later samples.
    ///
    /// The origin is a fresh reference point, so it also satisfies a rebase
    /// still owed from an unpause.
    pub fn begin_burst(&mut self, origin: Point, now: Instant) -> Option<Displacement> {
        let flushed = self.flush(now);
        self.last_sent = Some(origin);
        self.rebase_next = false;
        flushed
    }

    /// Ends the current burst.  The next sample starts a fresh rate window.
    ///
    /// The reference point and any pending sample are kept.
    pub fn end_burst(&mut self) {
        self.moves = 0;
        self.burst_started = None;
        self.last_send_at = None;
    }

    /// Pauses or resumes motion.  The first sample after resuming only
    /// rebases the reference point.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused && !paused {
            self.rebase_next = true;
        }
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Returns `true` if a sample is waiting for the flush timer.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Samples seen in the current burst.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    fn send(&mut self, at: Point, now: Instant) -> Displacement {
        // Receiver convention: moving the local pointer right/down is positive.
        let delta = match self.last_sent {
            Some(last) => Displacement::new(
                (at.x - last.x) * self.sensitivity,
                (at.y - last.y) * self.sensitivity,
            ),
            None => Displacement::default(),
        };
        self.last_sent = Some(at);
        self.last_send_at = Some(now);
        self.pending = None;
        debug!(dx = delta.x, dy = delta.y, "motion sent");
        delta
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
