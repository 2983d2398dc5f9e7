//! Tap-sequence classification and session start triggers.
//!
//! # How tap classification works (for beginners)
//!
//! A finger on a touchscreen produces `start → move* → end`.  A *tap* is a
//! touch that is short (under [`TAP_DURATION_CEILING`]) and nearly stationary
//! (both axes within `tap_distance_cutoff`).  Taps are counted in a
//! [`TapSequence`] until the surface has been quiet for `touch_wait_duration`
//! after the last touch-end; only then is the sequence classified:
//!
//! | taps | intent                                         |
//! |------|------------------------------------------------|
//! | 1    | [`Intent::ShortPress`] (Start, short hold, Stop)|
//! | 2    | [`Intent::LongPress`] (Start, long hold, Stop)  |
//! | 3    | [`Intent::StopDetection`] (end the session)     |
//! | else | nothing                                        |
//!
//! The classifier owns no timer.  [`GestureClassifier::touch_start`] and
//! [`GestureClassifier::touch_end`] return a [`ClassifyTimer`] command telling
//! the caller to cancel or (re)arm the single classification timer, and the
//! caller calls [`GestureClassifier::classify`] when that timer fires.
//!
//! [`StartTrigger`] handles the touches made *before* a session exists: a long
//! hold or a long swipe starts one.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::config::InputOptions;
use crate::domain::input::Point;
use crate::protocol::messages::Displacement;

/// Touches held at least this long are never taps.
pub const TAP_DURATION_CEILING: Duration = Duration::from_millis(500);

/// A classified discrete user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Start, hold for `short_press_duration`, Stop.
    ShortPress,
    /// Start, hold for `long_press_duration`, Stop.
    LongPress,
    /// End the session.
    StopDetection,
}

impl Intent {
    /// Returns how long Start is held before Stop, or `None` for intents that
    /// do not press.
    pub fn hold_duration(&self, opts: &InputOptions) -> Option<Duration> {
        match self {
            Intent::ShortPress => Some(opts.short_press()),
            Intent::LongPress => Some(opts.long_press()),
            Intent::StopDetection => None,
        }
    }
}

/// What the caller must do with its classification timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyTimer {
    /// Cancel the pending timer, if any.
    Cancel,
    /// Cancel the pending timer and arm a new one after this delay.
    Schedule(Duration),
}

/// Taps counted inside the current wait window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TapSequence {
    /// Touches classified as taps since the window opened.
    pub count: u32,
    /// Move events seen since the window opened.
    pub move_events: u32,
    /// Move events seen during the touch in progress.
    pub touch_moves: u32,
    /// Where the touch in progress started, if one is in progress.
    pub origin: Option<Point>,
    /// Last position seen for the touch in progress.
    pub last: Point,
    /// When the touch in progress started.
    pub started_at: Option<Instant>,
}

impl TapSequence {
    fn clear(&mut self) {
        *self = TapSequence::default();
    }
}

/// Classifies touches made while a session is active into [`Intent`]s.
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    tap_distance_cutoff: f64,
    move_event_cutoff: u32,
    touch_wait: Duration,
    sequence: TapSequence,
}

impl GestureClassifier {
    pub fn new(opts: &InputOptions) -> Self {
        Self {
            tap_distance_cutoff: f64::from(opts.tap_distance_cutoff),
            move_event_cutoff: opts.move_event_cutoff,
            touch_wait: opts.touch_wait(),
            sequence: TapSequence::default(),
        }
    }

    /// Read-only view of the sequence being accumulated.
    pub fn sequence(&self) -> &TapSequence {
        &self.sequence
    }

    /// A finger touched the surface.
    ///
    /// Any pending classification is postponed: the caller must cancel its
    /// timer, and the next [`touch_end`](Self::touch_end) re-arms it.
    pub fn touch_start(&mut self, at: Point, now: Instant) -> ClassifyTimer {
        self.sequence.origin = Some(at);
        self.sequence.last = at;
        self.sequence.started_at = Some(now);
        self.sequence.touch_moves = 0;
        ClassifyTimer::Cancel
    }

    /// A touching finger moved.
    pub fn touch_move(&mut self, at: Point) {
        self.sequence.last = at;
        self.sequence.touch_moves = self.sequence.touch_moves.saturating_add(1);
        self.sequence.move_events = self.sequence.move_events.saturating_add(1);
    }

    /// The finger was lifted.
    ///
    /// Counts the touch as a tap or, if it was too long or moved too far,
    /// throws away the whole sequence.  Either way the classification timer is
    /// re-armed, so only the last touch-end of a burst drives classification.
    pub fn touch_end(&mut self, now: Instant) -> ClassifyTimer {
        let tap = match (self.sequence.origin, self.sequence.started_at) {
            (Some(origin), Some(started_at)) => {
                let held = now.saturating_duration_since(started_at);
                let moved = self.sequence.last - origin;
                let is_tap = held < TAP_DURATION_CEILING
                    && moved.x.abs() <= self.tap_distance_cutoff
                    && moved.y.abs() <= self.tap_distance_cutoff;
                debug!(
                    held_ms = held.as_millis() as u64,
                    dx = moved.x,
                    dy = moved.y,
                    moves = self.sequence.touch_moves,
                    is_tap,
                    "touch ended"
                );
                is_tap
            }
            _ => false,
        };

        if tap {
            self.sequence.count = self.sequence.count.saturating_add(1);
            self.sequence.origin = None;
            self.sequence.started_at = None;
        } else {
            self.sequence.clear();
        }
        ClassifyTimer::Schedule(self.touch_wait)
    }

    /// Classifies the accumulated sequence and clears it.
    ///
    /// Called when the classification timer fires.
    pub fn classify(&mut self) -> Option<Intent> {
        let TapSequence {
            count, move_events, ..
        } = self.sequence;
        self.sequence.clear();

        if move_events > self.move_event_cutoff {
            debug!(
                count,
                move_events, "tap sequence discarded as a drag"
            );
            return None;
        }

        let intent = match count {
            1 => Some(Intent::ShortPress),
            2 => Some(Intent::LongPress),
            3 => Some(Intent::StopDetection),
            _ => None,
        };
        debug!(count, move_events, ?intent, "tap sequence classified");
        intent
    }

    /// Drops any accumulated sequence.
    pub fn reset(&mut self) {
        self.sequence.clear();
    }
}

// ── Start trigger ─────────────────────────────────────────────────────────────

/// A touch gesture that asks for a session to start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerEvent {
    /// The first touch was held for `start_press_duration`.
    LongPress,
    /// A swipe longer than `start_swipe_min_distance`.  Carries the net
    /// displacement already scaled by sensitivity, ready to send once the
    /// channel is open.
    Swipe(Displacement),
}

/// Watches touches while no session is active and decides when to start one.
#[derive(Debug, Clone)]
pub struct StartTrigger {
    on_longpress: bool,
    press_duration: Duration,
    on_swipe: bool,
    swipe_min_distance: f64,
    consume_swipes: bool,
    sensitivity: f64,
    origin: Option<Point>,
    last: Point,
}

impl StartTrigger {
    pub fn new(opts: &InputOptions) -> Self {
        Self {
            on_longpress: opts.start_on_longpress,
            press_duration: opts.start_press(),
            on_swipe: opts.start_on_swipe,
            swipe_min_distance: f64::from(opts.start_swipe_min_distance),
            consume_swipes: opts.swipe_prevent_default,
            sensitivity: opts.sensitivity,
            origin: None,
            last: Point::default(),
        }
    }

    /// Returns `true` when touch events watched by this trigger should be
    /// reported back to the input source as consumed.
    pub fn consumes_touch(&self) -> bool {
        self.on_swipe && self.consume_swipes
    }

    /// A finger touched the surface.  Returns the delay after which
    /// [`long_press_elapsed`](Self::long_press_elapsed) should be called, if
    /// long-press starting is enabled.
    pub fn press(&mut self, at: Point) -> Option<Duration> {
        self.origin = Some(at);
        self.last = at;
        self.on_longpress.then_some(self.press_duration)
    }

    /// A touching finger moved.
    pub fn motion(&mut self, at: Point) {
        if self.origin.is_some() {
            self.last = at;
        }
    }

    /// The finger was lifted.  The caller cancels any pending long-press
    /// timer; a long enough swipe starts the session.
    pub fn release(&mut self) -> Option<TriggerEvent> {
        let origin = self.origin.take()?;
        if !self.on_swipe {
            return None;
        }
        let moved = self.last - origin;
        if moved.length() > self.swipe_min_distance {
            debug!(dx = moved.x, dy = moved.y, "swipe start detected");
            Some(TriggerEvent::Swipe(Displacement::new(
                moved.x * self.sensitivity,
                moved.y * self.sensitivity,
            )))
        } else {
            None
        }
    }

    /// The long-press timer fired.  Starts the session if the finger is still
    /// down.
    pub fn long_press_elapsed(&mut self) -> Option<TriggerEvent> {
        if self.on_longpress && self.origin.take().is_some() {
            debug!("long-press start detected");
            Some(TriggerEvent::LongPress)
        } else {
            None
        }
    }

    /// Forgets the touch in progress.
    pub fn reset(&mut self) {
        self.origin = None;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
