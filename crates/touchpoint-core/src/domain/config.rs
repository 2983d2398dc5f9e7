//! Tuning options for the gesture and motion engine.
//!
//! [`InputOptions`] is read once when a session starts.  It lives in the core
//! crate (rather than next to the TOML loader in the client) because every
//! state machine here is parameterised by it.
//!
//! All durations are stored as integer **milliseconds** so the TOML file stays
//! human-editable:
//!
//! ```toml
//! [input]
//! touch_wait_duration = 200
//! sensitivity = 2.0
//! start_shortcut = "KeyE"
//! ```
//!
//! Every field has a `#[serde(default = "...")]` helper, so a partial file (or
//! an older file missing newer options) still loads.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keymap::KeyCode;

/// Error returned by [`InputOptions::validate`].
#[derive(Debug, Clone, Error, PartialEq)]
#[error("invalid input option `{field}`: {reason}")]
pub struct InvalidOption {
    pub field: &'static str,
    pub reason: String,
}

/// Client-side gesture, motion and keyboard options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputOptions {
    /// Start a session when a touch is held for `start_press_duration`.
    #[serde(default = "default_true")]
    pub start_on_longpress: bool,
    /// Hold time (ms) that starts a session.
    #[serde(default = "default_start_press_duration")]
    pub start_press_duration: u64,
    /// Start a session on a swipe longer than `start_swipe_min_distance`.
    #[serde(default)]
    pub start_on_swipe: bool,
    /// Report touch events consumed by start detection back to the input
    /// source as suppressed.
    #[serde(default)]
    pub swipe_prevent_default: bool,
    /// Minimum net swipe distance (surface units) that starts a session.
    #[serde(default = "default_start_swipe_min_distance")]
    pub start_swipe_min_distance: u32,
    /// Quiet time (ms) after the last touch-end before a tap sequence is
    /// classified.
    #[serde(default = "default_touch_wait_duration")]
    pub touch_wait_duration: u64,
    /// Maximum displacement per axis for a touch to still count as a tap.
    #[serde(default = "default_tap_distance_cutoff")]
    pub tap_distance_cutoff: u32,
    /// Tap sequences with more move events than this are drags and are
    /// discarded.
    #[serde(default = "default_move_event_cutoff")]
    pub move_event_cutoff: u32,
    /// Hold time (ms) between Start and Stop for a single tap.
    #[serde(default = "default_short_press_duration")]
    pub short_press_duration: u64,
    /// Hold time (ms) between Start and Stop for a double tap.
    #[serde(default = "default_long_press_duration")]
    pub long_press_duration: u64,
    /// Minimum interval (ms) between two motion messages of one burst.
    #[serde(default = "default_move_send_wait")]
    pub move_send_wait: u64,
    /// Delay (ms) after which the last unsent motion sample is flushed.
    #[serde(default = "default_final_move_send_delay")]
    pub final_move_send_delay: u64,
    /// Multiplier from surface units to receiver units.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    /// Base distance of one arrow-key move.
    #[serde(default = "default_arrow_move_distance")]
    pub arrow_move_distance: u32,
    /// Arrow-key distance multiplier while Control is held.
    #[serde(default = "default_control_move_multiplier")]
    pub control_move_multiplier: f64,
    /// Arrow-key distance multiplier while Shift is held.
    #[serde(default = "default_shift_move_multiplier")]
    pub shift_move_multiplier: f64,
    /// Key that starts a session from Idle.
    #[serde(default = "default_start_shortcut")]
    pub start_shortcut: KeyCode,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_start_press_duration() -> u64 {
    1000
}
fn default_start_swipe_min_distance() -> u32 {
    200
}
fn default_touch_wait_duration() -> u64 {
    200
}
fn default_tap_distance_cutoff() -> u32 {
    5
}
fn default_move_event_cutoff() -> u32 {
    10
}
fn default_short_press_duration() -> u64 {
    1
}
fn default_long_press_duration() -> u64 {
    600
}
fn default_move_send_wait() -> u64 {
    500
}
fn default_final_move_send_delay() -> u64 {
    100
}
fn default_sensitivity() -> f64 {
    2.0
}
fn default_arrow_move_distance() -> u32 {
    20
}
fn default_control_move_multiplier() -> f64 {
    3.0
}
fn default_shift_move_multiplier() -> f64 {
    6.0
}
fn default_start_shortcut() -> KeyCode {
    KeyCode::KeyE
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            start_on_longpress: default_true(),
            start_press_duration: default_start_press_duration(),
            start_on_swipe: false,
            swipe_prevent_default: false,
            start_swipe_min_distance: default_start_swipe_min_distance(),
            touch_wait_duration: default_touch_wait_duration(),
            tap_distance_cutoff: default_tap_distance_cutoff(),
            move_event_cutoff: default_move_event_cutoff(),
            short_press_duration: default_short_press_duration(),
            long_press_duration: default_long_press_duration(),
            move_send_wait: default_move_send_wait(),
            final_move_send_delay: default_final_move_send_delay(),
            sensitivity: default_sensitivity(),
            arrow_move_distance: default_arrow_move_distance(),
            control_move_multiplier: default_control_move_multiplier(),
            shift_move_multiplier: default_shift_move_multiplier(),
            start_shortcut: default_start_shortcut(),
        }
    }
}

impl InputOptions {
    pub fn start_press(&self) -> Duration {
        Duration::from_millis(self.start_press_duration)
    }

    pub fn touch_wait(&self) -> Duration {
        Duration::from_millis(self.touch_wait_duration)
    }

    pub fn short_press(&self) -> Duration {
        Duration::from_millis(self.short_press_duration)
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_duration)
    }

    pub fn move_send_interval(&self) -> Duration {
        Duration::from_millis(self.move_send_wait)
    }

    pub fn final_move_delay(&self) -> Duration {
        Duration::from_millis(self.final_move_send_delay)
    }

    /// Checks option values that would make the engine misbehave.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvalidOption`] found.
    pub fn validate(&self) -> Result<(), InvalidOption> {
        fn positive(field: &'static str, value: f64) -> Result<(), InvalidOption> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(InvalidOption {
                    field,
                    reason: format!("must be a finite number greater than 0, got {value}"),
                })
            }
        }

        positive("sensitivity", self.sensitivity)?;
        positive("control_move_multiplier", self.control_move_multiplier)?;
        positive("shift_move_multiplier", self.shift_move_multiplier)?;

        if self.touch_wait_duration == 0 {
            return Err(InvalidOption {
                field: "touch_wait_duration",
                reason: "must be at least 1 ms".to_string(),
            });
        }
        if self.final_move_send_delay == 0 {
            return Err(InvalidOption {
                field: "final_move_send_delay",
                reason: "must be at least 1 ms".to_string(),
            });
        }
        if self.start_on_longpress && self.start_press_duration == 0 {
            return Err(InvalidOption {
                field: "start_press_duration",
                reason: "must be at least 1 ms when start_on_longpress is enabled".to_string(),
            });
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
