//! Keyboard control modality.
//!
//! While a session is active the keyboard drives the remote pointer directly:
//!
//! | key                    | action                                  |
//! |------------------------|-----------------------------------------|
//! | arrows, W/A/S/D        | move by `arrow_move_distance`           |
//! | Control / Shift (held) | multiply the move distance              |
//! | Space                  | Start on press, Stop on release         |
//! | C                      | pause / resume pointer motion           |
//! | R                      | ask the receiver to reinitialise        |
//! | Q                      | end the session                         |
//! | Escape                 | close the message display               |
//!
//! While no session is active only the configured start shortcut and Escape
//! do anything.

use std::time::Duration;

use crate::domain::config::InputOptions;
use crate::keymap::{KeyCode, Modifiers};
use crate::protocol::messages::{ControlMessage, Displacement};

/// Delay between the quit key and the actual teardown, so key handlers still
/// running for the same key press see the session as active.
pub const QUIT_DELAY: Duration = Duration::from_millis(20);

/// What the session should do in response to a key event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    /// Start a session from the keyboard.
    Activate,
    /// Send this message on the channel.
    Send(ControlMessage),
    /// End the session after the given delay.
    Quit(Duration),
    /// Toggle the motion pause flag.
    TogglePause,
    /// Close any open message on the display.
    DismissMessage,
}

/// Scales a base arrow distance by the held modifiers.
///
/// Each multiplier is applied in turn and the result rounded, so Control and
/// Shift together compose multiplicatively.
pub fn move_distance(base: u32, modifiers: Modifiers, control: f64, shift: f64) -> f64 {
    let mut distance = f64::from(base);
    if modifiers.ctrl {
        distance = (distance * control).round();
    }
    if modifiers.shift {
        distance = (distance * shift).round();
    }
    distance
}

/// Translates key events into [`KeyAction`]s.
#[derive(Debug, Clone)]
pub struct KeyboardController {
    start_shortcut: KeyCode,
    arrow_distance: u32,
    control_multiplier: f64,
    shift_multiplier: f64,
    holding: bool,
}

impl KeyboardController {
    pub fn new(opts: &InputOptions) -> Self {
        Self {
            start_shortcut: opts.start_shortcut,
            arrow_distance: opts.arrow_move_distance,
            control_multiplier: opts.control_move_multiplier,
            shift_multiplier: opts.shift_move_multiplier,
            holding: false,
        }
    }

    /// Returns `true` while the hold key is down.
    pub fn is_holding(&self) -> bool {
        self.holding
    }

    /// Handles a key press.  `active` is whether a session is currently active.
    pub fn key_down(&mut self, code: KeyCode, modifiers: Modifiers, active: bool) -> Option<KeyAction> {
        if !active {
            return if code == self.start_shortcut {
                Some(KeyAction::Activate)
            } else if code == KeyCode::Escape {
                Some(KeyAction::DismissMessage)
            } else {
                None
            };
        }

        let step = move_distance(
            self.arrow_distance,
            modifiers,
            self.control_multiplier,
            self.shift_multiplier,
        );
        let moved = |x: f64, y: f64| {
            Some(KeyAction::Send(ControlMessage::MoveRelative(Displacement::new(x, y))))
        };

        match code {
            KeyCode::ArrowRight | KeyCode::KeyD => moved(step, 0.0),
            KeyCode::ArrowLeft | KeyCode::KeyA => moved(-step, 0.0),
            KeyCode::ArrowUp | KeyCode::KeyW => moved(0.0, -step),
            KeyCode::ArrowDown | KeyCode::KeyS => moved(0.0, step),
            KeyCode::KeyQ => Some(KeyAction::Quit(QUIT_DELAY)),
            KeyCode::KeyC => Some(KeyAction::TogglePause),
            KeyCode::KeyR => Some(KeyAction::Send(ControlMessage::Reinit)),
            KeyCode::Space => {
                // Auto-repeat must not send a second Start.
                if self.holding {
                    None
                } else {
                    self.holding = true;
                    Some(KeyAction::Send(ControlMessage::Start))
                }
            }
            KeyCode::Escape => Some(KeyAction::DismissMessage),
            _ => None,
        }
    }

    /// Handles a key release.
    pub fn key_up(&mut self, code: KeyCode) -> Option<KeyAction> {
        if code == KeyCode::Space && self.holding {
            self.holding = false;
            Some(KeyAction::Send(ControlMessage::Stop))
        } else {
            None
        }
    }

    /// Forgets any key held when the session ends.
    pub fn reset(&mut self) {
        self.holding = false;
    }
}
