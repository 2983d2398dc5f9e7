//! Raw local input events.
//!
//! An input source (touchscreen driver, mouse hook, keyboard hook, or a test)
//! produces a stream of [`InputEvent`]s.  Coordinates are absolute positions in
//! the local surface's coordinate space; the engine only ever uses differences
//! between them.
//!
//! # Serde representation
//!
//! Events are internally tagged so they can be streamed as JSON lines:
//!
//! ```json
//! {"type":"TouchStart","x":120.0,"y":340.5}
//! {"type":"KeyDown","code":"ArrowLeft","modifiers":{"shift":true}}
//! ```

use std::ops::Sub;

use serde::{Deserialize, Serialize};

use crate::keymap::{KeyCode, Modifiers};

/// An absolute position on the local input surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length of this point treated as a vector.
    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A single raw input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputEvent {
    /// A finger touched the surface.
    TouchStart { x: f64, y: f64 },
    /// A touching finger moved.
    TouchMove { x: f64, y: f64 },
    /// The finger was lifted.
    TouchEnd,
    /// A mouse button was pressed.
    MouseDown { x: f64, y: f64 },
    /// The mouse moved (with or without a button held).
    MouseMove { x: f64, y: f64 },
    /// A mouse button was released.
    MouseUp,
    /// A key was pressed.  `repeat` is set for auto-repeat events.
    KeyDown {
        code: KeyCode,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        repeat: bool,
    },
    /// A key was released.
    KeyUp { code: KeyCode },
}

impl InputEvent {
    /// Returns `true` for the touch-family events.
    pub fn is_touch(&self) -> bool {
        matches!(
            self,
            InputEvent::TouchStart { .. } | InputEvent::TouchMove { .. } | InputEvent::TouchEnd
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_subtraction() {
        let d = Point::new(10.0, 4.0) - Point::new(3.0, 6.0);
        assert_eq!(d, Point::new(7.0, -2.0));
    }

    #[test]
    fn test_point_length() {
        assert_eq!(Point::new(3.0, 4.0).length(), 5.0);
    }

    #[test]
    fn test_touch_start_parses_from_json_line() {
        let ev: InputEvent = serde_json::from_str(r#"{"type":"TouchStart","x":1,"y":2.5}"#).unwrap();
        assert_eq!(ev, InputEvent::TouchStart { x: 1.0, y: 2.5 });
    }

    #[test]
    fn test_key_down_defaults_modifiers_and_repeat() {
        // Arrange: a minimal key-down line
        let line = r#"{"type":"KeyDown","code":"KeyR"}"#;

        // Act
        let ev: InputEvent = serde_json::from_str(line).unwrap();

        // Assert
        assert_eq!(
            ev,
            InputEvent::KeyDown {
                code: KeyCode::KeyR,
                modifiers: Modifiers::NONE,
                repeat: false,
            }
        );
    }

    #[test]
    fn test_is_touch() {
        assert!(InputEvent::TouchEnd.is_touch());
        assert!(!InputEvent::MouseUp.is_touch());
    }
}
