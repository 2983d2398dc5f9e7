//! Control protocol message types.
//!
//! The protocol is deliberately tiny: four outbound messages and one inbound
//! message.  Every frame on the socket is a single JSON value.
//!
//! # Outbound (client → receiver)
//!
//! ```json
//! {"Start":null}
//! {"Stop":null}
//! {"MoveRelative":{"x":12.0,"y":-4.0}}
//! "Reinit"
//! ```
//!
//! # Inbound (receiver → client)
//!
//! ```json
//! {"type":"Error","data":"Failed to write event to /dev/input/event1"}
//! ```
//!
//! Any other inbound `type` is decoded as [`ServerMessage::Unknown`] and
//! ignored, so a newer receiver can add message kinds without breaking older
//! clients.

use serde::{Deserialize, Serialize};

// ── Outbound messages ─────────────────────────────────────────────────────────

/// A relative pointer displacement, in receiver units.
///
/// Positive `x` moves the remote pointer right, positive `y` moves it down.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Displacement {
    pub x: f64,
    pub y: f64,
}

impl Displacement {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `true` when both axes are exactly zero.
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// All messages the client sends to the remote receiver.
///
/// Constructed fresh for each emission; never mutated after construction.
///
/// # Serde representation
///
/// `Start` and `Stop` carry an explicit `null` payload to match what existing
/// receivers expect, while `Reinit` is a bare string.  The private
/// [`WireControl`] mirror enum produces exactly that shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireControl", into = "WireControl")]
pub enum ControlMessage {
    /// Begin a press/hold at the remote pointer position.
    Start,
    /// End a press/hold.
    Stop,
    /// Move the remote pointer by a relative amount.
    MoveRelative(Displacement),
    /// Ask the receiver to reinitialise its screen state.
    Reinit,
}

impl ControlMessage {
    /// Returns a short name for log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ControlMessage::Start => "Start",
            ControlMessage::Stop => "Stop",
            ControlMessage::MoveRelative(_) => "MoveRelative",
            ControlMessage::Reinit => "Reinit",
        }
    }
}

/// Exact wire shape of [`ControlMessage`].
///
/// Serde serialises the unit type `()` as JSON `null`, which gives
/// `{"Start":null}` for a newtype variant holding `()`.
#[derive(Serialize, Deserialize)]
enum WireControl {
    Start(()),
    Stop(()),
    MoveRelative(Displacement),
    Reinit,
}

impl From<WireControl> for ControlMessage {
    fn from(wire: WireControl) -> Self {
        match wire {
            WireControl::Start(()) => ControlMessage::Start,
            WireControl::Stop(()) => ControlMessage::Stop,
            WireControl::MoveRelative(d) => ControlMessage::MoveRelative(d),
            WireControl::Reinit => ControlMessage::Reinit,
        }
    }
}

impl From<ControlMessage> for WireControl {
    fn from(msg: ControlMessage) -> Self {
        match msg {
            ControlMessage::Start => WireControl::Start(()),
            ControlMessage::Stop => WireControl::Stop(()),
            ControlMessage::MoveRelative(d) => WireControl::MoveRelative(d),
            ControlMessage::Reinit => WireControl::Reinit,
        }
    }
}

// ── Inbound messages ──────────────────────────────────────────────────────────

/// Messages the receiver sends back to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// The receiver failed to act on a control message.  The payload is shown
    /// to the user verbatim.
    Error(String),
    /// A message kind this client does not understand.  Logged and ignored.
    Unknown {
        /// The value of the frame's `type` field.
        kind: String,
    },
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_serializes_with_null_payload() {
        let json = serde_json::to_string(&ControlMessage::Start).unwrap();
        assert_eq!(json, r#"{"Start":null}"#);
    }

    #[test]
    fn test_stop_serializes_with_null_payload() {
        let json = serde_json::to_string(&ControlMessage::Stop).unwrap();
        assert_eq!(json, r#"{"Stop":null}"#);
    }

    #[test]
    fn test_reinit_serializes_as_bare_string() {
        let json = serde_json::to_string(&ControlMessage::Reinit).unwrap();
        assert_eq!(json, r#""Reinit""#);
    }

    #[test]
    fn test_move_relative_serializes_as_xy_object() {
        // Arrange
        let msg = ControlMessage::MoveRelative(Displacement::new(12.0, -4.5));

        // Act
        let value: serde_json::Value = serde_json::to_value(msg).unwrap();

        // Assert
        assert_eq!(value["MoveRelative"]["x"], 12.0);
        assert_eq!(value["MoveRelative"]["y"], -4.5);
    }

    #[test]
    fn test_move_relative_accepts_integer_coordinates() {
        // Receivers written in other languages may send integers.
        let msg: ControlMessage =
            serde_json::from_str(r#"{"MoveRelative":{"x":3,"y":-7}}"#).unwrap();
        assert_eq!(msg, ControlMessage::MoveRelative(Displacement::new(3.0, -7.0)));
    }

    #[test]
    fn test_displacement_is_zero() {
        assert!(Displacement::default().is_zero());
        assert!(!Displacement::new(0.0, 0.5).is_zero());
    }

    #[test]
    fn test_kind_names_match_wire_tags() {
        assert_eq!(ControlMessage::Start.kind(), "Start");
        assert_eq!(ControlMessage::Stop.kind(), "Stop");
        assert_eq!(ControlMessage::Reinit.kind(), "Reinit");
        assert_eq!(
            ControlMessage::MoveRelative(Displacement::default()).kind(),
            "MoveRelative"
        );
    }
}
