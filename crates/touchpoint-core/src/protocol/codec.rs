//! JSON codec for the control protocol.
//!
//! One JSON value per WebSocket text frame.  Outbound messages use serde's
//! externally tagged representation (see [`ControlMessage`]); inbound messages
//! use an adjacently tagged object:
//!
//! ```text
//! {"type":"<Kind>","data":<payload>}
//! ```
//!
//! Inbound decoding is split in two steps: the frame is first parsed into a
//! loose [`ServerFrame`] (any `type`, any `data`), then the `type` is matched
//! against the kinds this client understands.  This keeps unknown kinds
//! distinguishable from genuinely malformed frames.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::protocol::messages::{ControlMessage, ServerMessage};

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The frame is not valid JSON, or not the expected JSON shape.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The frame has a known `type` but its `data` has the wrong shape.
    #[error("malformed payload for {kind}: {reason}")]
    MalformedPayload { kind: String, reason: String },

    /// Serialisation failed.  Not expected for the fixed message set.
    #[error("failed to encode {kind}: {reason}")]
    Encode { kind: &'static str, reason: String },
}

/// Loose shape of every inbound frame.
#[derive(Debug, Serialize, Deserialize)]
struct ServerFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    data: Value,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`ControlMessage`] into the text of one WebSocket frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialisation fails (for example a
/// non-finite displacement, which JSON cannot represent).
///
/// # Examples
///
/// ```rust
/// use touchpoint_core::{encode_control, ControlMessage};
///
/// assert_eq!(encode_control(&ControlMessage::Reinit).unwrap(), "\"Reinit\"");
/// ```
pub fn encode_control(msg: &ControlMessage) -> Result<String, ProtocolError> {
    if let ControlMessage::MoveRelative(d) = msg {
        if !d.x.is_finite() || !d.y.is_finite() {
            return Err(ProtocolError::Encode {
                kind: msg.kind(),
                reason: format!("non-finite displacement ({}, {})", d.x, d.y),
            });
        }
    }
    serde_json::to_string(msg).map_err(|e| ProtocolError::Encode {
        kind: msg.kind(),
        reason: e.to_string(),
    })
}

/// Decodes the text of one outbound frame back into a [`ControlMessage`].
///
/// Used by receivers and by tests that stand in for one.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedFrame`] if the text is not a valid
/// control message.
pub fn decode_control(text: &str) -> Result<ControlMessage, ProtocolError> {
    serde_json::from_str(text).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))
}

/// Encodes a [`ServerMessage`] into the text of one inbound frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialisation fails.
pub fn encode_server(msg: &ServerMessage) -> Result<String, ProtocolError> {
    let frame = match msg {
        ServerMessage::Error(text) => ServerFrame {
            kind: "Error".to_string(),
            data: Value::String(text.clone()),
        },
        ServerMessage::Unknown { kind } => ServerFrame {
            kind: kind.clone(),
            data: Value::Null,
        },
    };
    serde_json::to_string(&frame).map_err(|e| ProtocolError::Encode {
        kind: "ServerMessage",
        reason: e.to_string(),
    })
}

/// Decodes the text of one inbound frame.
///
/// Unrecognised `type` values decode successfully as
/// [`ServerMessage::Unknown`].
///
/// # Errors
///
/// - [`ProtocolError::MalformedFrame`] if the text is not a JSON object with a
///   string `type` field.
/// - [`ProtocolError::MalformedPayload`] if the `type` is known but `data` has
///   the wrong shape.
pub fn decode_server(text: &str) -> Result<ServerMessage, ProtocolError> {
    let frame: ServerFrame =
        serde_json::from_str(text).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))?;

    match frame.kind.as_str() {
        "Error" => match frame.data {
            Value::String(s) => Ok(ServerMessage::Error(s)),
            other => Err(ProtocolError::MalformedPayload {
                kind: frame.kind,
                reason: format!("expected string data, got {other}"),
            }),
        },
        _ => Ok(ServerMessage::Unknown { kind: frame.kind }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
