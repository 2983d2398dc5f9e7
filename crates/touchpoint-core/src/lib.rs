//! # touchpoint-core
//!
//! Shared library for Touchpoint containing the control protocol, the
//! configuration schema, and the gesture-to-protocol translation engine.
//!
//! This crate has zero dependencies on OS APIs, async runtimes, or network
//! sockets.  Every state machine in it is driven by explicit timestamps, so the
//! same code runs under a real clock in the client and under a synthetic clock
//! in tests.
//!
//! # Architecture overview
//!
//! Touchpoint turns a touchscreen, mouse, or keyboard on one device into a
//! remote pointing device for another.  Local gestures are classified into
//! discrete intents (tap, double-tap, triple-tap, long-press, swipe) and
//! continuous pointer motion is batched into a rate-limited stream of relative
//! displacements.  Both end up as small JSON control messages on a persistent
//! WebSocket.
//!
//! - **`protocol`** – The wire format: [`ControlMessage`] (outbound),
//!   [`ServerMessage`] (inbound), and the JSON codec.
//!
//! - **`domain`** – Pure state machines: [`GestureClassifier`],
//!   [`StartTrigger`], [`MotionBatcher`], [`KeyboardController`], plus the
//!   [`InputOptions`] that tune them.
//!
//! - **`keymap`** – [`KeyCode`] names (DOM `KeyboardEvent.code` strings) and
//!   modifier state.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::config::{InputOptions, InvalidOption};
pub use domain::gesture::{
    ClassifyTimer, GestureClassifier, Intent, StartTrigger, TapSequence, TriggerEvent,
    TAP_DURATION_CEILING,
};
pub use domain::input::{InputEvent, Point};
pub use domain::keyboard::{move_distance, KeyAction, KeyboardController, QUIT_DELAY};
pub use domain::motion::{MotionBatcher, MotionDecision};
pub use keymap::{KeyCode, Modifiers};
pub use protocol::codec::{
    decode_control, decode_server, encode_control, encode_server, ProtocolError,
};
pub use protocol::messages::{ControlMessage, Displacement, ServerMessage};
