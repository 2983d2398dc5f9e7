//! Infrastructure layer for the Touchpoint client.
//!
//! The infrastructure layer handles all I/O: the WebSocket control channel to
//! the remote receiver, local input sources, the message display, and the
//! configuration file.
//!
//! # What does NOT belong here?
//!
//! - Gesture classification and motion batching (that is `touchpoint-core`)
//! - Session state and timer orchestration (that is the application layer)

pub mod channel;
pub mod display;
pub mod input_source;
pub mod storage;

pub use channel::{
    ChannelError, ChannelEvent, ChannelState, Connector, ControlChannel, ProtocolChannel,
    WsConnector,
};
pub use display::{LogDisplay, MessageDisplay};
pub use input_source::{InputSource, InputSourceError, MockInputSource, StdinInputSource};
