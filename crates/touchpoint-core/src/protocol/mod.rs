//! Protocol module containing message types and the JSON codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_control, decode_server, encode_control, encode_server, ProtocolError};
pub use messages::*;
