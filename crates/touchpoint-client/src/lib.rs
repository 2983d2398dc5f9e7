//! touchpoint-client library crate.
//!
//! This crate turns local touch, mouse and keyboard input into control
//! messages for a remote pointer receiver over a WebSocket.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Input source (touch / mouse / keyboard events)
//!         ↓
//! [touchpoint-client]
//!   ├── application/      InputSession: state machines + timers
//!   └── infrastructure/
//!         ├── input_source/ where events come from (stdin JSON lines, mock)
//!         ├── channel/      WebSocket control channel (tokio-tungstenite)
//!         ├── display/      user-visible messages
//!         └── storage/      TOML configuration file
//!         ↓
//! Receiver (JSON over WebSocket)
//! ```
//!
//! The gesture rules themselves live in `touchpoint-core`, which has no I/O
//! and no async code.
//!
//! # Layer rules
//!
//! - `application` depends on `touchpoint-core` and on infrastructure
//!   *traits* only, so the session can be tested with fakes.
//! - `infrastructure` depends on `tokio`, `tokio-tungstenite` and the OS.

/// Application layer: the input session and its timers.
pub mod application;

/// Infrastructure layer: channel, input sources, display and configuration.
pub mod infrastructure;
