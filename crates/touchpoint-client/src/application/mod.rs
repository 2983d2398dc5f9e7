//! Application layer for the Touchpoint client.
//!
//! The application layer owns the session: it decides *what* to send and
//! *when*, and delegates *how* (sockets, input hooks, the message display) to
//! the infrastructure layer through traits.
//!
//! # Responsibilities
//!
//! - Feeding input events through the gesture, motion and keyboard state
//!   machines from `touchpoint-core`
//! - Scheduling and cancelling the timers those state machines ask for
//! - Starting and stopping sessions and reacting to channel events
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or reading devices (that is infrastructure)
//! - Gesture thresholds and timing rules (that is `touchpoint-core`)

pub mod session;
pub mod timer;

pub use session::{Activation, Disposition, InputSession, SessionError, SessionState};
pub use timer::{CancelableTask, TimerFired, TimerKind, TimerSet};
