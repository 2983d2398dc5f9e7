//! Local input sources.
//!
//! An input source delivers [`InputEvent`]s (touches, mouse, keys) to the
//! session over a Tokio channel.  Drivers, OS hooks and test harnesses all plug
//! in behind the [`InputSource`] trait.
//!
//! # Suppression
//!
//! Some events are consumed by the session and should not also reach the
//! local UI (for example touches used to detect a start swipe).  After handling
//! such an event the session calls [`InputSource::suppress_current_event`];
//! sources that cannot suppress treat it as a no-op.

use thiserror::Error;
use tokio::sync::mpsc;

use touchpoint_core::InputEvent;

pub mod mock;
pub mod stdin;

pub use mock::MockInputSource;
pub use stdin::StdinInputSource;

/// Error type for input source operations.
#[derive(Debug, Error)]
pub enum InputSourceError {
    /// `start` was called on a source that is already delivering events.
    #[error("input source already started")]
    AlreadyStarted,
}

/// Trait abstracting input event production.
pub trait InputSource: Send + Sync {
    /// Starts the source and returns a receiver for its events.
    fn start(&self) -> Result<mpsc::UnboundedReceiver<InputEvent>, InputSourceError>;
    /// Stops the source.  The receiver returned by `start` then ends.
    fn stop(&self);
    /// Asks the source to keep the event just delivered from reaching the local
    /// UI.
    fn suppress_current_event(&self);
}
