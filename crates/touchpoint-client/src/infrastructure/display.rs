//! Message display surface.
//!
//! The session shows help text when it activates, server-reported errors, and
//! connection failures.  Where that text ends up is up to the embedding
//! application: an on-screen overlay, a notification, or the log.  The
//! [`MessageDisplay`] trait is the seam; [`LogDisplay`] is the implementation
//! the command-line binary uses.

use std::time::Duration;

use tracing::info;

/// A surface that can show one message at a time.
#[cfg_attr(test, mockall::automock)]
pub trait MessageDisplay: Send {
    /// Shows `text`, replacing any open message.  With a `timeout` the message
    /// closes itself after that long.
    fn display(&self, text: &str, timeout: Option<Duration>);

    /// Closes the open message, if any.
    fn close(&self);
}

/// Writes messages to the log at `info` level.
#[derive(Debug, Default, Clone)]
pub struct LogDisplay;

impl MessageDisplay for LogDisplay {
    fn display(&self, text: &str, timeout: Option<Duration>) {
        match timeout {
            Some(t) => info!(target: "touchpoint::display", timeout_ms = t.as_millis() as u64, "{text}"),
            None => info!(target: "touchpoint::display", "{text}"),
        }
    }

    fn close(&self) {
        info!(target: "touchpoint::display", "message closed");
    }
}
