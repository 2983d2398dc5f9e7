//! Mock input source for tests.
//!
//! Allows tests to inject synthetic [`InputEvent`]s and to count suppression
//! requests.  Events injected before `start()` are buffered and delivered once
//! the session starts reading.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use touchpoint_core::InputEvent;

use super::{InputSource, InputSourceError};

/// A mock implementation of [`InputSource`] that allows tests to inject events.
pub struct MockInputSource {
    sender: Arc<Mutex<Option<UnboundedSender<InputEvent>>>>,
    receiver: Arc<Mutex<Option<UnboundedReceiver<InputEvent>>>>,
    suppress_count: Arc<Mutex<u32>>,
}

impl MockInputSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            sender: Arc::new(Mutex::new(Some(tx))),
            receiver: Arc::new(Mutex::new(Some(rx))),
            suppress_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Injects a synthetic event, as if produced by a device.
    ///
    /// Panics if `stop()` has been called.
    pub fn inject_event(&self, event: InputEvent) {
        let guard = self.sender.lock().expect("lock poisoned");
        match guard.as_ref() {
            Some(sender) => sender
                .send(event)
                .expect("receiver has been dropped; is the session still running?"),
            None => panic!("MockInputSource::inject_event called after stop()"),
        }
    }

    /// Returns the number of times [`InputSource::suppress_current_event`] was
    /// called.
    pub fn suppress_count(&self) -> u32 {
        *self.suppress_count.lock().expect("lock poisoned")
    }
}

impl Default for MockInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for MockInputSource {
    fn start(&self) -> Result<UnboundedReceiver<InputEvent>, InputSourceError> {
        self.receiver
            .lock()
            .expect("lock poisoned")
            .take()
            .ok_or(InputSourceError::AlreadyStarted)
    }

    fn stop(&self) {
        // Dropping the sender ends the receiver's stream.
        *self.sender.lock().expect("lock poisoned") = None;
    }

    fn suppress_current_event(&self) {
        *self.suppress_count.lock().expect("lock poisoned") += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use touchpoint_core::{KeyCode, Modifiers};

    #[test]
    fn test_mock_input_source_delivers_injected_events() {
        // Arrange
        let source = MockInputSource::new();
        let mut rx = source.start().expect("start should succeed");

        // Act
        source.inject_event(InputEvent::TouchStart { x: 1.0, y: 2.0 });
        source.inject_event(InputEvent::KeyDown {
            code: KeyCode::KeyQ,
            modifiers: Modifiers::NONE,
            repeat: false,
        });

        // Assert
        assert_eq!(rx.try_recv().unwrap(), InputEvent::TouchStart { x: 1.0, y: 2.0 });
        assert!(matches!(rx.try_recv().unwrap(), InputEvent::KeyDown { code: KeyCode::KeyQ, .. }));
    }

    #[test]
    fn test_events_injected_before_start_are_buffered() {
        let source = MockInputSource::new();
        source.inject_event(InputEvent::MouseUp);
        let mut rx = source.start().unwrap();
        assert_eq!(rx.try_recv().unwrap(), InputEvent::MouseUp);
    }

    #[test]
    fn test_second_start_fails() {
        let source = MockInputSource::new();
        let _rx = source.start().unwrap();
        assert!(matches!(source.start(), Err(InputSourceError::AlreadyStarted)));
    }

    #[tokio::test]
    async fn test_stop_ends_stream() {
        // Arrange
        let source = MockInputSource::new();
        let mut rx = source.start().unwrap();

        // Act
        source.stop();

        // Assert
        assert!(rx.recv().await.is_none(), "stream should end after stop()");
    }

    #[test]
    fn test_mock_input_source_tracks_suppress_count() {
        let source = MockInputSource::new();
        source.suppress_current_event();
        source.suppress_current_event();
        assert_eq!(source.suppress_count(), 2);
    }
}
