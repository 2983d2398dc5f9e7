//! JSON-lines input source.
//!
//! Reads one [`InputEvent`] per line from standard input, e.g. piped from a
//! touchscreen driver shim:
//!
//! ```text
//! {"type":"TouchStart","x":120,"y":340}
//! {"type":"TouchEnd"}
//! ```
//!
//! Lines that do not parse are logged and skipped.  Blank lines are ignored.

use std::sync::{Mutex, PoisonError};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use touchpoint_core::InputEvent;

use super::{InputSource, InputSourceError};

/// Reads JSON-lines input events from the process's standard input.
#[derive(Default)]
pub struct StdinInputSource {
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl StdinInputSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputSource for StdinInputSource {
    fn start(&self) -> Result<UnboundedReceiver<InputEvent>, InputSourceError> {
        let mut guard = self.reader.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            return Err(InputSourceError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *guard = Some(tokio::spawn(read_events(
            BufReader::new(tokio::io::stdin()),
            tx,
        )));
        info!("reading input events from stdin");
        Ok(rx)
    }

    fn stop(&self) {
        let handle = self.reader.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    fn suppress_current_event(&self) {
        // A pipe has no local UI to hide events from.
        debug!("suppression requested for stdin event");
    }
}

/// Parses JSON-lines events from `reader` until EOF or until the receiver is
/// dropped.
pub(crate) async fn read_events<R>(reader: R, tx: UnboundedSender<InputEvent>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("input stream ended");
                break;
            }
            Err(e) => {
                warn!("failed to read input line: {e}");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<InputEvent>(line) {
            Ok(event) => {
                if tx.send(event).is_err() {
                    debug!("input receiver dropped; stopping reader");
                    break;
                }
            }
            Err(e) => warn!("skipping malformed input line {line:?}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_events_parses_lines_and_skips_garbage() {
        // Arrange
        let input: &[u8] = br#"{"type":"TouchStart","x":1,"y":2}

not json
{"type":"TouchEnd"}
{"type":"KeyUp","code":"Space"}
"#;
        let (tx, mut rx) = mpsc::unbounded_channel();

        // Act
        read_events(input, tx).await;

        // Assert
        assert_eq!(rx.recv().await, Some(InputEvent::TouchStart { x: 1.0, y: 2.0 }));
        assert_eq!(rx.recv().await, Some(InputEvent::TouchEnd));
        assert!(matches!(rx.recv().await, Some(InputEvent::KeyUp { .. })));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_read_events_stops_when_receiver_dropped() {
        let input: &[u8] = b"{\"type\":\"MouseUp\"}\n{\"type\":\"MouseUp\"}\n";
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        // Must return rather than loop forever.
        read_events(input, tx).await;
    }
}
