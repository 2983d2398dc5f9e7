//! Integration tests for the WebSocket control channel.
//!
//! # Purpose
//!
//! These tests run a real `ProtocolChannel` against a loopback WebSocket
//! receiver started inside the test.  They verify:
//!
//! - The happy path: the channel opens, and messages arrive at the receiver in
//!   the order they were sent, in the expected JSON shape.
//! - Inbound frames: an `Error` frame reaches the owner as a
//!   `ChannelEvent::Message`, and a malformed frame is dropped without closing
//!   the channel.
//! - Teardown from either side: a local `close()` ends the receiver's stream,
//!   and a receiver-side close is reported as `ChannelEvent::Closed`.
//! - Failure: connecting to a port with nothing listening reports `Failed`.
//!
//! # Test receiver
//!
//! ```text
//! ProtocolChannel ──ws──► TestReceiver task
//!                           ├── text frames  → `frames` queue (test reads)
//!                           └── `outgoing`   → frames sent back (None = close)
//! ```

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_test::{assert_err, assert_ok};
use tokio_tungstenite::{accept_async, tungstenite::Message};

use touchpoint_client::infrastructure::{ChannelError, ChannelEvent, ChannelState, ProtocolChannel};
use touchpoint_core::{decode_control, encode_server, ControlMessage, Displacement, ServerMessage};

const WAIT: Duration = Duration::from_secs(2);

// ── Test receiver ─────────────────────────────────────────────────────────────

/// A one-connection WebSocket receiver on an ephemeral loopback port.
struct TestReceiver {
    url: String,
    frames: mpsc::UnboundedReceiver<String>,
    outgoing: mpsc::UnboundedSender<Option<String>>,
}

impl TestReceiver {
    async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());
        let (frames_tx, frames) = mpsc::unbounded_channel();
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Option<String>>();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let ws = accept_async(stream).await.unwrap();
            let (mut sink, mut source) = ws.split();
            loop {
                tokio::select! {
                    frame = source.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            let _ = frames_tx.send(text);
                        }
                        Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                        Some(Ok(_)) => {}
                    },
                    out = outgoing_rx.recv() => match out {
                        Some(Some(text)) => {
                            let _ = sink.send(Message::Text(text)).await;
                        }
                        Some(None) | None => {
                            let _ = sink.send(Message::Close(None)).await;
                            break;
                        }
                    },
                }
            }
            // Dropping `frames_tx` tells the test the connection is gone.
        });

        Self {
            url,
            frames,
            outgoing,
        }
    }

    /// Next control message the receiver got, or `None` once disconnected.
    async fn next_message(&mut self) -> Option<ControlMessage> {
        let text = timeout(WAIT, self.frames.recv())
            .await
            .expect("timed out waiting for a frame")?;
        Some(decode_control(&text).expect("receiver got an undecodable frame"))
    }

    async fn next_raw(&mut self) -> Option<String> {
        timeout(WAIT, self.frames.recv())
            .await
            .expect("timed out waiting for a frame")
    }

    fn send_text(&self, text: impl Into<String>) {
        self.outgoing.send(Some(text.into())).unwrap();
    }

    fn close(&self) {
        self.outgoing.send(None).unwrap();
    }
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for a channel event")
        .expect("channel event queue closed")
}

// ── Happy path ────────────────────────────────────────────────────────────────

/// Messages reach the receiver in send order and in the wire JSON shape.
#[tokio::test]
async fn test_channel_delivers_messages_in_order() {
    // Arrange
    let mut receiver = TestReceiver::spawn().await;
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let channel = ProtocolChannel::connect(&receiver.url, events_tx);

    // Act
    assert_ok!(channel.wait_open().await);
    assert!(matches!(next_event(&mut events).await, ChannelEvent::Opened));
    let sent = [
        ControlMessage::Start,
        ControlMessage::MoveRelative(Displacement::new(3.0, -4.0)),
        ControlMessage::Stop,
        ControlMessage::Reinit,
    ];
    for msg in &sent {
        assert_ok!(channel.send(msg));
    }

    // Assert
    let first = receiver.next_raw().await.unwrap();
    assert_eq!(first, r#"{"Start":null}"#);
    for expected in &sent[1..] {
        assert_eq!(receiver.next_message().await.as_ref(), Some(expected));
    }
    assert_eq!(channel.state(), ChannelState::Open);
}

// ── Inbound frames ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_error_frame_reaches_owner() {
    let receiver = TestReceiver::spawn().await;
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let channel = ProtocolChannel::connect(&receiver.url, events_tx);
    assert_ok!(channel.wait_open().await);
    assert!(matches!(next_event(&mut events).await, ChannelEvent::Opened));

    let frame = encode_server(&ServerMessage::Error("device busy".to_string())).unwrap();
    receiver.send_text(frame);

    match next_event(&mut events).await {
        ChannelEvent::Message(ServerMessage::Error(text)) => assert_eq!(text, "device busy"),
        other => panic!("expected an error message, got {other:?}"),
    }
}

/// A garbage frame is logged and dropped; the channel stays open.
#[tokio::test]
async fn test_malformed_frame_is_dropped() {
    // Arrange
    let receiver = TestReceiver::spawn().await;
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let channel = ProtocolChannel::connect(&receiver.url, events_tx);
    assert_ok!(channel.wait_open().await);
    assert!(matches!(next_event(&mut events).await, ChannelEvent::Opened));

    // Act
    receiver.send_text("this is not json");
    receiver.send_text(r#"{"type":"Hello","data":null}"#);

    // Assert: the next event is the well-formed frame
    match next_event(&mut events).await {
        ChannelEvent::Message(ServerMessage::Unknown { kind }) => assert_eq!(kind, "Hello"),
        other => panic!("expected the unknown message, got {other:?}"),
    }
    assert_eq!(channel.state(), ChannelState::Open);
}

// ── Teardown ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_local_close_ends_receiver_stream() {
    let mut receiver = TestReceiver::spawn().await;
    let (events_tx, _events) = mpsc::unbounded_channel();
    let channel = ProtocolChannel::connect(&receiver.url, events_tx);
    assert_ok!(channel.wait_open().await);

    channel.close();
    channel.close();

    assert_eq!(receiver.next_message().await, None);
    assert_eq!(channel.state(), ChannelState::Closed);
    assert!(matches!(
        channel.send(&ControlMessage::Start),
        Err(ChannelError::NotOpen(ChannelState::Closed))
    ));
}

#[tokio::test]
async fn test_receiver_close_is_reported() {
    // Arrange
    let receiver = TestReceiver::spawn().await;
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let channel = ProtocolChannel::connect(&receiver.url, events_tx);
    assert_ok!(channel.wait_open().await);
    assert!(matches!(next_event(&mut events).await, ChannelEvent::Opened));

    // Act
    receiver.close();

    // Assert
    assert!(matches!(next_event(&mut events).await, ChannelEvent::Closed));
    assert_eq!(channel.state(), ChannelState::Closed);
    assert_err!(channel.send(&ControlMessage::Stop));
}

// ── Failure ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_to_closed_port_reports_failure() {
    // Arrange: reserve a port, then free it so nothing is listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let url = format!("ws://{addr}/ws");
    let (events_tx, mut events) = mpsc::unbounded_channel();

    // Act
    let channel = ProtocolChannel::connect(&url, events_tx);

    // Assert
    match next_event(&mut events).await {
        ChannelEvent::Failed(ChannelError::Connect { url: failed, .. }) => assert_eq!(failed, url),
        other => panic!("expected a connect failure, got {other:?}"),
    }
    assert_err!(channel.wait_open().await);
    assert_eq!(channel.state(), ChannelState::Closed);
}
