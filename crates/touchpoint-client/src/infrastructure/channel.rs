//! The control channel: one WebSocket connection to the remote receiver.
//!
//! # Lifecycle
//!
//! ```text
//!            connect()          handshake ok
//!  (none) ─────────────► Connecting ─────────────► Open
//!                            │                      │
//!                            │ handshake failed     │ close() / peer closed /
//!                            ▼                      ▼ write failed
//!                          Closed ◄─────────────────┘
//! ```
//!
//! `Closed` is terminal.  There is no automatic reconnect; the session opens a
//! new channel when it starts again.
//!
//! # Tasks
//!
//! [`ProtocolChannel::connect`] returns immediately in `Connecting` and spawns
//! one driver task that performs the handshake and then multiplexes the socket:
//! outbound frames arrive over an `mpsc` queue, inbound frames are decoded and
//! posted to the owner as [`ChannelEvent`]s.  The current [`ChannelState`] is
//! published on a `tokio::sync::watch` so callers can await readiness instead
//! of polling for it.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, info, warn};

use touchpoint_core::{decode_server, encode_control, ControlMessage, ProtocolError, ServerMessage};

/// Connection state of a [`ProtocolChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

/// Errors reported by the control channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The WebSocket handshake failed.
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    /// A message was sent while the channel was not open.
    #[error("channel is not open (state: {0:?})")]
    NotOpen(ChannelState),

    /// The message could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Notifications from a channel to its owner.
#[derive(Debug)]
pub enum ChannelEvent {
    /// The handshake completed; the channel accepts sends.
    Opened,
    /// A frame from the receiver was decoded.
    Message(ServerMessage),
    /// The handshake failed.  The channel is `Closed`.
    Failed(ChannelError),
    /// The receiver closed the connection or the socket failed.
    Closed,
}

/// Operations the session needs from an open (or opening) channel.
#[async_trait]
pub trait ControlChannel: Send + Sync {
    fn state(&self) -> ChannelState;

    /// Queues `msg` for sending.
    ///
    /// # Errors
    ///
    /// [`ChannelError::NotOpen`] unless the channel is `Open`.
    fn send(&self, msg: &ControlMessage) -> Result<(), ChannelError>;

    /// Closes the channel.  Idempotent.
    fn close(&self);

    /// Resolves once the channel leaves `Connecting`.
    ///
    /// # Errors
    ///
    /// [`ChannelError::NotOpen`] if the channel ended up `Closed`.
    async fn wait_open(&self) -> Result<(), ChannelError>;
}

/// Opens channels.  The session owns one connector and asks it for a new
/// channel every time it starts.
pub trait Connector: Send + Sync {
    /// Starts opening a channel.  Its events are posted to `events`.
    fn open(&self, events: mpsc::UnboundedSender<ChannelEvent>) -> Box<dyn ControlChannel>;
}

/// Connector for a `ws://` receiver URL.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WsConnector {
    fn open(&self, events: mpsc::UnboundedSender<ChannelEvent>) -> Box<dyn ControlChannel> {
        Box::new(ProtocolChannel::connect(&self.url, events))
    }
}

// ── ProtocolChannel ───────────────────────────────────────────────────────────

enum Outbound {
    Frame(String),
    Close,
}

/// A WebSocket control channel.
pub struct ProtocolChannel {
    state: Arc<watch::Sender<ChannelState>>,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl ProtocolChannel {
    /// Starts connecting to `url` and returns at once in `Connecting`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(url: &str, events: mpsc::UnboundedSender<ChannelEvent>) -> Self {
        let (state, _) = watch::channel(ChannelState::Connecting);
        let state = Arc::new(state);
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(drive(url.to_string(), Arc::clone(&state), outbound_rx, events));

        Self { state, outbound }
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Queues `msg` for sending.
    ///
    /// # Errors
    ///
    /// [`ChannelError::NotOpen`] unless the channel is `Open`, or
    /// [`ChannelError::Protocol`] if the message cannot be encoded.
    pub fn send(&self, msg: &ControlMessage) -> Result<(), ChannelError> {
        let state = self.state();
        if state != ChannelState::Open {
            return Err(ChannelError::NotOpen(state));
        }
        let text = encode_control(msg)?;
        debug!("→ {text}");
        self.outbound
            .send(Outbound::Frame(text))
            .map_err(|_| ChannelError::NotOpen(ChannelState::Closed))
    }

    /// Closes the channel.  Calling it again, or on a channel the peer already
    /// closed, does nothing.
    pub fn close(&self) {
        let was_live = self.state.send_if_modified(|s| {
            if *s == ChannelState::Closed {
                false
            } else {
                *s = ChannelState::Closed;
                true
            }
        });
        if was_live {
            info!("closing control channel");
            let _ = self.outbound.send(Outbound::Close);
        }
    }

    /// Resolves once the channel leaves `Connecting`.
    ///
    /// # Errors
    ///
    /// [`ChannelError::NotOpen`] if the channel ended up `Closed`.
    pub async fn wait_open(&self) -> Result<(), ChannelError> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|s| *s != ChannelState::Connecting)
            .await
            .map(|s| *s)
            .unwrap_or(ChannelState::Closed);
        match state {
            ChannelState::Open => Ok(()),
            other => Err(ChannelError::NotOpen(other)),
        }
    }
}

#[async_trait]
impl ControlChannel for ProtocolChannel {
    fn state(&self) -> ChannelState {
        ProtocolChannel::state(self)
    }

    fn send(&self, msg: &ControlMessage) -> Result<(), ChannelError> {
        ProtocolChannel::send(self, msg)
    }

    fn close(&self) {
        ProtocolChannel::close(self)
    }

    async fn wait_open(&self) -> Result<(), ChannelError> {
        ProtocolChannel::wait_open(self).await
    }
}

/// Marks the channel closed.  Returns `true` if it was not already closed,
/// i.e. the close did not come from [`ProtocolChannel::close`].
fn mark_closed(state: &watch::Sender<ChannelState>) -> bool {
    state.send_if_modified(|s| std::mem::replace(s, ChannelState::Closed) != ChannelState::Closed)
}

/// Driver task: handshake, then pump frames both ways until either side closes.
async fn drive(
    url: String,
    state: Arc<watch::Sender<ChannelState>>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<ChannelEvent>,
) {
    let ws = match connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            warn!("control channel handshake with {url} failed: {e}");
            if mark_closed(&state) {
                let _ = events.send(ChannelEvent::Failed(ChannelError::Connect {
                    url,
                    reason: e.to_string(),
                }));
            }
            return;
        }
    };

    // close() may have been called while the handshake was in flight.
    let opened = state.send_if_modified(|s| {
        if *s == ChannelState::Connecting {
            *s = ChannelState::Open;
            true
        } else {
            false
        }
    });
    if !opened {
        debug!("channel closed during handshake; dropping connection to {url}");
        return;
    }
    info!("control channel open: {url}");
    let _ = events.send(ChannelEvent::Opened);

    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            out = outbound.recv() => match out {
                Some(Outbound::Frame(text)) => {
                    if let Err(e) = sink.send(WsMessage::Text(text)).await {
                        warn!("control channel write failed: {e}");
                        if mark_closed(&state) {
                            let _ = events.send(ChannelEvent::Closed);
                        }
                        break;
                    }
                }
                // Closed locally, or the channel handle was dropped.
                Some(Outbound::Close) | None => {
                    mark_closed(&state);
                    let _ = sink.send(WsMessage::Close(None)).await;
                    let _ = sink.close().await;
                    break;
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => match decode_server(&text) {
                    Ok(msg) => {
                        debug!("← {text}");
                        let _ = events.send(ChannelEvent::Message(msg));
                    }
                    Err(e) => warn!("dropping inbound frame: {e}"),
                },
                Some(Ok(WsMessage::Close(_))) | None => {
                    info!("control channel closed by receiver");
                    if mark_closed(&state) {
                        let _ = events.send(ChannelEvent::Closed);
                    }
                    break;
                }
                Some(Ok(other)) => debug!("ignoring non-text frame: {other:?}"),
                Some(Err(e)) => {
                    warn!("control channel read failed: {e}");
                    if mark_closed(&state) {
                        let _ = events.send(ChannelEvent::Closed);
                    }
                    break;
                }
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a channel in a given state without a network connection.
    fn detached(state: ChannelState) -> (ProtocolChannel, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, _) = watch::channel(state);
        let (outbound, rx) = mpsc::unbounded_channel();
        (
            ProtocolChannel {
                state: Arc::new(tx),
                outbound,
            },
            rx,
        )
    }

    #[test]
    fn test_send_while_connecting_is_rejected() {
        // Arrange
        let (channel, mut rx) = detached(ChannelState::Connecting);

        // Act
        let result = channel.send(&ControlMessage::Start);

        // Assert
        assert!(matches!(
            result,
            Err(ChannelError::NotOpen(ChannelState::Connecting))
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_send_while_open_queues_encoded_frame() {
        let (channel, mut rx) = detached(ChannelState::Open);

        channel.send(&ControlMessage::Reinit).unwrap();

        match rx.try_recv() {
            Ok(Outbound::Frame(text)) => assert_eq!(text, "\"Reinit\""),
            _ => panic!("expected a queued frame"),
        }
    }

    #[test]
    fn test_close_is_idempotent() {
        // Arrange
        let (channel, mut rx) = detached(ChannelState::Open);

        // Act
        channel.close();
        channel.close();

        // Assert: exactly one close request reaches the driver
        assert_eq!(channel.state(), ChannelState::Closed);
        assert!(matches!(rx.try_recv(), Ok(Outbound::Close)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_send_after_close_is_rejected() {
        let (channel, _rx) = detached(ChannelState::Open);
        channel.close();
        assert!(matches!(
            channel.send(&ControlMessage::Stop),
            Err(ChannelError::NotOpen(ChannelState::Closed))
        ));
    }

    #[tokio::test]
    async fn test_wait_open_resolves_when_opened() {
        let (channel, _rx) = detached(ChannelState::Connecting);
        let state = Arc::clone(&channel.state);

        tokio::spawn(async move {
            state.send_replace(ChannelState::Open);
        });

        assert!(channel.wait_open().await.is_ok());
    }

    #[tokio::test]
    async fn test_wait_open_fails_when_closed() {
        let (channel, _rx) = detached(ChannelState::Connecting);
        channel.close();
        assert!(channel.wait_open().await.is_err());
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_url_reports_failure() {
        // Arrange: port 1 on localhost refuses connections
        let (tx, mut events) = mpsc::unbounded_channel();

        // Act
        let channel = ProtocolChannel::connect("ws://127.0.0.1:1/ws", tx);
        let waited = channel.wait_open().await;

        // Assert
        assert!(waited.is_err());
        assert_eq!(channel.state(), ChannelState::Closed);
        assert!(matches!(
            events.recv().await,
            Some(ChannelEvent::Failed(ChannelError::Connect { .. }))
        ));
    }
}
