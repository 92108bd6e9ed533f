/*
[INPUT]:  Signed upgrade request, stream kind, cancellation token
[OUTPUT]: Decoded stream messages via channel, final close reason
[POS]:    WebSocket layer - authenticated streaming session lifecycle
[UPDATE]: When changing connection, read loop, or shutdown handling
*/

use crate::error::{Result, XsignError};
use crate::http::SignedRequest;
use crate::types::StreamKind;
use crate::ws::message::{self, StreamMessage};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::fmt;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout_at};
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;
type WsSource = SplitStream<WsStream>;

/// Streaming session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long to wait for the peer after sending a close frame
    pub close_timeout: Duration,
    pub connect_timeout: Duration,
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            close_timeout: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(10),
            channel_capacity: 100,
        }
    }
}

/// Lifecycle of a streaming session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Connected,
    Closing,
    Closed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }
}

/// Why a session reached `Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Peer sent a close frame
    PeerClosed,
    /// Connection ended without a close frame
    StreamEnded,
    /// Message receiver was dropped by the caller
    ReceiverDropped,
    /// Interrupted and the peer acknowledged the close in time
    Interrupted,
    /// Interrupted and the peer did not acknowledge within the close timeout
    CloseTimedOut,
}

enum ReadLoopEnd {
    PeerClosed(Option<CloseCode>),
    StreamEnded,
    ReceiverDropped,
    Failed(XsignError),
}

/// Authenticated WebSocket session.
///
/// The session is authenticated once, by the headers on the upgrade
/// request. Every inbound frame is decoded as the [`StreamKind`] chosen at
/// construction and delivered in arrival order on the receiver returned by
/// [`take_receiver`](Self::take_receiver). The receiver must be drained
/// while [`run`](Self::run) is in progress; the read loop waits when the
/// channel is full.
pub struct StreamSession {
    kind: StreamKind,
    config: SessionConfig,
    state_tx: watch::Sender<SessionState>,
    message_tx: mpsc::Sender<StreamMessage>,
    message_rx: Option<mpsc::Receiver<StreamMessage>>,
    stream: Option<WsStream>,
}

impl StreamSession {
    pub fn new(kind: StreamKind, config: SessionConfig) -> Self {
        let (message_tx, message_rx) = mpsc::channel(config.channel_capacity.max(1));
        let (state_tx, _) = watch::channel(SessionState::Connecting);
        Self {
            kind,
            config,
            state_tx,
            message_tx,
            message_rx: Some(message_rx),
            stream: None,
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// Observe state transitions
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Get the message receiver
    pub fn take_receiver(&mut self) -> Option<mpsc::Receiver<StreamMessage>> {
        self.message_rx.take()
    }

    fn set_state(&self, state: SessionState) {
        let previous = self.state_tx.send_replace(state);
        debug!(from = ?previous, to = ?state, "stream session state changed");
    }

    /// Perform the authenticated handshake. No reconnect on failure.
    pub async fn connect(&mut self, request: &SignedRequest) -> Result<()> {
        let state = self.state();
        if state != SessionState::Connecting {
            return Err(XsignError::invalid_state(format!(
                "cannot connect a session in state {state:?}"
            )));
        }

        let handshake = match request.handshake_request() {
            Ok(handshake) => handshake,
            Err(err) => {
                self.set_state(SessionState::Failed);
                return Err(err);
            }
        };

        info!(url = %request.uri(), kind = %self.kind, "connecting");
        let connected = match tokio::time::timeout(
            self.config.connect_timeout,
            connect_async(handshake),
        )
        .await
        {
            Ok(result) => result.map_err(XsignError::from),
            Err(_) => Err(XsignError::from(WsError::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                "websocket handshake timed out",
            )))),
        };

        match connected {
            Ok((stream, response)) => {
                info!(status = response.status().as_u16(), "connected");
                self.stream = Some(stream);
                self.set_state(SessionState::Connected);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "websocket connect failed");
                self.set_state(SessionState::Failed);
                Err(err)
            }
        }
    }

    /// Drive a connected session until the peer closes, the read loop fails,
    /// or `shutdown` is cancelled.
    ///
    /// On cancellation a normal-closure frame is sent and the peer gets
    /// `close_timeout` to acknowledge. Sending the frame, waiting for the
    /// acknowledgement, and releasing the connection share that one deadline.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<CloseReason> {
        let Some(stream) = self.stream.take() else {
            return Err(XsignError::invalid_state(format!(
                "cannot run a session in state {:?}",
                self.state()
            )));
        };

        let (mut sink, source) = stream.split();
        let (done_tx, done_rx) = oneshot::channel();
        let reader = tokio::spawn(read_loop(
            source,
            self.kind,
            self.message_tx.clone(),
            done_tx,
        ));

        let (outcome, close_deadline) = self.watch(&mut sink, done_rx, &shutdown).await;
        let deadline =
            close_deadline.unwrap_or_else(|| Instant::now() + self.config.close_timeout);
        release(sink, reader, deadline).await;

        match &outcome {
            Ok(reason) => {
                self.set_state(SessionState::Closed);
                info!(?reason, "stream session closed");
            }
            Err(err) => {
                self.set_state(SessionState::Failed);
                warn!(error = %err, "stream session failed");
            }
        }
        outcome
    }

    /// Returns the close deadline when the session was interrupted
    async fn watch(
        &self,
        sink: &mut WsSink,
        mut done: oneshot::Receiver<ReadLoopEnd>,
        shutdown: &CancellationToken,
    ) -> (Result<CloseReason>, Option<Instant>) {
        tokio::select! {
            end = &mut done => {
                let outcome = read_loop_outcome(end);
                if outcome.is_ok() {
                    self.set_state(SessionState::Closing);
                }
                return (outcome, None);
            }
            () = shutdown.cancelled() => {}
        }

        info!("interrupt received, closing stream");
        self.set_state(SessionState::Closing);
        let deadline = Instant::now() + self.config.close_timeout;

        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        };
        match timeout_at(deadline, sink.send(WsMessage::Close(Some(frame)))).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(error = %err, "failed to send close frame");
                return (Ok(CloseReason::Interrupted), Some(deadline));
            }
            Err(_) => {
                warn!("timed out sending close frame");
                return (Ok(CloseReason::CloseTimedOut), Some(deadline));
            }
        }

        let reason = match timeout_at(deadline, done).await {
            Ok(_) => CloseReason::Interrupted,
            Err(_) => {
                warn!(
                    timeout_ms = self.config.close_timeout.as_millis() as u64,
                    "peer did not acknowledge close"
                );
                CloseReason::CloseTimedOut
            }
        };
        (Ok(reason), Some(deadline))
    }
}

impl fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSession")
            .field("kind", &self.kind)
            .field("state", &self.state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn read_loop_outcome(
    end: std::result::Result<ReadLoopEnd, oneshot::error::RecvError>,
) -> Result<CloseReason> {
    match end {
        Ok(ReadLoopEnd::PeerClosed(code)) => {
            info!(?code, "peer closed stream");
            Ok(CloseReason::PeerClosed)
        }
        Ok(ReadLoopEnd::StreamEnded) => Ok(CloseReason::StreamEnded),
        Ok(ReadLoopEnd::ReceiverDropped) => Ok(CloseReason::ReceiverDropped),
        Ok(ReadLoopEnd::Failed(err)) => Err(err),
        Err(_) => Err(XsignError::invalid_state(
            "read loop stopped without reporting",
        )),
    }
}

async fn read_loop(
    mut source: WsSource,
    kind: StreamKind,
    message_tx: mpsc::Sender<StreamMessage>,
    done: oneshot::Sender<ReadLoopEnd>,
) {
    let end = loop {
        let decoded = match source.next().await {
            Some(Ok(WsMessage::Text(text))) => message::decode(text.as_bytes(), kind),
            Some(Ok(WsMessage::Binary(bytes))) => message::decode(&bytes, kind),
            Some(Ok(WsMessage::Close(frame))) => {
                break ReadLoopEnd::PeerClosed(frame.map(|frame| frame.code));
            }
            Some(Ok(_)) => continue,
            Some(Err(err)) => break ReadLoopEnd::Failed(err.into()),
            None => break ReadLoopEnd::StreamEnded,
        };

        match decoded {
            Ok(message) => {
                if message_tx.send(message).await.is_err() {
                    break ReadLoopEnd::ReceiverDropped;
                }
            }
            Err(err) => break ReadLoopEnd::Failed(err),
        }
    };

    // the watcher stops listening once it has timed out
    let _ = done.send(end);
}

/// Close the connection once, tolerating a peer that already closed it
async fn release(mut sink: WsSink, reader: JoinHandle<()>, deadline: Instant) {
    match timeout_at(deadline, sink.close()).await {
        Ok(Ok(())) => debug!("connection closed"),
        Ok(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
            debug!("connection already closed")
        }
        Ok(Err(err)) => debug!(error = %err, "error while closing connection"),
        Err(_) => debug!("timed out closing connection"),
    }

    reader.abort();
    if let Err(err) = reader.await
        && err.is_panic()
    {
        warn!(error = %err, "read loop panicked");
    }
}
