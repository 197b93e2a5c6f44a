use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};

/// How long a closed connection may keep delivering replies
pub const CLOSE_GRACE: std::time::Duration = std::time::Duration::from_secs(2);

/// Relay connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Closed,
    Connecting,
    Open,
}

/// Frames queued for the socket writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Binary(Vec<u8>),
    Close,
}

/// What happened on the socket's read side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEventKind {
    /// Text reply from the relay endpoint
    Reply(String),
    /// Remote side closed the socket
    Closed,
    /// Transport failure; the socket is unusable
    Error(String),
}

/// Event from a specific relay connection
///
/// `generation` identifies the connection that produced it, so events from a
/// connection the coordinator already dropped can be told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayEvent {
    pub generation: u64,
    pub kind: RelayEventKind,
}

/// Opens relay connections
#[async_trait::async_trait]
pub trait RelayConnector: Send + Sync {
    /// Connect to `url`; read-side events are delivered to `events`
    async fn connect(
        &self,
        url: &str,
        generation: u64,
        events: mpsc::Sender<RelayEvent>,
    ) -> Result<RelayConnection>;
}

/// One WebSocket connection to the relay endpoint
///
/// Owned by the coordinator. Writes go through a bounded queue drained by a
/// writer task, so a slow socket pushes back on the caller.
pub struct RelayConnection {
    generation: u64,
    state: ConnectionState,
    outbound: Option<mpsc::Sender<OutboundFrame>>,
    tasks: Vec<JoinHandle<()>>,
}

impl RelayConnection {
    /// Wrap an already open transport
    pub fn new(
        generation: u64,
        outbound: mpsc::Sender<OutboundFrame>,
        tasks: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            generation,
            state: ConnectionState::Open,
            outbound: Some(outbound),
            tasks,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> ConnectionState {
        match &self.outbound {
            Some(tx) if tx.is_closed() => ConnectionState::Closed,
            _ => self.state,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Send one binary chunk
    pub async fn send(&mut self, data: Vec<u8>) -> Result<()> {
        if !self.is_open() {
            return Err(PipelineError::RelayClosed);
        }

        let Some(tx) = &self.outbound else {
            return Err(PipelineError::RelayClosed);
        };

        if tx.send(OutboundFrame::Binary(data)).await.is_err() {
            self.state = ConnectionState::Closed;
            return Err(PipelineError::RelayTransport {
                reason: "socket writer stopped".to_string(),
            });
        }

        Ok(())
    }

    /// Close the socket; queued chunks are flushed first
    pub async fn close(&mut self) {
        if let Some(tx) = self.outbound.take() {
            let _ = tx.send(OutboundFrame::Close).await;
        }
        self.state = ConnectionState::Closed;

        // Give the close handshake a moment, then stop waiting on the peer
        let tasks = std::mem::take(&mut self.tasks);
        if !tasks.is_empty() {
            tokio::spawn(async move {
                tokio::time::sleep(CLOSE_GRACE).await;
                for task in tasks {
                    task.abort();
                }
            });
        }

        debug!("Relay connection {} closed", self.generation);
    }
}

impl Drop for RelayConnection {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// WebSocket connector backed by tokio-tungstenite
#[derive(Debug, Clone)]
pub struct WsRelayConnector {
    send_queue: usize,
}

impl WsRelayConnector {
    pub fn new(send_queue: usize) -> Self {
        Self {
            send_queue: send_queue.max(1),
        }
    }
}

impl Default for WsRelayConnector {
    fn default() -> Self {
        Self::new(32)
    }
}

#[async_trait::async_trait]
impl RelayConnector for WsRelayConnector {
    async fn connect(
        &self,
        url: &str,
        generation: u64,
        events: mpsc::Sender<RelayEvent>,
    ) -> Result<RelayConnection> {
        info!("Connecting to relay at {}", url);

        let (socket, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| PipelineError::RelayConnect {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        info!("Relay connection {} established", generation);

        let (mut sink, mut stream) = socket.split();
        let (tx, mut rx) = mpsc::channel::<OutboundFrame>(self.send_queue);

        let writer_events = events.clone();
        let writer = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                let result = match frame {
                    OutboundFrame::Binary(data) => sink.send(Message::Binary(data)).await,
                    OutboundFrame::Close => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                };

                if let Err(e) = result {
                    warn!("Relay write failed: {}", e);
                    let _ = writer_events
                        .send(RelayEvent {
                            generation,
                            kind: RelayEventKind::Error(e.to_string()),
                        })
                        .await;
                    break;
                }
            }
        });

        let reader = tokio::spawn(async move {
            let kind = loop {
                match stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let event = RelayEvent {
                            generation,
                            kind: RelayEventKind::Reply(text),
                        };
                        if events.send(event).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Binary(data))) => {
                        let event = RelayEvent {
                            generation,
                            kind: RelayEventKind::Reply(String::from_utf8_lossy(&data).into_owned()),
                        };
                        if events.send(event).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break RelayEventKind::Closed,
                    Some(Ok(_)) => {} // Ping/Pong
                    Some(Err(e)) => break RelayEventKind::Error(e.to_string()),
                }
            };

            debug!("Relay reader {} finished: {:?}", generation, kind);
            let _ = events.send(RelayEvent { generation, kind }).await;
        });

        Ok(RelayConnection::new(generation, tx, vec![writer, reader]))
    }
}
