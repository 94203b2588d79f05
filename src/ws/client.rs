//! WebSocket client with automatic reconnection

use super::types::{WsConfig, WsError, WsMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Reusable WebSocket client with automatic reconnection and ping keepalive
pub struct WsClient {
    config: WsConfig,
}

impl WsClient {
    /// Create a new WebSocket client with the given configuration
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }

    /// Create a new client with just a URL using default config
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::new(WsConfig::new(url))
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Connect in the background
    ///
    /// Returns `(events, outgoing)`. `events` yields every text frame plus
    /// the connection lifecycle (`Connected`, `Reconnecting`,
    /// `Disconnected`); strings sent on `outgoing` are written as text
    /// frames on the current connection. Dropping either end shuts the
    /// connection down.
    pub fn connect(&self) -> (mpsc::Receiver<WsMessage>, mpsc::Sender<String>) {
        let (msg_tx, msg_rx) = mpsc::channel(1024);
        let (send_tx, send_rx) = mpsc::channel(256);
        let config = self.config.clone();

        tokio::spawn(async move {
            if let Err(e) = Self::run_connection_loop(config, msg_tx, send_rx).await {
                tracing::error!(error = %e, "WebSocket connection loop failed");
            }
        });

        (msg_rx, send_tx)
    }

    /// Keep a connection alive until the consumer goes away
    async fn run_connection_loop(
        config: WsConfig,
        tx: mpsc::Sender<WsMessage>,
        mut send_rx: mpsc::Receiver<String>,
    ) -> Result<(), WsError> {
        let mut reconnect_attempts = 0;
        let mut reconnect_delay = config.initial_reconnect_delay;

        loop {
            let outcome = match Self::open(&config).await {
                Ok(socket) => {
                    reconnect_attempts = 0;
                    reconnect_delay = config.initial_reconnect_delay;

                    if tx.send(WsMessage::Connected).await.is_err() {
                        return Ok(());
                    }
                    Self::stream(socket, &config, &tx, &mut send_rx).await
                }
                Err(e) => Err(e),
            };

            let e = match outcome {
                Ok(()) => {
                    tracing::debug!(url = %config.url, "Consumer dropped, closing WebSocket");
                    return Ok(());
                }
                Err(e) => e,
            };

            reconnect_attempts += 1;
            tracing::warn!(
                url = %config.url,
                error = %e,
                attempt = reconnect_attempts,
                "WebSocket connection error, reconnecting..."
            );

            // 0 = infinite
            if config.max_reconnect_attempts > 0
                && reconnect_attempts >= config.max_reconnect_attempts
            {
                tracing::error!(url = %config.url, "Max reconnection attempts reached");
                let _ = tx.send(WsMessage::Disconnected).await;
                return Err(WsError::MaxReconnectsExceeded);
            }

            if tx
                .send(WsMessage::Reconnecting {
                    attempt: reconnect_attempts,
                })
                .await
                .is_err()
            {
                return Ok(());
            }

            sleep(reconnect_delay).await;
            reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay);
        }
    }

    async fn open(config: &WsConfig) -> Result<Socket, WsError> {
        tracing::info!(url = %config.url, "Connecting to WebSocket");

        let (socket, _response) = connect_async(config.url.as_str())
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        tracing::info!(url = %config.url, "WebSocket connected");
        Ok(socket)
    }

    /// Pump one connection
    ///
    /// `Ok(())` means the consumer is gone and we should stop; any error
    /// means the connection is lost and should be retried.
    async fn stream(
        socket: Socket,
        config: &WsConfig,
        tx: &mpsc::Sender<WsMessage>,
        send_rx: &mut mpsc::Receiver<String>,
    ) -> Result<(), WsError> {
        let (mut write, mut read) = socket.split();

        let mut ping_interval = tokio::time::interval(config.ping_interval);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick completes immediately
        ping_interval.tick().await;
        let mut waiting_for_pong = false;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if tx.send(WsMessage::Text(text)).await.is_err() {
                                let _ = write.send(Message::Close(None)).await;
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            waiting_for_pong = false;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            return Err(WsError::ConnectionFailed(format!("closed by server: {:?}", frame)));
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            return Err(WsError::ConnectionFailed(e.to_string()));
                        }
                        None => {
                            return Err(WsError::ConnectionFailed("Stream ended unexpectedly".into()));
                        }
                    }
                }

                outgoing = send_rx.recv() => {
                    match outgoing {
                        Some(text) => {
                            write.send(Message::Text(text)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        None => {
                            let _ = write.send(Message::Close(None)).await;
                            return Ok(());
                        }
                    }
                }

                _ = ping_interval.tick() => {
                    if waiting_for_pong {
                        return Err(WsError::ConnectionFailed("Pong timeout".into()));
                    }
                    write.send(Message::Ping(Vec::new())).await
                        .map_err(|e| WsError::SendFailed(e.to_string()))?;
                    waiting_for_pong = true;
                }
            }
        }
    }
}
