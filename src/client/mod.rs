//! WebSocket subscriber client.
//!
//! Connects to one broadcast channel of a running server and delivers
//! received frames to a callback. Subscribers reconnect autonomously with
//! a fixed backoff delay; the server never coordinates reconnection.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default delay between reconnection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Broadcast channel to subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamChannel {
    Logs,
    Files,
}

impl StreamChannel {
    /// URL path of the channel's WebSocket endpoint.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            StreamChannel::Logs => "/ws/logs",
            StreamChannel::Files => "/ws/files",
        }
    }
}

/// Errors that can occur constructing the client.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("Invalid server URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Persistent subscriber over one broadcast channel.
pub struct EventStreamClient {
    url: Url,
    reconnect_delay: Duration,
    cancel: CancellationToken,
}

impl EventStreamClient {
    /// Build a client for a channel of the server at `base_url`
    /// (e.g. `ws://127.0.0.1:3001`).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn new(
        base_url: &str,
        channel: StreamChannel,
        reconnect_delay: Duration,
        cancel: CancellationToken,
    ) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|source| ClientError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        let url = base
            .join(channel.path())
            .map_err(|source| ClientError::InvalidUrl {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            url,
            reconnect_delay,
            cancel,
        })
    }

    /// The resolved endpoint URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Connect and deliver each received text frame to `on_frame`,
    /// reconnecting after the fixed delay whenever the connection drops.
    /// Runs until cancellation.
    pub async fn run<F>(&self, mut on_frame: F)
    where
        F: FnMut(&str),
    {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            match connect_async(self.url.as_str()).await {
                Ok((stream, _response)) => {
                    tracing::info!(url = %self.url, "connected");
                    self.pump(stream, &mut on_frame).await;
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    tracing::warn!(url = %self.url, "connection lost, reconnecting");
                }
                Err(e) => {
                    tracing::warn!(url = %self.url, error = %e, "connection failed");
                }
            }

            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
    }

    async fn pump<F>(&self, mut stream: WsStream, on_frame: &mut F)
    where
        F: FnMut(&str),
    {
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                message = stream.next() => match message {
                    Some(Ok(Message::Text(text))) => on_frame(&text),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "stream error");
                        break;
                    }
                },
            }
        }
    }
}
