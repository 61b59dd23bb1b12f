//! Redis-backed transport.
//!
//! Uses `PUBLISH` for emits and `PSUBSCRIBE` for monitoring. Connections
//! are opened lazily on first use: one blocking connection for
//! [`Transport::publish`] and one multiplexed async connection, shared by
//! every concurrent caller, for [`Transport::publish_async`].

use std::fmt;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tokio::sync::OnceCell;

use super::Transport;
use crate::config::BusConfig;
use crate::error::EmitterError;

/// A raw message received from a pub/sub subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Channel the message was published on.
    pub channel: String,
    /// Message bytes.
    pub payload: Vec<u8>,
}

/// Redis transport for production deployments.
pub struct RedisTransport {
    client: Client,
    blocking: Mutex<Option<redis::Connection>>,
    multiplexed: OnceCell<MultiplexedConnection>,
}

impl RedisTransport {
    /// Creates a transport for the configured Redis server.
    ///
    /// No connection is opened until the first publish.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Configuration`] if host or port is missing
    /// or the resulting URL is rejected by the client.
    pub fn connect(bus: &BusConfig) -> Result<Self, EmitterError> {
        let url = bus.url()?;
        let client = Client::open(url.as_str())
            .map_err(|e| EmitterError::Configuration(format!("invalid redis url: {e}")))?;
        tracing::debug!(host = ?bus.host, port = ?bus.port, db = bus.db, "redis transport configured");
        Ok(Self::from_client(client))
    }

    /// Wraps an existing client handle.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            blocking: Mutex::new(None),
            multiplexed: OnceCell::new(),
        }
    }

    /// Wraps an existing client together with an already open async
    /// connection, which is used for every async publish.
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// use socketio_emitter::config::EmitterConfig;
    /// use socketio_emitter::emitter::Emitter;
    /// use socketio_emitter::transport::RedisTransport;
    ///
    /// let client = redis::Client::open("redis://127.0.0.1:6379/")?;
    /// let connection = client.get_multiplexed_async_connection().await?;
    /// let emitter = Emitter::new(
    ///     &EmitterConfig::default(),
    ///     RedisTransport::with_connection(client, connection),
    /// );
    /// emitter.emit_async("news", "hello").await?;
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn with_connection(client: Client, connection: MultiplexedConnection) -> Self {
        Self {
            client,
            blocking: Mutex::new(None),
            multiplexed: OnceCell::new_with(Some(connection)),
        }
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    async fn multiplexed(&self) -> redis::RedisResult<MultiplexedConnection> {
        self.multiplexed
            .get_or_try_init(|| self.client.get_multiplexed_async_connection())
            .await
            .cloned()
    }

    /// Subscribes to every channel matching `pattern` and streams the raw
    /// messages.
    ///
    /// Opens a dedicated connection; it is closed when the stream is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Transport`] if the connection or the
    /// subscription fails.
    pub async fn monitor(&self, pattern: &str) -> Result<BoxStream<'static, BusMessage>, EmitterError> {
        let connection = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| EmitterError::transport(pattern, e))?;
        let mut pubsub = connection.into_pubsub();
        pubsub
            .psubscribe(pattern)
            .await
            .map_err(|e| EmitterError::transport(pattern, e))?;
        tracing::info!(pattern, "subscribed");

        Ok(pubsub
            .into_on_message()
            .map(|msg| BusMessage {
                channel: msg.get_channel_name().to_string(),
                payload: msg.get_payload_bytes().to_vec(),
            })
            .boxed())
    }
}

#[async_trait]
impl Transport for RedisTransport {
    fn publish(&self, channel: &str, payload: &[u8]) -> Result<usize, EmitterError> {
        let mut guard = self.blocking.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            let connection = self
                .client
                .get_connection()
                .map_err(|e| EmitterError::transport(channel, e))?;
            *guard = Some(connection);
        }
        let Some(connection) = guard.as_mut() else {
            return Err(EmitterError::transport(channel, "no blocking connection"));
        };

        let result: redis::RedisResult<usize> =
            redis::Commands::publish(connection, channel, payload);
        match result {
            Ok(receivers) => Ok(receivers),
            Err(e) => {
                // reopen on next publish
                *guard = None;
                Err(EmitterError::transport(channel, e))
            }
        }
    }

    async fn publish_async(&self, channel: &str, payload: &[u8]) -> Result<usize, EmitterError> {
        let mut connection = self
            .multiplexed()
            .await
            .map_err(|e| EmitterError::transport(channel, e))?;
        let receivers: usize = connection
            .publish(channel, payload)
            .await
            .map_err(|e: redis::RedisError| EmitterError::transport(channel, e))?;
        Ok(receivers)
    }
}

impl fmt::Debug for RedisTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisTransport")
            .field("client", &self.client)
            .field("multiplexed", &self.multiplexed.initialized())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn connect_requires_host_and_port() {
        let Err(err) = RedisTransport::connect(&BusConfig::default()) else {
            panic!("expected configuration error");
        };
        assert_eq!(err.error_code(), 1001);
    }

    #[test]
    fn connect_does_not_open_connections() {
        // nothing listens on port 1; construction must still succeed
        let transport = RedisTransport::connect(&BusConfig::new("127.0.0.1", 1));
        assert!(transport.is_ok());
    }

    #[test]
    fn publish_to_unreachable_server_is_transport_error() {
        let Ok(transport) = RedisTransport::connect(&BusConfig::new("127.0.0.1", 1)) else {
            panic!("construction failed");
        };
        let Err(err) = transport.publish("socket.io#/#", b"\x90") else {
            panic!("expected transport error");
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("socket.io#/#"));
    }
}
