//! In-memory transport for tests and dry runs.
//!
//! Records every successful publish in order and can be told to fail a
//! specific publish attempt, which is how partial fan-out failures are
//! exercised.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::Transport;
use crate::error::EmitterError;

/// A publish captured by [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    /// Target channel.
    pub channel: String,
    /// Envelope bytes.
    pub payload: Vec<u8>,
}

/// Recording transport.
///
/// # Example
///
/// ```ignore
/// let transport = Arc::new(MemoryTransport::new());
/// let emitter = Emitter::new(&config, Arc::clone(&transport));
/// emitter.to("lobby").emit("msg", "hi")?;
/// assert_eq!(transport.channels(), vec!["socket.io#/#lobby#"]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryTransport {
    published: Mutex<Vec<PublishedMessage>>,
    attempts: AtomicUsize,
    fail_at: Option<usize>,
    receivers: usize,
}

impl MemoryTransport {
    /// Creates a transport that accepts every publish.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport whose `attempt`-th publish (1-based) fails.
    #[must_use]
    pub fn failing_at(attempt: usize) -> Self {
        Self {
            fail_at: Some(attempt),
            ..Self::default()
        }
    }

    /// Sets the subscriber count reported for each publish.
    #[must_use]
    pub fn with_receivers(mut self, receivers: usize) -> Self {
        self.receivers = receivers;
        self
    }

    /// Successful publishes in order.
    #[must_use]
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Channels of the successful publishes in order.
    #[must_use]
    pub fn channels(&self) -> Vec<String> {
        self.published().into_iter().map(|m| m.channel).collect()
    }

    /// Number of publish calls, including failed ones.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Forgets all recorded publishes and attempts.
    pub fn clear(&self) {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.attempts.store(0, Ordering::SeqCst);
    }

    fn record(&self, channel: &str, payload: &[u8]) -> Result<usize, EmitterError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        if self.fail_at == Some(attempt) {
            return Err(EmitterError::transport(
                channel,
                format!("injected failure on publish #{attempt}"),
            ));
        }
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PublishedMessage {
                channel: channel.to_string(),
                payload: payload.to_vec(),
            });
        Ok(self.receivers)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn publish(&self, channel: &str, payload: &[u8]) -> Result<usize, EmitterError> {
        self.record(channel, payload)
    }

    async fn publish_async(&self, channel: &str, payload: &[u8]) -> Result<usize, EmitterError> {
        tokio::task::yield_now().await;
        self.record(channel, payload)
    }
}
