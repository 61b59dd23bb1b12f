//! Transport layer: publishing envelopes on the bus.
//!
//! [`Transport`] is the only capability the emitter needs from the bus:
//! publish bytes on a channel, either blocking or from async code.
//! [`RedisTransport`] talks to Redis; [`MemoryTransport`] records
//! publishes in memory.

pub mod memory;
pub mod redis;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EmitterError;

pub use self::memory::{MemoryTransport, PublishedMessage};
pub use self::redis::{BusMessage, RedisTransport};

/// Port for publishing envelopes on a pub/sub bus.
///
/// Implementations publish each call exactly once: no retry, no
/// batching. Both methods return the number of subscribers the bus
/// reports as having received the message.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publishes `payload` on `channel`, blocking the calling thread.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Transport`] if the bus rejects the
    /// publish or cannot be reached.
    fn publish(&self, channel: &str, payload: &[u8]) -> Result<usize, EmitterError>;

    /// Publishes `payload` on `channel`, suspending until the bus has
    /// accepted it.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Transport`] if the bus rejects the
    /// publish or cannot be reached.
    async fn publish_async(&self, channel: &str, payload: &[u8]) -> Result<usize, EmitterError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn publish(&self, channel: &str, payload: &[u8]) -> Result<usize, EmitterError> {
        (**self).publish(channel, payload)
    }

    async fn publish_async(&self, channel: &str, payload: &[u8]) -> Result<usize, EmitterError> {
        (**self).publish_async(channel, payload).await
    }
}
