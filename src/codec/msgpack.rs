//! MessagePack codec backed by `rmpv`.

use rmpv::Value;

use super::Codec;
use crate::error::EmitterError;

/// Default [`Codec`]: plain MessagePack via `rmpv`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Creates the codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Codec for MsgPackCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, EmitterError> {
        let mut buf = Vec::with_capacity(64);
        rmpv::encode::write_value(&mut buf, value)?;
        Ok(buf)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, EmitterError> {
        let mut cursor = bytes;
        let value = rmpv::decode::read_value(&mut cursor)?;
        if !cursor.is_empty() {
            return Err(EmitterError::Decoding(format!(
                "{} trailing bytes after value",
                cursor.len()
            )));
        }
        Ok(value)
    }
}
