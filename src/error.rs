//! Emitter error types with stable numeric codes.
//!
//! [`EmitterError`] is the central error type of the crate. Every emit
//! failure surfaces as one of its variants; nothing is retried or
//! swallowed internally.

/// Error enum covering configuration, codec and transport failures.
///
/// # Error Code Ranges
///
/// | Range     | Category              | Retryable |
/// |-----------|-----------------------|-----------|
/// | 1000–1999 | Configuration / input | no        |
/// | 2000–2999 | Codec                 | no        |
/// | 3000–3999 | Transport             | yes       |
#[derive(Debug, thiserror::Error)]
pub enum EmitterError {
    /// Construction-time configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An emit call was made with arguments that cannot form a packet.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The codec could not represent a payload value.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// An envelope could not be decoded back into its parts.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Publishing an envelope on the bus failed.
    #[error("publish to {channel} failed: {message}")]
    Transport {
        /// Channel the failing publish targeted.
        channel: String,
        /// Underlying transport error message.
        message: String,
    },
}

impl EmitterError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Configuration(_) => 1001,
            Self::InvalidArgument(_) => 1002,
            Self::Encoding(_) => 2001,
            Self::Decoding(_) => 2002,
            Self::Transport { .. } => 3001,
        }
    }

    /// Returns `true` if repeating the same call could succeed.
    ///
    /// Only transport failures qualify; the emitter itself never retries.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Builds a [`EmitterError::Transport`] for the given channel.
    pub fn transport(channel: impl Into<String>, message: impl ToString) -> Self {
        Self::Transport {
            channel: channel.into(),
            message: message.to_string(),
        }
    }
}

impl From<rmpv::encode::Error> for EmitterError {
    fn from(err: rmpv::encode::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<rmpv::decode::Error> for EmitterError {
    fn from(err: rmpv::decode::Error) -> Self {
        Self::Decoding(err.to_string())
    }
}

impl From<rmpv::ext::Error> for EmitterError {
    fn from(err: rmpv::ext::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}
