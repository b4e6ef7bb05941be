//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating wire
/// values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing required field,
    /// or a board that is not 3x3.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but breaks a value rule, e.g. a board cell of 9.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
