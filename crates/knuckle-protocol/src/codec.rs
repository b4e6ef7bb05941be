//! Codec trait and implementations for moving wire values to and from bytes.
//!
//! The synchronization layer hands subscribers typed [`Update`](crate::Update)
//! values; whatever carries them to a remote client picks a [`Codec`] to
//! turn them into bytes. [`JsonCodec`] is the only implementation today.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// `Send + Sync + 'static` so one codec can be shared by every session
/// actor and connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do not
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`. Behind the `json` feature (default).
///
/// ```rust
/// use knuckle_protocol::{Codec, JsonCodec, Request};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Request::Place { row: 1 }).unwrap();
/// let decoded: Request = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, Request::Place { row: 1 });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{SessionId, Snapshot, Update};

    #[test]
    fn test_json_codec_update_survives_the_wire() {
        let codec = JsonCodec;
        let update = Update {
            seq: 3,
            changed: vec![crate::SnapshotField::Running],
            snapshot: Snapshot::empty(SessionId::new("z")),
        };
        let bytes = codec.encode(&update).unwrap();
        let decoded: Update = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, update);
    }

    #[test]
    fn test_json_codec_decode_garbage_is_decode_error() {
        let result: Result<Update, _> = JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
