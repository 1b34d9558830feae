//! Tagged wire frames and the spillover envelope.
//!
//! Every enqueued body is a frame carrying a type tag and the payload
//! bytes, so the dequeue side can reconstruct the original application
//! type without the caller naming it, and can tell a real payload apart
//! from the envelope that points at a spillover blob. This is an internal
//! format between enqueue and dequeue of the same system, not a public
//! interchange format.

use crate::error::CodecError;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use storage_runtime::BlobName;

/// Wire tag reserved for the spillover envelope
pub(crate) const ENVELOPE_TAG: &str = "overflow.envelope";

/// Payload type carried through the queue
///
/// The tag must be stable across enqueue and dequeue of the same system
/// and must not collide with the reserved envelope tag. Applications with
/// more than one message shape declare a single closed sum type and tag
/// that.
pub trait QueuePayload: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable tag identifying the payload type on the wire
    const TYPE_TAG: &'static str;
}

/// Frame written to the queue transport (and to spillover blobs)
#[derive(Debug, Serialize, Deserialize)]
struct WireFrame {
    tag: String,
    #[serde(with = "bytes_serde")]
    body: Bytes,
}

/// Custom serialization for Bytes
mod bytes_serde {
    use base64::{engine::general_purpose, Engine as _};
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = general_purpose::STANDARD.encode(bytes);
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let decoded = general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)?;
        Ok(Bytes::from(decoded))
    }
}

/// Pointer record substituted into the queue for an oversized message
///
/// Never exposed to callers; created at enqueue time when the payload
/// exceeds the effective size threshold and consumed at dequeue time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct OverflowEnvelope {
    pub blob_name: BlobName,
}

/// Result of decoding a queue body
#[derive(Debug)]
pub(crate) enum DecodedBody<P> {
    /// The frame carried the payload directly
    Payload(P),
    /// The frame was an envelope pointing at a spillover blob
    Envelope(OverflowEnvelope),
}

/// Encode a payload into its wire frame
pub(crate) fn encode_payload<P: QueuePayload>(payload: &P) -> Result<Bytes, CodecError> {
    let body = serde_json::to_vec(payload)?;
    encode_frame(P::TYPE_TAG, Bytes::from(body))
}

/// Encode a spillover envelope into its wire frame
pub(crate) fn encode_envelope(envelope: &OverflowEnvelope) -> Result<Bytes, CodecError> {
    let body = serde_json::to_vec(envelope)?;
    encode_frame(ENVELOPE_TAG, Bytes::from(body))
}

fn encode_frame(tag: &str, body: Bytes) -> Result<Bytes, CodecError> {
    let frame = WireFrame {
        tag: tag.to_string(),
        body,
    };
    Ok(Bytes::from(serde_json::to_vec(&frame)?))
}

/// Decode a wire frame into either the payload or the envelope
///
/// A tag matching neither the payload type nor the envelope is rejected;
/// type fidelity is checked, not assumed.
pub(crate) fn decode<P: QueuePayload>(bytes: &[u8]) -> Result<DecodedBody<P>, CodecError> {
    let frame: WireFrame = serde_json::from_slice(bytes)?;

    if frame.tag == P::TYPE_TAG {
        let payload = serde_json::from_slice(&frame.body)?;
        Ok(DecodedBody::Payload(payload))
    } else if frame.tag == ENVELOPE_TAG {
        let envelope = serde_json::from_slice(&frame.body)?;
        Ok(DecodedBody::Envelope(envelope))
    } else {
        Err(CodecError::UnknownTag { tag: frame.tag })
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
