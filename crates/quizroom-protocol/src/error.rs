//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding protocol messages.
///
/// The split between [`Decode`](Self::Decode) and
/// [`InvalidData`](Self::InvalidData) mirrors the two reply codes a client
/// can get back: a frame that is not an envelope at all is a
/// `MESSAGE_ERROR`, an envelope whose `data` has the wrong shape is a
/// `DATA_ERROR`.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into JSON).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame could not be parsed as an envelope, or named an unknown
    /// message kind.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The envelope was fine but its `data` did not match the message kind.
    #[error("invalid data: {0}")]
    InvalidData(String),
}
