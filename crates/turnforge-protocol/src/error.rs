//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding turn bundles.
///
/// Note that the turn flow itself never sees these: the total codec
/// functions recover locally (empty bundle / `"null"` string) and only
/// log. They exist for callers that need the underlying cause.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a bundle into a transport string).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing turn count,
    /// or wrong field types.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
