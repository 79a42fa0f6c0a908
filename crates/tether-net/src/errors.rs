//! Transport error types.

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, NetError>;

/// Errors raised by the framed transport.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Socket-level failure, including EOF mid-frame.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame's length prefix exceeded the configured cap. Fails the
    /// connection: the peer is either malicious or desynchronized.
    #[error("frame of {len} bytes exceeds the {max} byte cap")]
    FrameTooLarge {
        /// Declared frame length.
        len: usize,
        /// Configured cap.
        max: usize,
    },

    /// Payload could not be serialized for the wire.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Operation requires a live connection.
    #[error("not connected")]
    NotConnected,
}
