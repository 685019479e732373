//! Error types for frame decoding, streaming connections and REST calls.

use thiserror::Error;

/// A frame could not be decoded from the bytes received on the wire.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The buffer ended before a command line was found.
    #[error("malformed frame: no command line")]
    MissingCommand,

    /// A header line has no `:` separator.
    #[error("malformed frame: header line without ':' separator: {line:?}")]
    MissingSeparator { line: String },

    /// A known header carries a value that does not fit its schema.
    #[error("malformed frame: invalid value {value:?} for header {name}")]
    InvalidHeader { name: String, value: String },

    /// The body of a SEND/MESSAGE/ERROR frame is not valid JSON.
    #[error("malformed frame: body is not valid JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// Input ended before the terminating NUL (strict decoding only).
    #[error("malformed frame: input ended before the terminating NUL")]
    Truncated,
}

/// Errors surfaced by the streaming subsystem.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Opening the socket or the CONNECT/CONNECTED exchange failed.
    #[error("handshake failed: {reason}")]
    HandshakeFailed { reason: String },

    /// A SUBSCRIBE frame could not be written. The connection stays usable.
    #[error("failed to send frame: {0}")]
    SendFailed(String),

    /// The connection is closed; no further subscriptions are possible.
    #[error("stream connection closed")]
    ConnectionClosed,

    /// A single frame could not be decoded.
    #[error(transparent)]
    MalformedFrame(#[from] FrameError),

    /// The underlying socket reported an error while reading.
    #[error("socket error: {0}")]
    Socket(String),

    /// The node URL could not be turned into a streaming endpoint.
    #[error("invalid node URL: {0}")]
    InvalidUrl(String),
}

impl StreamError {
    pub fn handshake(reason: impl Into<String>) -> Self {
        Self::HandshakeFailed {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the error ends the connection for every subscriber.
    pub fn is_connection_level(&self) -> bool {
        matches!(
            self,
            Self::HandshakeFailed { .. } | Self::ConnectionClosed | Self::Socket(_)
        )
    }
}

/// Errors that can occur during a REST request to the node.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, reset, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The node answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Request timed out after the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Response could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    /// Returns `true` if this error is retryable (transient).
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Deserialization(_) | Self::InvalidUrl(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        let e = TransportError::Status {
            status: 503,
            body: "busy".into(),
        };
        assert!(e.is_retryable());
        let e = TransportError::Status {
            status: 404,
            body: "not found".into(),
        };
        assert!(!e.is_retryable());
        assert!(TransportError::Timeout { ms: 10 }.is_retryable());
    }

    #[test]
    fn connection_level_classification() {
        assert!(StreamError::ConnectionClosed.is_connection_level());
        assert!(StreamError::handshake("refused").is_connection_level());
        assert!(!StreamError::SendFailed("broken pipe".into()).is_connection_level());
        assert!(!StreamError::MalformedFrame(FrameError::MissingCommand).is_connection_level());
    }
}
