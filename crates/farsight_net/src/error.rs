//! # Network Error Types

use farsight_shared::FarsightError;
use thiserror::Error;

/// Errors raised by framing, handshakes and connections.
#[derive(Error, Debug)]
pub enum NetError {
    /// Socket failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame did not decode.
    #[error("protocol error: {0}")]
    Protocol(#[from] FarsightError),

    /// The connect header did not start with the protocol magic.
    #[error("invalid connect magic")]
    InvalidMagic,

    /// The peer speaks a different protocol version.
    #[error("protocol mismatch: expected version {expected}, found {found}")]
    ProtocolMismatch {
        /// Our version.
        expected: u16,
        /// Their version.
        found: u16,
    },

    /// The provider refused the connection.
    #[error("connection rejected by provider")]
    Rejected,

    /// A frame exceeded the size limit.
    #[error("frame of {0} bytes exceeds the limit")]
    FrameTooLarge(usize),

    /// The connection is closed.
    #[error("connection closed")]
    Closed,
}

impl NetError {
    /// Returns true if the error ends the connection.
    ///
    /// Only application-level protocol errors leave the stream usable.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Protocol(err) => err.is_fatal(),
            _ => true,
        }
    }
}

/// Result type for network operations.
pub type NetResult<T> = Result<T, NetError>;
