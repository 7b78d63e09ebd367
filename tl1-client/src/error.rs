//! Error types for the TL1 channel

use std::io;

use thiserror::Error;

/// Errors raised by a [`Channel`](crate::Channel) or its transport
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The read deadline passed before a complete frame arrived
    #[error("timed out waiting for a complete frame")]
    Timeout,

    /// The peer closed the connection
    #[error("connection closed by peer")]
    Disconnected,

    /// Socket level failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The connection could not be established
    #[error("failed to connect to {0}")]
    Connect(String),
}

impl ChannelError {
    /// Whether the channel must be torn down and reopened after this error
    pub fn is_transport_failure(&self) -> bool {
        !matches!(self, ChannelError::Timeout)
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_keeps_channel() {
        assert!(!ChannelError::Timeout.is_transport_failure());
        assert!(ChannelError::Disconnected.is_transport_failure());
        let io_err: ChannelError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(io_err.is_transport_failure());
        assert_eq!(
            ChannelError::Connect("ne-1:3083".to_string()).to_string(),
            "failed to connect to ne-1:3083"
        );
    }
}
