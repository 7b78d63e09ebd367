//! Error types for TL1 sessions

use thiserror::Error;
use tl1_client::ChannelError;
use tl1_parser::DecodeError;

/// Why a command or session operation failed
#[derive(Error, Debug)]
pub enum SessionError {
    /// No complete response before the deadline
    #[error("no response before the deadline")]
    Timeout,

    /// The equipment rejected the command
    #[error("command denied with {code}: {}", .lines.join(" | "))]
    Deny { code: String, lines: Vec<String> },

    /// The connection dropped and could not be restored before the deadline
    #[error("connection lost, gave up after {attempts} reconnect attempts")]
    ReconnectExhausted { attempts: u32 },

    /// The response completed but the entity is not in the expected state
    #[error("expected state {expected}, found {observed}")]
    ConditionMismatch { expected: String, observed: String },

    /// The command completed although a denial was expected
    #[error("command completed but a denial was expected")]
    UnexpectedCompletion,

    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to start collector thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
