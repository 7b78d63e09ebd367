//! Error types for TL1 message decoding

use thiserror::Error;

/// Errors that abort decoding of a whole message
///
/// Row-level anomalies never surface here; they are logged and the row is
/// skipped (see [`DecodeWarning`](crate::model::DecodeWarning)).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No line carrying SID, date and time was found
    #[error("Malformed message: missing header line")]
    MissingHeader,

    /// The header was found but no ident line follows it
    #[error("Malformed message: missing ident line")]
    MissingIdent,

    /// The ident line starts with a token that is neither `M` nor an autonomous code
    #[error("Malformed message: unrecognized ident token '{0}'")]
    MalformedMessage(String),
}

/// Result type alias for decoding operations
pub type DecodeResult<T> = Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let error = DecodeError::MalformedMessage("XX".to_string());
        assert_eq!(
            error.to_string(),
            "Malformed message: unrecognized ident token 'XX'"
        );

        assert_eq!(
            DecodeError::MissingHeader.to_string(),
            "Malformed message: missing header line"
        );
    }
}
