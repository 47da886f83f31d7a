//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding or encoding wire messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("non-text frame")]
    NonTextFrame,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(ProtocolError::NonTextFrame.to_string(), "non-text frame");

        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let wrapped = ProtocolError::from(err);
        assert!(wrapped.to_string().starts_with("malformed message:"));
    }
}
