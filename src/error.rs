//! Error types for the chat client.
//!
//! Every failure in the client maps onto one of four kinds: transport
//! loss, protocol anomalies, backend-reported errors, and user
//! preconditions. None of them is fatal to the process.

use thiserror::Error;

/// Errors that can occur while driving a chat session.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The transport is not connected.
    #[error("Not connected to the chat server")]
    NotConnected,

    /// A request was submitted without a selected model.
    #[error("No model selected")]
    NoModelSelected,

    /// A request was submitted while another turn is still streaming.
    #[error("A response is already in progress")]
    TurnInProgress,

    /// A request was submitted with blank input.
    #[error("Input is empty")]
    EmptyInput,

    /// The requested model is not in the catalog.
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// Transport-level failure (channel closed, connect failed).
    #[error("Transport error: {0}")]
    Transport(String),

    /// WebSocket protocol failure.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Malformed or unrecognized frame.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Model catalog fetch failed.
    #[error("Model catalog error: {0}")]
    Catalog(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether this error is a locally rejected user action.
    ///
    /// Precondition failures happen before anything is sent and leave the
    /// session untouched.
    pub const fn is_user_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::NoModelSelected
                | Self::TurnInProgress
                | Self::EmptyInput
                | Self::UnknownModel(_)
        )
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<tungstenite::Error> for ClientError {
    fn from(err: tungstenite::Error) -> Self {
        Self::WebSocket(err.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Catalog(format!("request timed out: {err}"))
        } else if err.is_connect() {
            Self::Catalog(format!("connection failed: {err}"))
        } else {
            Self::Catalog(err.to_string())
        }
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ClientError::NotConnected.to_string(),
            "Not connected to the chat server"
        );
        assert_eq!(
            ClientError::UnknownModel("qwen3".to_string()).to_string(),
            "Unknown model: qwen3"
        );
    }

    #[test]
    fn test_precondition_classification() {
        assert!(ClientError::NoModelSelected.is_user_precondition());
        assert!(ClientError::TurnInProgress.is_user_precondition());
        assert!(!ClientError::Protocol("bad".to_string()).is_user_precondition());
        assert!(!ClientError::Transport("closed".to_string()).is_user_precondition());
    }

    #[test]
    fn test_json_error_is_protocol() {
        let err: ClientError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, ClientError::Protocol(_)));
    }
}
