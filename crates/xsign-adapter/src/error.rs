/*
[INPUT]:  Error sources (configuration, counter state, signing, HTTP, WebSocket, decoding)
[OUTPUT]: Structured error type tagged with the stage that failed
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use crate::types::StreamKind;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Main error type for the xsign adapter
#[derive(Error, Debug)]
pub enum XsignError {
    /// Missing or malformed key, API key, or request definition
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persisted replay counter cannot be used
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Cryptographic primitive rejected the digest or key
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    /// Server refused the authenticated upgrade request
    #[error("WebSocket handshake rejected with status {status}")]
    HandshakeRejected { status: u16 },

    /// Inbound frame does not match the session's message kind
    #[error("Failed to decode {kind} frame: {source}")]
    Decode {
        kind: StreamKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    Configuration,
    State,
    Signing,
    Transport,
    Decode,
}

impl XsignError {
    pub fn config(message: impl Into<String>) -> Self {
        XsignError::Config(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        XsignError::InvalidState(message.into())
    }

    /// Stage of the request pipeline that produced this error
    pub fn stage(&self) -> ErrorStage {
        match self {
            XsignError::Config(_) => ErrorStage::Configuration,
            XsignError::InvalidState(_) => ErrorStage::State,
            XsignError::SigningFailed(_) => ErrorStage::Signing,
            XsignError::Http(_)
            | XsignError::WebSocket(_)
            | XsignError::HandshakeRejected { .. } => ErrorStage::Transport,
            XsignError::Decode { .. } => ErrorStage::Decode,
        }
    }

    /// Transport errors end the current operation but leave local state usable
    pub fn is_transport(&self) -> bool {
        self.stage() == ErrorStage::Transport
    }

    /// Whether the error was raised before any network activity
    pub fn is_pre_network(&self) -> bool {
        matches!(
            self.stage(),
            ErrorStage::Configuration | ErrorStage::State | ErrorStage::Signing
        )
    }
}

impl From<tungstenite::Error> for XsignError {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::Http(response) => XsignError::HandshakeRejected {
                status: response.status().as_u16(),
            },
            other => XsignError::WebSocket(Box::new(other)),
        }
    }
}

/// Result type alias for xsign operations
pub type Result<T> = std::result::Result<T, XsignError>;
