//! MQTT channel error types.

use thiserror::Error;

/// Errors from publishing a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// No live broker connection. The caller owns retry policy.
    #[error("not connected to MQTT broker")]
    Disconnected,

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors from establishing the broker connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// The broker answered but refused the session (bad credentials,
    /// rejected client id, ...).
    #[error("broker refused connection: {0}")]
    Refused(String),

    #[error("no broker connection after {secs}s")]
    Timeout { secs: u64 },

    /// The client could not be set up from the given configuration.
    #[error("MQTT client error: {0}")]
    Client(String),
}

impl From<serde_json::Error> for PublishError {
    fn from(e: serde_json::Error) -> Self {
        PublishError::Serialization(e.to_string())
    }
}
