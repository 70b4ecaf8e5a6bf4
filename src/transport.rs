//! Outbound transport abstraction.
//!
//! The dispatcher never talks to the network itself; it hands a fully
//! assembled [`OutboundMessage`] to whatever [`Transport`] it was
//! constructed with. The transport is an explicit dependency, not a
//! process-wide registry lookup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::OutboundMessage;

/// Errors a transport can raise while sending a message.
///
/// The variants mirror the phases of an SMTP-style conversation, but
/// nothing here assumes SMTP specifically; a transport maps its own
/// failures onto these.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Every recipient was refused at the protocol layer.
    #[error("recipients refused: {0}")]
    RecipientsRefused(String),

    /// The server rejected the greeting/handshake.
    #[error("greeting rejected: {0}")]
    HeloFailed(String),

    /// The sender address was refused.
    #[error("sender refused: {0}")]
    SenderRefused(String),

    /// The data phase failed after the envelope was accepted.
    #[error("data phase failed: {0}")]
    DataFailed(String),

    /// The server does not support a command the transport issued.
    #[error("command not supported: {0}")]
    CommandNotSupported(String),

    /// The connection could not be established or was lost.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication with the server failed.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The message itself was rejected (policy, spam, size).
    #[error("message rejected: {0}")]
    MessageRejected(String),

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// The classification kind of this error, matched against the
    /// retry policy's configured retryable set.
    #[must_use]
    pub const fn kind(&self) -> TransportErrorKind {
        match self {
            Self::RecipientsRefused(_) => TransportErrorKind::RecipientsRefused,
            Self::HeloFailed(_) => TransportErrorKind::HeloFailed,
            Self::SenderRefused(_) => TransportErrorKind::SenderRefused,
            Self::DataFailed(_) => TransportErrorKind::DataFailed,
            Self::CommandNotSupported(_) => TransportErrorKind::CommandNotSupported,
            Self::ConnectionFailed(_) => TransportErrorKind::ConnectionFailed,
            Self::AuthenticationFailed(_) => TransportErrorKind::AuthenticationFailed,
            Self::MessageRejected(_) => TransportErrorKind::MessageRejected,
            Self::Io(_) => TransportErrorKind::Io,
        }
    }
}

/// Payload-free classification of [`TransportError`] variants.
///
/// Used in configuration to name which error kinds count as transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportErrorKind {
    RecipientsRefused,
    HeloFailed,
    SenderRefused,
    DataFailed,
    CommandNotSupported,
    ConnectionFailed,
    AuthenticationFailed,
    MessageRejected,
    Io,
}

/// An outbound mail transport.
///
/// One `send` call is one delivery attempt; the dispatcher treats it as
/// atomic and performs exactly one per job execution. Connection
/// management and pooling are the transport's concern.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a fully populated message.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] describing the failed phase.
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let err = TransportError::RecipientsRefused("550".to_string());
        assert_eq!(err.kind(), TransportErrorKind::RecipientsRefused);

        let err = TransportError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert_eq!(err.kind(), TransportErrorKind::Io);
    }

    #[test]
    fn kind_deserializes_from_kebab_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: TransportErrorKind,
        }

        let wrapper: Wrapper = toml::from_str("kind = \"recipients-refused\"").unwrap();
        assert_eq!(wrapper.kind, TransportErrorKind::RecipientsRefused);
    }
}
