//! Unified error type for Partyforge.

use partyforge_lobby::LobbyError;
use partyforge_protocol::ProtocolError;
use partyforge_transport::TransportError;

/// Top-level error wrapping every crate-specific error.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum PartyforgeError {
    /// Connection-level failure (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encode/decode failure or a protocol rule violation.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Session creation failure.
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// A configuration value is missing or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: PartyforgeError = TransportError::SendFailed("gone".into()).into();
        assert!(matches!(err, PartyforgeError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: PartyforgeError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, PartyforgeError::Protocol(_)));
    }

    #[test]
    fn test_from_lobby_error() {
        let err: PartyforgeError = LobbyError::InvalidMode("x".into()).into();
        assert!(matches!(err, PartyforgeError::Lobby(_)));
        assert_eq!(err.to_string(), "invalid game mode \"x\"");
    }

    #[test]
    fn test_config_error_message() {
        let err = PartyforgeError::Config("PORT must be a number".into());
        assert_eq!(err.to_string(), "invalid configuration: PORT must be a number");
    }
}
