//! Error types for the lobby layer.

use partyforge_protocol::SessionId;

/// Errors that can occur while creating a session.
///
/// Join attempts never fail with an error; their result is a
/// [`JoinOutcome`](crate::JoinOutcome).
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The game-mode descriptor has no leading player count, or the count
    /// is too small to form a session.
    #[error("invalid game mode {0:?}")]
    InvalidMode(String),

    /// A freshly generated session id is already in the store. This is a
    /// broken invariant, not a user error: the insert is refused.
    #[error("session id {0} is already in use")]
    IdCollision(SessionId),
}
