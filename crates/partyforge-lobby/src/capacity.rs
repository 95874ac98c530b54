//! Capacity policies: how many players a game mode needs.
//!
//! Mode descriptors look like `"1v1"`, `"2v2"`, `"3v3"`. Whether the
//! leading number counts one side or everyone depends on the kind of
//! session, so the conversion is a pluggable [`CapacityPolicy`] and the
//! caller picks one through [`SessionKind`].

use crate::LobbyError;

/// Maps a game-mode descriptor to the total number of players required.
///
/// Implementations must be pure: the same descriptor always yields the
/// same answer, and a successful answer is at least 1.
pub trait CapacityPolicy: Send + Sync + 'static {
    /// # Errors
    /// [`LobbyError::InvalidMode`] if `mode` carries no usable count.
    fn required_players(&self, mode: &str) -> Result<usize, LobbyError>;
}

/// Duel convention: the leading number is the size of one side and two
/// sides play, so `"2v2"` needs 4 players.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuelCapacity;

impl CapacityPolicy for DuelCapacity {
    fn required_players(&self, mode: &str) -> Result<usize, LobbyError> {
        leading_count(mode)?
            .checked_mul(2)
            .ok_or_else(|| LobbyError::InvalidMode(mode.to_string()))
    }
}

/// Party convention: the leading number is the total headcount, so
/// `"4-stack"` needs 4 players.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartyCapacity;

impl CapacityPolicy for PartyCapacity {
    fn required_players(&self, mode: &str) -> Result<usize, LobbyError> {
        leading_count(mode)
    }
}

/// The kind of session being announced, which decides the capacity
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionKind {
    /// Two teams of the leading size (`/party duel_type:2v2` → 4 players).
    #[default]
    Duel,
    /// The leading number is everyone, host included.
    Party,
}

impl SessionKind {
    /// Returns the capacity policy for this kind.
    pub fn policy(self) -> Box<dyn CapacityPolicy> {
        match self {
            Self::Duel => Box::new(DuelCapacity),
            Self::Party => Box::new(PartyCapacity),
        }
    }

    /// Parses a kind name as used in configuration (`duel` or `party`,
    /// case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "duel" => Some(Self::Duel),
            "party" => Some(Self::Party),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duel => write!(f, "duel"),
            Self::Party => write!(f, "party"),
        }
    }
}

/// Parses the run of ASCII digits at the start of `mode`.
///
/// Zero, an empty run, and values that overflow `usize` are all invalid.
fn leading_count(mode: &str) -> Result<usize, LobbyError> {
    let digits = mode.bytes().take_while(u8::is_ascii_digit).count();
    mode[..digits]
        .parse::<usize>()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| LobbyError::InvalidMode(mode.to_string()))
}
