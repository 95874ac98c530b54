//! Custom-id format of announcement join buttons.
//!
//! The chat platform hands back only the button's custom id when a user
//! clicks it, so the session id must round-trip through that string.

use std::fmt;

use crate::{ProtocolError, SessionId};

/// Custom id of a join button: `join_party_<session id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinButtonId(SessionId);

impl JoinButtonId {
    /// Prefix every join button id starts with.
    pub const PREFIX: &'static str = "join_party_";

    /// Builds the button id for a session.
    pub fn for_session(session_id: SessionId) -> Self {
        Self(session_id)
    }

    /// Parses a raw custom id.
    ///
    /// Only the prefix is stripped; the rest is taken verbatim, so ids
    /// that themselves contain `_` survive intact.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidMessage`] if the prefix is missing or
    /// nothing follows it.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        match raw.strip_prefix(Self::PREFIX) {
            Some(rest) if !rest.is_empty() => Ok(Self(SessionId::new(rest))),
            Some(_) => Err(ProtocolError::InvalidMessage(
                "join button id has no session".into(),
            )),
            None => Err(ProtocolError::InvalidMessage(format!(
                "not a join button id: {raw}"
            ))),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.0
    }

    pub fn into_session_id(self) -> SessionId {
        self.0
    }
}

impl fmt::Display for JoinButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_prefix() {
        let id = JoinButtonId::parse("join_party_123-a1b2").unwrap();
        assert_eq!(id.session_id().as_str(), "123-a1b2");
    }

    #[test]
    fn test_parse_keeps_underscores_in_session_id() {
        let id = JoinButtonId::parse("join_party_a_b_c").unwrap();
        assert_eq!(id.into_session_id(), SessionId::new("a_b_c"));
    }

    #[test]
    fn test_parse_rejects_other_buttons() {
        assert!(JoinButtonId::parse("leave_party_1-a").is_err());
        assert!(JoinButtonId::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_session() {
        let err = JoinButtonId::parse("join_party_").unwrap_err();
        assert!(err.to_string().contains("no session"));
    }

    #[test]
    fn test_display_matches_parse_input() {
        let raw = "join_party_77-ffee";
        assert_eq!(JoinButtonId::parse(raw).unwrap().to_string(), raw);
    }
}
