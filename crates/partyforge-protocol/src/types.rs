//! Core protocol types: identifiers, commands, events, and envelopes.
//!
//! Everything in this module crosses the gateway boundary, so every type
//! derives `Serialize`/`Deserialize` and the JSON shape is pinned by the
//! tests at the bottom of the file.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::JoinButtonId;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A chat-platform user.
///
/// Platform user ids are 64-bit snowflakes, so this wraps a `u64`. The
/// newtype keeps a user id from being passed where some other number is
/// expected. `#[serde(transparent)]` makes `UserId(42)` travel as `42`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// Opaque identifier of one matchmaking session.
///
/// Sessions are addressed by string because the id ends up embedded in a
/// button custom id on the chat platform. The lobby builds it as
/// `<host>-<random token>` (see [`SessionId::from_parts`]); nothing else
/// should rely on that shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an already-formed identifier (e.g. one read back from a button).
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Builds an identifier from the host and a random token.
    pub fn from_parts(host: UserId, token: &str) -> Self {
        Self(format!("{}-{token}", host.0))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionView: what the adapter renders
// ---------------------------------------------------------------------------

/// Read-only view of a session, enough to render the announcement embed.
///
/// The access code is deliberately absent: it only ever reaches users
/// through a direct access-link delivery, never the public announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub host: UserId,
    /// Game-mode descriptor as the host typed it, e.g. `"2v2"`.
    pub mode: String,
    pub region: String,
    /// Members in join order. `members[0]` is always the host.
    pub members: Vec<UserId>,
    /// Total players required to complete the session.
    pub capacity: usize,
    /// Players still missing (`capacity - members.len()`).
    pub remaining: usize,
}

impl SessionView {
    /// Label for the join button, e.g. `Join Party (2/4)`.
    pub fn join_label(&self) -> String {
        format!("Join Party ({}/{})", self.members.len(), self.capacity)
    }

    /// Custom id the adapter attaches to the join button.
    pub fn button_id(&self) -> JoinButtonId {
        JoinButtonId::for_session(self.session_id.clone())
    }

    /// Returns `true` once every slot is taken.
    pub fn is_full(&self) -> bool {
        self.remaining == 0
    }
}

// ---------------------------------------------------------------------------
// RejectReason
// ---------------------------------------------------------------------------

/// Why a join (or create) request was turned down.
///
/// These are ordinary outcomes, not failures: the adapter shows
/// [`user_message`](Self::user_message) to the requesting user only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The session completed, expired, or never existed.
    UnknownSession,
    /// The user is already a member (this includes the host).
    AlreadyMember,
    /// Every slot is taken.
    SessionFull,
    /// The game-mode descriptor has no usable player count.
    InvalidMode,
}

impl RejectReason {
    /// Text shown to the user whose request was rejected.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::UnknownSession => "This party is no longer open.",
            Self::AlreadyMember => "You have already joined this party.",
            Self::SessionFull => "This party is already full.",
            Self::InvalidMode => "That game mode is not supported.",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSession => write!(f, "UnknownSession"),
            Self::AlreadyMember => write!(f, "AlreadyMember"),
            Self::SessionFull => write!(f, "SessionFull"),
            Self::InvalidMode => write!(f, "InvalidMode"),
        }
    }
}

// ---------------------------------------------------------------------------
// Commands (adapter → server)
// ---------------------------------------------------------------------------

/// Requests the chat-platform adapter sends to the server.
///
/// `#[serde(tag = "type")]` puts the variant name next to the fields:
/// `{"type": "Join", "session_id": "...", "user": 7}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// First message on every connection.
    Handshake { version: u32 },

    /// A user announced a new session (the `/party` slash command).
    CreateSession {
        host: UserId,
        mode: String,
        region: String,
        access_code: String,
    },

    /// A user asked to join a session by id.
    Join { session_id: SessionId, user: UserId },

    /// A user pressed a join button; `custom_id` is the button's raw id.
    JoinByButton { custom_id: String, user: UserId },

    /// Lists every session that is still open.
    ListSessions,

    /// Liveness probe from the adapter.
    Heartbeat { client_time: u64 },

    /// The adapter is going away.
    Disconnect { reason: String },
}

// ---------------------------------------------------------------------------
// Events (server → adapter)
// ---------------------------------------------------------------------------

/// Replies and notifications the server sends to the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Handshake accepted.
    HandshakeAck { server_time: u64 },

    /// A session was created; render the announcement from `view`.
    SessionOpened { view: SessionView },

    /// A session could not be created. Show `reason.user_message()` to
    /// `host` only.
    SessionRejected {
        host: UserId,
        mode: String,
        reason: RejectReason,
    },

    /// A join went through. `completed` is `true` when this join filled
    /// the last slot; the session is already gone from the server by the
    /// time the adapter sees this.
    JoinAccepted { view: SessionView, completed: bool },

    /// A join was turned down.
    JoinRejected {
        session_id: SessionId,
        user: UserId,
        reason: RejectReason,
    },

    /// Reply to [`Command::ListSessions`].
    SessionList { sessions: Vec<SessionView> },

    /// Reply to [`Command::Heartbeat`].
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// Request could not be processed. Codes follow HTTP semantics
    /// (400 bad request, 500 server fault).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Payload & Envelope
// ---------------------------------------------------------------------------

/// Direction-tagged content of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    Command(Command),
    Event(Event),
}

/// The unit of transfer on the gateway connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-connection sequence number, assigned by the sender.
    pub seq: u64,
    /// Milliseconds since the sender's connection started.
    pub timestamp: u64,
    pub payload: Payload,
}
