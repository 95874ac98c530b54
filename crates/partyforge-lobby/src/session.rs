//! The session record and its read-only snapshot.
//!
//! A session is one matchmaking request: who hosts it, what mode it is
//! for, and who has joined so far. `Session` is the mutable record that
//! lives in the store; callers only ever see [`SessionSnapshot`]s.

use std::time::Instant;

use partyforge_protocol::{SessionId, SessionView, UserId};

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Whether a session still has free slots.
///
/// Derived from the member count on demand, never stored:
///
/// ```text
/// Open ──(members == capacity)──→ Full ──→ removed from the store
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Open,
    Full,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Full => write!(f, "Full"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Mutable session record owned by the [`SessionStore`](crate::SessionStore).
///
/// Invariants while stored: `members` is non-empty, duplicate-free,
/// starts with `host`, and is shorter than `capacity`.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    id: SessionId,
    host: UserId,
    mode: String,
    region: String,
    access_code: String,
    members: Vec<UserId>,
    capacity: usize,
    created_at: Instant,
}

impl Session {
    /// A new open session whose only member is the host.
    pub(crate) fn open(
        id: SessionId,
        host: UserId,
        mode: String,
        region: String,
        access_code: String,
        capacity: usize,
    ) -> Self {
        Self {
            id,
            host,
            mode,
            region,
            access_code,
            members: vec![host],
            capacity,
            created_at: Instant::now(),
        }
    }

    pub(crate) fn id(&self) -> &SessionId {
        &self.id
    }

    pub(crate) fn created_at(&self) -> Instant {
        self.created_at
    }

    pub(crate) fn is_member(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }

    pub(crate) fn status(&self) -> SessionStatus {
        if self.members.len() < self.capacity {
            SessionStatus::Open
        } else {
            SessionStatus::Full
        }
    }

    /// Appends `user` to the member list. The caller has already checked
    /// membership and status.
    pub(crate) fn admit(&mut self, user: UserId) {
        debug_assert!(!self.is_member(user));
        debug_assert_eq!(self.status(), SessionStatus::Open);
        self.members.push(user);
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            host: self.host,
            mode: self.mode.clone(),
            region: self.region.clone(),
            access_code: self.access_code.clone(),
            members: self.members.clone(),
            capacity: self.capacity,
            created_at: self.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionSnapshot
// ---------------------------------------------------------------------------

/// An immutable copy of a session taken at one instant.
///
/// Returned by session creation and by every accepted join so the caller
/// can render and notify without touching the store again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub host: UserId,
    pub mode: String,
    pub region: String,
    /// Private-server code, delivered only to members.
    pub access_code: String,
    /// Members in join order; `members[0] == host`.
    pub members: Vec<UserId>,
    pub capacity: usize,
    pub created_at: Instant,
}

impl SessionSnapshot {
    pub fn status(&self) -> SessionStatus {
        if self.members.len() < self.capacity {
            SessionStatus::Open
        } else {
            SessionStatus::Full
        }
    }

    /// Players still needed to fill the session.
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.members.len())
    }

    /// Converts the snapshot into the render view sent to the adapter.
    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id.clone(),
            host: self.host,
            mode: self.mode.clone(),
            region: self.region.clone(),
            members: self.members.clone(),
            capacity: self.capacity,
            remaining: self.remaining(),
        }
    }
}
