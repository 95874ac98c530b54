//! Join coordination: admitting users into open sessions.
//!
//! This is the only place session membership changes. The coordinator
//! performs no I/O; rendering the new view, delivering the access link,
//! and announcing completion belong to whoever called [`JoinCoordinator::join`].

use std::sync::Arc;

use partyforge_protocol::{RejectReason, SessionId, UserId};

use crate::store::Disposition;
use crate::{SessionSnapshot, SessionStatus, SessionStore};

/// Result of one join attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// No open session has this id: it completed, expired, or never existed.
    UnknownSession,
    /// The user is already a member. The host lands here too.
    AlreadyMember,
    /// The session was found full. Unreachable while sessions are removed
    /// the moment they fill; a stale full entry is dropped when seen.
    SessionFull,
    /// The user was appended to the members.
    Joined {
        /// State right after this join.
        session: SessionSnapshot,
        /// `true` iff this join filled the last slot. The session has
        /// already been removed from the store.
        completed: bool,
    },
}

impl JoinOutcome {
    /// The rejection to report, or `None` for [`JoinOutcome::Joined`].
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::UnknownSession => Some(RejectReason::UnknownSession),
            Self::AlreadyMember => Some(RejectReason::AlreadyMember),
            Self::SessionFull => Some(RejectReason::SessionFull),
            Self::Joined { .. } => None,
        }
    }

    pub fn is_joined(&self) -> bool {
        matches!(self, Self::Joined { .. })
    }
}

/// Admits users into sessions held in a shared [`SessionStore`].
#[derive(Debug, Clone)]
pub struct JoinCoordinator {
    store: Arc<SessionStore>,
}

impl JoinCoordinator {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Tries to add `user` to the session `session_id`.
    ///
    /// Lookup, membership check, append, capacity check and removal all
    /// happen in one critical section keyed by `session_id`. Of two
    /// concurrent joins for the last slot exactly one gets
    /// `Joined { completed: true }`; the other sees `UnknownSession`.
    pub fn join(&self, session_id: &SessionId, user: UserId) -> JoinOutcome {
        let outcome = self
            .store
            .modify(session_id, |session| {
                if session.is_member(user) {
                    return (JoinOutcome::AlreadyMember, Disposition::Keep);
                }
                if session.status() == SessionStatus::Full {
                    return (JoinOutcome::SessionFull, Disposition::Remove);
                }

                session.admit(user);
                let completed = session.status() == SessionStatus::Full;
                let disposition = if completed {
                    Disposition::Remove
                } else {
                    Disposition::Keep
                };
                let joined = JoinOutcome::Joined {
                    session: session.snapshot(),
                    completed,
                };
                (joined, disposition)
            })
            .unwrap_or(JoinOutcome::UnknownSession);

        match &outcome {
            JoinOutcome::Joined { session, completed } => {
                tracing::info!(
                    %session_id,
                    %user,
                    members = session.members.len(),
                    capacity = session.capacity,
                    "user joined session"
                );
                if *completed {
                    tracing::info!(%session_id, host = %session.host, "session full, closed");
                }
            }
            JoinOutcome::SessionFull => {
                tracing::warn!(%session_id, %user, "found full session in store, dropped it");
            }
            rejected => {
                tracing::debug!(%session_id, %user, outcome = ?rejected, "join rejected");
            }
        }

        outcome
    }
}
