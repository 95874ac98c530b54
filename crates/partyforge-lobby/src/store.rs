//! The session store: every open session, keyed by id.
//!
//! Backed by a `DashMap`, which splits keys across independently locked
//! shards. [`SessionStore::modify`] holds the owning shard's write lock
//! for the whole closure it runs, which gives the join path its
//! per-session mutual exclusion. The closure is a plain `FnOnce`, so it
//! cannot `.await`.

use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use partyforge_protocol::SessionId;

use crate::session::Session;
use crate::{LobbyError, SessionSnapshot};

/// What to do with a session after [`SessionStore::modify`] ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    Keep,
    Remove,
}

/// Shared map of open sessions.
///
/// Only [`SessionRegistry`](crate::SessionRegistry) inserts and only
/// [`JoinCoordinator`](crate::JoinCoordinator) mutates or removes; everyone
/// else reads snapshots. Share it with `Arc`.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, Session>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new session, refusing to overwrite an existing id.
    pub(crate) fn insert(&self, session: Session) -> Result<(), LobbyError> {
        match self.sessions.entry(session.id().clone()) {
            Entry::Occupied(entry) => Err(LobbyError::IdCollision(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(session);
                Ok(())
            }
        }
    }

    /// Runs `f` on the session with `id` while holding its shard lock,
    /// then keeps or removes the session as `f` decides.
    ///
    /// Returns `None` without calling `f` if no such session exists.
    pub(crate) fn modify<R>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut Session) -> (R, Disposition),
    ) -> Option<R> {
        match self.sessions.entry(id.clone()) {
            Entry::Vacant(_) => None,
            Entry::Occupied(mut entry) => {
                let (result, disposition) = f(entry.get_mut());
                if disposition == Disposition::Remove {
                    entry.remove();
                }
                Some(result)
            }
        }
    }

    /// Returns a snapshot of one session.
    pub fn get(&self, id: &SessionId) -> Option<SessionSnapshot> {
        self.sessions.get(id).map(|s| s.snapshot())
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Snapshots of all sessions, oldest first.
    pub fn snapshots(&self) -> Vec<SessionSnapshot> {
        let mut all: Vec<SessionSnapshot> =
            self.sessions.iter().map(|s| s.snapshot()).collect();
        all.sort_by_key(|s| s.created_at);
        all
    }

    /// Removes every session created at least `ttl` ago and returns what
    /// was removed.
    ///
    /// A session that a concurrent join is completing is either expired
    /// here or completed there, never both: both paths take the same
    /// shard lock.
    pub fn expire_idle(&self, ttl: Duration) -> Vec<SessionSnapshot> {
        let mut expired = Vec::new();
        self.sessions.retain(|_, session| {
            if session.created_at().elapsed() >= ttl {
                expired.push(session.snapshot());
                false
            } else {
                true
            }
        });
        for snapshot in &expired {
            tracing::info!(
                session_id = %snapshot.id,
                members = snapshot.members.len(),
                capacity = snapshot.capacity,
                "session expired before filling"
            );
        }
        expired
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use partyforge_protocol::UserId;

    use super::*;

    fn session(id: &str, capacity: usize) -> Session {
        Session::open(
            SessionId::new(id),
            UserId(1),
            "2v2".into(),
            "NA".into(),
            "code".into(),
            capacity,
        )
    }

    #[test]
    fn test_insert_then_get_returns_snapshot() {
        let store = SessionStore::new();
        store.insert(session("a", 4)).unwrap();

        let snap = store.get(&SessionId::new("a")).expect("present");
        assert_eq!(snap.capacity, 4);
        assert_eq!(store.len(), 1);
        assert!(store.contains(&SessionId::new("a")));
    }

    #[test]
    fn test_insert_existing_id_is_collision_and_keeps_original() {
        let store = SessionStore::new();
        store.insert(session("a", 4)).unwrap();

        let err = store.insert(session("a", 2)).unwrap_err();
        assert!(matches!(err, LobbyError::IdCollision(ref id) if id.as_str() == "a"));
        assert_eq!(store.get(&SessionId::new("a")).unwrap().capacity, 4);
    }

    #[test]
    fn test_modify_missing_session_does_not_call_closure() {
        let store = SessionStore::new();
        let result = store.modify(&SessionId::new("nope"), |_| -> ((), Disposition) {
            panic!("closure must not run")
        });
        assert!(result.is_none());
    }

    #[test]
    fn test_modify_keep_and_remove() {
        let store = SessionStore::new();
        store.insert(session("a", 4)).unwrap();
        let id = SessionId::new("a");

        let kept = store.modify(&id, |s| {
            s.admit(UserId(2));
            (s.snapshot().members.len(), Disposition::Keep)
        });
        assert_eq!(kept, Some(2));
        assert_eq!(store.get(&id).unwrap().members.len(), 2);

        store.modify(&id, |_| ((), Disposition::Remove));
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshots_are_oldest_first() {
        let store = SessionStore::new();
        store.insert(session("first", 4)).unwrap();
        std::thread::sleep(Duration::from_millis(2));
        store.insert(session("second", 4)).unwrap();

        let ids: Vec<String> = store
            .snapshots()
            .into_iter()
            .map(|s| s.id.to_string())
            .collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_expire_idle_with_zero_ttl_removes_everything() {
        let store = SessionStore::new();
        store.insert(session("a", 4)).unwrap();
        store.insert(session("b", 4)).unwrap();

        let expired = store.expire_idle(Duration::ZERO);
        assert_eq!(expired.len(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_expire_idle_with_long_ttl_keeps_everything() {
        let store = SessionStore::new();
        store.insert(session("a", 4)).unwrap();

        assert!(store.expire_idle(Duration::from_secs(3600)).is_empty());
        assert_eq!(store.len(), 1);
    }
}
