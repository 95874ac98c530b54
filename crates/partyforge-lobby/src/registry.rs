//! Session creation.

use std::sync::Arc;

use partyforge_protocol::{SessionId, UserId};

use crate::session::Session;
use crate::{
    CapacityPolicy, LobbyError, RandomSessionIds, SessionIdSource, SessionKind,
    SessionSnapshot, SessionStore,
};

/// Smallest capacity a session may have. A one-player session would be
/// full the moment it is created and could never be joined.
const MIN_CAPACITY: usize = 2;

/// Creates sessions and inserts them into the shared [`SessionStore`].
pub struct SessionRegistry {
    store: Arc<SessionStore>,
    policy: Box<dyn CapacityPolicy>,
    ids: Box<dyn SessionIdSource>,
}

impl SessionRegistry {
    /// Creates a registry using the capacity convention of `kind`.
    pub fn new(store: Arc<SessionStore>, kind: SessionKind) -> Self {
        Self {
            store,
            policy: kind.policy(),
            ids: Box::new(RandomSessionIds),
        }
    }

    /// Creates a registry with a custom capacity policy.
    pub fn with_policy(store: Arc<SessionStore>, policy: impl CapacityPolicy) -> Self {
        Self {
            store,
            policy: Box::new(policy),
            ids: Box::new(RandomSessionIds),
        }
    }

    /// Replaces the id source.
    pub fn with_id_source(mut self, ids: impl SessionIdSource) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// The store this registry inserts into.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Announces a new session hosted by `host`.
    ///
    /// The session starts `Open` with the host as its only member.
    ///
    /// # Errors
    /// - [`LobbyError::InvalidMode`]: `mode` has no usable player count,
    ///   or it asks for fewer than two players.
    /// - [`LobbyError::IdCollision`]: the generated id is taken. Nothing
    ///   is overwritten.
    pub fn create(
        &self,
        host: UserId,
        mode: impl Into<String>,
        region: impl Into<String>,
        access_code: impl Into<String>,
    ) -> Result<(SessionId, SessionSnapshot), LobbyError> {
        let mode = mode.into();
        let capacity = self.policy.required_players(&mode)?;
        if capacity < MIN_CAPACITY {
            return Err(LobbyError::InvalidMode(mode));
        }

        let id = self.ids.next_id(host);
        let session = Session::open(
            id.clone(),
            host,
            mode,
            region.into(),
            access_code.into(),
            capacity,
        );
        let snapshot = session.snapshot();

        if let Err(e) = self.store.insert(session) {
            tracing::error!(session_id = %id, %host, error = %e, "refusing to overwrite session");
            return Err(e);
        }

        tracing::info!(
            session_id = %id,
            %host,
            mode = %snapshot.mode,
            capacity,
            "session created"
        );
        Ok((id, snapshot))
    }
}
