//! Matchmaking session lifecycle for Partyforge.
//!
//! A host announces a session for a game mode, other users join until it
//! is full, and the full session is torn down in the same step that
//! filled it.
//!
//! # Key types
//!
//! - [`CapacityPolicy`]: game-mode descriptor → total players required
//! - [`SessionStore`]: the shared map of open sessions
//! - [`SessionRegistry`]: creates sessions and assigns their ids
//! - [`JoinCoordinator`]: admits users, decides the [`JoinOutcome`]
//!
//! # Concurrency
//!
//! The store is a sharded concurrent map. Every join runs its whole
//! lookup → membership check → append → remove-on-full span inside one
//! synchronous closure while holding the lock of the shard that owns the
//! session id, so two joins for the same session are serialized and joins
//! for different sessions are not.
//!
//! ```text
//! CreateSession ─→ SessionRegistry::create ─→ SessionStore::insert
//! JoinRequest   ─→ JoinCoordinator::join   ─→ SessionStore::modify ─→ JoinOutcome
//! ```

mod capacity;
mod coordinator;
mod error;
mod id;
mod registry;
mod session;
mod store;

pub use capacity::{CapacityPolicy, DuelCapacity, PartyCapacity, SessionKind};
pub use coordinator::{JoinCoordinator, JoinOutcome};
pub use error::LobbyError;
pub use id::{RandomSessionIds, SessionIdSource};
pub use registry::SessionRegistry;
pub use session::{SessionSnapshot, SessionStatus};
pub use store::SessionStore;
