//! Session identifier generation.

use partyforge_protocol::{SessionId, UserId};
use rand::Rng;

/// Produces identifiers for new sessions.
///
/// Ids must be unique among live sessions. The registry still checks for
/// a collision on insert and refuses to overwrite.
pub trait SessionIdSource: Send + Sync + 'static {
    fn next_id(&self, host: UserId) -> SessionId;
}

impl<S: SessionIdSource + ?Sized> SessionIdSource for Box<S> {
    fn next_id(&self, host: UserId) -> SessionId {
        (**self).next_id(host)
    }
}

/// Default source: `<host>-<16 hex chars>` with 64 random bits.
///
/// The host prefix keeps ids readable in logs; uniqueness comes from the
/// random part, not from the clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSessionIds;

impl SessionIdSource for RandomSessionIds {
    fn next_id(&self, host: UserId) -> SessionId {
        SessionId::from_parts(host, &generate_token())
    }
}

fn generate_token() -> String {
    let bytes: [u8; 8] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
