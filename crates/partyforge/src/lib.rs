//! # Partyforge
//!
//! Ad-hoc matchmaking parties for chat-platform game communities.
//!
//! A host announces a session for a game mode such as `"2v2"`, other
//! users press the join button until every slot is taken, and each member
//! receives a private access link. Partyforge owns the session state and
//! the join decision; a chat-platform adapter connects over WebSocket,
//! forwards user actions as commands, and renders the events it receives.
//! Direct deliveries go through a [`Notifier`] the application supplies.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use partyforge::prelude::*;
//!
//! # async fn start() -> Result<(), PartyforgeError> {
//! partyforge::init_tracing("info");
//!
//! let server = PartyforgeServer::builder()
//!     .config(ServerConfig::from_env()?)
//!     .build(LogNotifier)
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! The lobby types are usable without the gateway; see
//! [`partyforge_lobby`].

mod config;
mod error;
mod handler;
mod notify;
mod server;
mod telemetry;

pub use config::{DEFAULT_LINK_TEMPLATE, ServerConfig};
pub use error::PartyforgeError;
pub use notify::{AccessLink, Completion, LogNotifier, Notifier, NotifyError};
pub use server::{PROTOCOL_VERSION, PartyforgeServer, PartyforgeServerBuilder};
pub use telemetry::init_tracing;

pub use partyforge_lobby;
pub use partyforge_protocol;
pub use partyforge_sweep;
pub use partyforge_transport;

/// Everything needed to run a server or drive the lobby directly.
pub mod prelude {
    pub use crate::{
        AccessLink, Completion, LogNotifier, Notifier, NotifyError, PartyforgeError,
        PROTOCOL_VERSION, PartyforgeServer, PartyforgeServerBuilder, ServerConfig,
    };
    pub use partyforge_lobby::{
        JoinCoordinator, JoinOutcome, SessionIdSource, SessionKind, SessionRegistry,
        SessionSnapshot, SessionStore,
    };
    pub use partyforge_protocol::{
        Command, Envelope, Event, JoinButtonId, Payload, RejectReason, SessionId, SessionView,
        UserId,
    };
    pub use partyforge_sweep::SweepConfig;
}
