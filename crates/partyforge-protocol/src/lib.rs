//! Wire protocol for the Partyforge gateway.
//!
//! The chat-platform adapter and the Partyforge server talk through
//! [`Envelope`]s carried over a WebSocket:
//!
//! - **Identity** ([`UserId`], [`SessionId`], [`JoinButtonId`]): how users
//!   and matchmaking sessions are addressed.
//! - **Messages** ([`Command`], [`Event`], [`SessionView`]): what the
//!   adapter asks for and what the server answers.
//! - **Codec** ([`Codec`], [`JsonCodec`]): how envelopes become bytes.
//!
//! ```text
//! Adapter (slash commands, buttons) → Command → Server → Event → Adapter (embeds, DMs)
//! ```

mod button;
mod codec;
mod error;
mod types;

pub use button::JoinButtonId;
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Command, Envelope, Event, Payload, RejectReason, SessionId, SessionView,
    UserId,
};
