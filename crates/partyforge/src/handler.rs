//! Per-connection handler: handshake and command dispatch.
//!
//! Each accepted adapter connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Receive Handshake → validate version → send HandshakeAck
//!   2. Loop: receive envelopes → dispatch commands → reply
//!
//! Join side effects run here, after the lobby has committed the join:
//! reply with the updated view, then hand the access link and (if this
//! join filled the session) the completion announcement to a notifier
//! task. The notifier task is spawned whether or not the reply reached
//! the adapter, and it never holds up the next command.

use std::sync::Arc;
use std::time::{Duration, Instant};

use partyforge_lobby::{JoinOutcome, LobbyError, SessionSnapshot};
use partyforge_protocol::{
    Codec, Command, Envelope, Event, JoinButtonId, Payload, ProtocolError, RejectReason, SessionId,
    UserId,
};
use partyforge_transport::{Connection, TransportError};

use crate::server::{PROTOCOL_VERSION, ServerState};
use crate::{AccessLink, Completion, Notifier, PartyforgeError};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const IDLE_TIMEOUT: Duration = Duration::from_secs(15);

/// Outbound half of one connection: stamps and encodes every event.
struct Outbox<'a, T, C> {
    conn: &'a T,
    codec: &'a C,
    seq: u64,
    start: Instant,
}

impl<'a, T, C> Outbox<'a, T, C>
where
    T: Connection<Error = TransportError>,
    C: Codec,
{
    fn new(conn: &'a T, codec: &'a C) -> Self {
        Self {
            conn,
            codec,
            seq: 0,
            start: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    async fn send(&mut self, event: Event) -> Result<(), PartyforgeError> {
        let envelope = Envelope {
            seq: next_seq(&mut self.seq),
            timestamp: self.elapsed_ms(),
            payload: Payload::Event(event),
        };
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    async fn error(
        &mut self,
        code: u16,
        message: impl Into<String>,
    ) -> Result<(), PartyforgeError> {
        self.send(Event::Error {
            code,
            message: message.into(),
        })
        .await
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<T, N, C>(
    conn: T,
    state: Arc<ServerState<N, C>>,
) -> Result<(), PartyforgeError>
where
    T: Connection<Error = TransportError>,
    N: Notifier,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let mut outbox = Outbox::new(&conn, &state.codec);
    perform_handshake(&mut outbox, &state).await?;
    tracing::info!(%conn_id, "adapter connected");

    loop {
        let data = match tokio::time::timeout(IDLE_TIMEOUT, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%conn_id, "connection timed out");
                break;
            }
        };

        let envelope: Envelope = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode envelope");
                outbox.error(400, format!("malformed envelope: {e}")).await?;
                continue;
            }
        };

        match envelope.payload {
            Payload::Command(command) => {
                if handle_command(&mut outbox, &state, command).await? {
                    if let Err(e) = conn.close().await {
                        tracing::debug!(%conn_id, error = %e, "close after disconnect failed");
                    }
                    break;
                }
            }
            Payload::Event(_) => {
                outbox.error(400, "events are not accepted from adapters").await?;
            }
        }
    }

    Ok(())
}

/// Receives the Handshake, checks the version, and sends the Ack.
async fn perform_handshake<T, N, C>(
    outbox: &mut Outbox<'_, T, C>,
    state: &ServerState<N, C>,
) -> Result<(), PartyforgeError>
where
    T: Connection<Error = TransportError>,
    N: Notifier,
    C: Codec,
{
    let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, outbox.conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            let reason = "connection closed before handshake";
            return Err(ProtocolError::InvalidMessage(reason.into()).into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let envelope: Envelope = state.codec.decode(&data)?;

    let version = match envelope.payload {
        Payload::Command(Command::Handshake { version }) => version,
        _ => {
            outbox.error(400, "expected Handshake").await?;
            let reason = "first message must be Handshake";
            return Err(ProtocolError::InvalidMessage(reason.into()).into());
        }
    };

    if version != PROTOCOL_VERSION {
        outbox
            .error(
                400,
                format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
            )
            .await?;
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    let server_time = outbox.elapsed_ms();
    outbox.send(Event::HandshakeAck { server_time }).await
}

/// Handles one command. Returns `true` if the connection should close.
async fn handle_command<T, N, C>(
    outbox: &mut Outbox<'_, T, C>,
    state: &Arc<ServerState<N, C>>,
    command: Command,
) -> Result<bool, PartyforgeError>
where
    T: Connection<Error = TransportError>,
    N: Notifier,
    C: Codec,
{
    match command {
        Command::Handshake { .. } => {
            outbox.error(400, "handshake already completed").await?;
        }

        Command::CreateSession {
            host,
            mode,
            region,
            access_code,
        } => match state.registry.create(host, mode, region, access_code) {
            Ok((_, snapshot)) => {
                outbox.send(Event::SessionOpened { view: snapshot.view() }).await?;
            }
            Err(LobbyError::InvalidMode(mode)) => {
                tracing::debug!(%host, %mode, "session rejected: invalid mode");
                outbox
                    .send(Event::SessionRejected {
                        host,
                        mode,
                        reason: RejectReason::InvalidMode,
                    })
                    .await?;
            }
            Err(e @ LobbyError::IdCollision(_)) => {
                outbox.error(500, e.to_string()).await?;
            }
        },

        Command::Join { session_id, user } => {
            join(outbox, state, session_id, user).await?;
        }

        Command::JoinByButton { custom_id, user } => match JoinButtonId::parse(&custom_id) {
            Ok(button) => join(outbox, state, button.into_session_id(), user).await?,
            Err(e) => {
                tracing::debug!(%user, %custom_id, "unrecognised button id");
                outbox.error(400, e.to_string()).await?;
            }
        },

        Command::ListSessions => {
            let sessions = state.store.snapshots().iter().map(SessionSnapshot::view).collect();
            outbox.send(Event::SessionList { sessions }).await?;
        }

        Command::Heartbeat { client_time } => {
            let server_time = outbox.elapsed_ms();
            outbox
                .send(Event::HeartbeatAck {
                    client_time,
                    server_time,
                })
                .await?;
        }

        Command::Disconnect { reason } => {
            tracing::info!(conn_id = %outbox.conn.id(), %reason, "adapter disconnected");
            return Ok(true);
        }
    }

    Ok(false)
}

/// Runs a join and its side effects.
///
/// The join itself is decided synchronously by the coordinator; no await
/// point sits between the membership check and the commit. Once committed,
/// the notifications go out even if the reply to the adapter fails.
async fn join<T, N, C>(
    outbox: &mut Outbox<'_, T, C>,
    state: &Arc<ServerState<N, C>>,
    session_id: SessionId,
    user: UserId,
) -> Result<(), PartyforgeError>
where
    T: Connection<Error = TransportError>,
    N: Notifier,
    C: Codec,
{
    let outcome = state.coordinator.join(&session_id, user);

    match outcome {
        JoinOutcome::Joined { session, completed } => {
            let reply = outbox
                .send(Event::JoinAccepted {
                    view: session.view(),
                    completed,
                })
                .await;
            tokio::spawn(notify_joined(Arc::clone(state), session, user, completed));
            reply?;
        }
        rejected => {
            if let Some(reason) = rejected.reject_reason() {
                outbox
                    .send(Event::JoinRejected {
                        session_id,
                        user,
                        reason,
                    })
                    .await?;
            }
        }
    }

    Ok(())
}

/// Delivers the access link and, for the completing join, the announcement.
/// Failures are logged; the join stands.
async fn notify_joined<N, C>(
    state: Arc<ServerState<N, C>>,
    session: SessionSnapshot,
    user: UserId,
    completed: bool,
) where
    N: Notifier,
    C: Codec,
{
    let url = state.config.access_url(&session.access_code);

    let link = AccessLink {
        user,
        session_id: session.id.clone(),
        host: session.host,
        mode: session.mode.clone(),
        access_code: session.access_code.clone(),
        url: url.clone(),
    };
    if let Err(e) = state.notifier.deliver_access_link(link).await {
        tracing::warn!(
            session_id = %session.id,
            %user,
            error = %e,
            "access link not delivered"
        );
    }

    if !completed {
        return;
    }

    let completion = Completion {
        session_id: session.id.clone(),
        host: session.host,
        mode: session.mode.clone(),
        region: session.region.clone(),
        access_code: session.access_code.clone(),
        members: session.members.clone(),
        url,
    };
    if let Err(e) = state.notifier.announce_completion(completion).await {
        tracing::warn!(session_id = %session.id, error = %e, "completion not announced");
    }
}

/// Returns the current sequence number and advances it.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use partyforge_lobby::{JoinCoordinator, SessionKind, SessionRegistry, SessionStore};
    use partyforge_protocol::JsonCodec;
    use partyforge_transport::ConnectionId;

    use super::*;
    use crate::{NotifyError, ServerConfig};

    /// A connection whose peer is gone: every send fails.
    struct DeadConnection;

    impl Connection for DeadConnection {
        type Error = TransportError;

        async fn send(&self, _data: &[u8]) -> Result<(), TransportError> {
            Err(TransportError::SendFailed("peer gone".into()))
        }

        async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
            Ok(None)
        }

        async fn close(&self) -> Result<(), TransportError> {
            Ok(())
        }

        fn id(&self) -> ConnectionId {
            ConnectionId::new(0)
        }
    }

    #[derive(Default)]
    struct Recorder {
        links: Mutex<Vec<AccessLink>>,
        completions: Mutex<Vec<Completion>>,
    }

    impl Notifier for Recorder {
        async fn deliver_access_link(&self, link: AccessLink) -> Result<(), NotifyError> {
            self.links.lock().unwrap().push(link);
            Ok(())
        }

        async fn announce_completion(&self, completion: Completion) -> Result<(), NotifyError> {
            self.completions.lock().unwrap().push(completion);
            Ok(())
        }
    }

    fn state() -> Arc<ServerState<Recorder, JsonCodec>> {
        let store = Arc::new(SessionStore::new());
        Arc::new(ServerState {
            registry: SessionRegistry::new(Arc::clone(&store), SessionKind::Duel),
            coordinator: JoinCoordinator::new(Arc::clone(&store)),
            store,
            notifier: Recorder::default(),
            codec: JsonCodec,
            config: ServerConfig::default(),
        })
    }

    async fn wait_for_links(state: &ServerState<Recorder, JsonCodec>, count: usize) {
        for _ in 0..200 {
            if state.notifier.links.lock().unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("expected {count} access links");
    }

    #[tokio::test]
    async fn test_join_notifies_even_when_reply_fails() {
        let state = state();
        let (id, _) = state.registry.create(UserId(1), "1v1", "EU", "CODE").unwrap();
        let conn = DeadConnection;
        let mut outbox = Outbox::new(&conn, &state.codec);

        let result = join(&mut outbox, &state, id.clone(), UserId(2)).await;
        assert!(matches!(result, Err(PartyforgeError::Transport(_))));
        assert!(!state.store.contains(&id));

        wait_for_links(&state, 1).await;
        for _ in 0..200 {
            if !state.notifier.completions.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let links = state.notifier.links.lock().unwrap().clone();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].user, UserId(2));

        let completions = state.notifier.completions.lock().unwrap().clone();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].members, vec![UserId(1), UserId(2)]);
    }

    #[tokio::test]
    async fn test_partial_join_delivers_link_without_completion() {
        let state = state();
        let (id, _) = state.registry.create(UserId(1), "2v2", "EU", "CODE").unwrap();
        let conn = DeadConnection;
        let mut outbox = Outbox::new(&conn, &state.codec);

        let _ = join(&mut outbox, &state, id.clone(), UserId(2)).await;

        wait_for_links(&state, 1).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(state.notifier.completions.lock().unwrap().is_empty());
        assert_eq!(state.store.get(&id).unwrap().members.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_join_sends_no_notifications() {
        let state = state();
        let (id, _) = state.registry.create(UserId(1), "2v2", "EU", "CODE").unwrap();
        let conn = DeadConnection;
        let mut outbox = Outbox::new(&conn, &state.codec);

        let _ = join(&mut outbox, &state, id, UserId(1)).await;

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(state.notifier.links.lock().unwrap().is_empty());
    }
}
