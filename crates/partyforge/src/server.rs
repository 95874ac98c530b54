//! `PartyforgeServer` builder and accept loop.
//!
//! This ties the layers together: transport → protocol → lobby, with the
//! sweep scheduler running beside the accept loop when configured.

use std::sync::Arc;

use partyforge_lobby::{
    JoinCoordinator, SessionIdSource, SessionKind, SessionRegistry, SessionStore,
};
use partyforge_protocol::{Codec, JsonCodec};
use partyforge_sweep::{SweepConfig, SweepScheduler};
use partyforge_transport::{Transport, WebSocketTransport};
use tokio::task::JoinHandle;

use crate::config::validate_template;
use crate::handler::handle_connection;
use crate::{LogNotifier, Notifier, PartyforgeError, ServerConfig};

/// The current protocol version. Adapters must send this in their
/// handshake or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// Shared server state passed to each connection handler task.
///
/// The store does its own per-session locking, so nothing here sits
/// behind a server-wide mutex.
pub(crate) struct ServerState<N: Notifier, C: Codec> {
    pub(crate) registry: SessionRegistry,
    pub(crate) coordinator: JoinCoordinator,
    pub(crate) store: Arc<SessionStore>,
    pub(crate) notifier: N,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a Partyforge server.
///
/// # Example
///
/// ```rust,no_run
/// use partyforge::prelude::*;
///
/// # async fn start() -> Result<(), PartyforgeError> {
/// let server = PartyforgeServer::builder()
///     .bind("0.0.0.0:8080")
///     .kind(SessionKind::Duel)
///     .build(LogNotifier)
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Default)]
pub struct PartyforgeServerBuilder {
    config: ServerConfig,
    ids: Option<Box<dyn SessionIdSource>>,
}

impl PartyforgeServerBuilder {
    /// Creates a new builder with [`ServerConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration, e.g. with [`ServerConfig::from_env`].
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the capacity rule for new sessions.
    pub fn kind(mut self, kind: SessionKind) -> Self {
        self.config.kind = kind;
        self
    }

    /// Sets the access-link template. It must contain `{code}`.
    pub fn link_template(mut self, template: &str) -> Self {
        self.config.link_template = template.to_string();
        self
    }

    /// Enables idle-session sweeping.
    pub fn sweep(mut self, sweep: SweepConfig) -> Self {
        self.config.sweep = Some(sweep);
        self
    }

    /// Replaces the random session-id generator.
    pub fn id_source(mut self, ids: impl SessionIdSource) -> Self {
        self.ids = Some(Box::new(ids));
        self
    }

    /// Binds the listener and assembles the shared state.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<N: Notifier>(
        self,
        notifier: N,
    ) -> Result<PartyforgeServer<N, JsonCodec>, PartyforgeError> {
        validate_template(&self.config.link_template)?;

        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let store = Arc::new(SessionStore::new());
        let mut registry = SessionRegistry::new(Arc::clone(&store), self.config.kind);
        if let Some(ids) = self.ids {
            registry = registry.with_id_source(ids);
        }

        let state = Arc::new(ServerState {
            registry,
            coordinator: JoinCoordinator::new(Arc::clone(&store)),
            store,
            notifier,
            codec: JsonCodec,
            config: self.config,
        });

        Ok(PartyforgeServer { transport, state })
    }
}

/// A bound Partyforge server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct PartyforgeServer<N: Notifier = LogNotifier, C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<N, C>>,
}

impl PartyforgeServer {
    /// Creates a new builder.
    pub fn builder() -> PartyforgeServerBuilder {
        PartyforgeServerBuilder::new()
    }
}

impl<N, C> PartyforgeServer<N, C>
where
    N: Notifier,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The live session store, for inspection by the embedding application.
    pub fn store(&self) -> Arc<SessionStore> {
        Arc::clone(&self.state.store)
    }

    /// Runs the accept loop.
    ///
    /// Spawns a handler task per connected adapter and, when sweeping is
    /// configured, one sweeper task. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), PartyforgeError> {
        tracing::info!(
            kind = %self.state.config.kind,
            bind = %self.state.config.bind_addr,
            "Partyforge server running"
        );

        let _sweeper = self
            .state
            .config
            .sweep
            .clone()
            .filter(SweepConfig::is_enabled)
            .map(|sweep| spawn_sweeper(Arc::clone(&self.state.store), sweep));

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Expires sessions older than the configured age on every sweep.
fn spawn_sweeper(store: Arc<SessionStore>, config: SweepConfig) -> JoinHandle<()> {
    tracing::info!(
        interval_secs = config.interval.as_secs(),
        ttl_secs = config.ttl.as_secs(),
        "session sweeper started"
    );
    let mut scheduler = SweepScheduler::new(config);
    tokio::spawn(async move {
        loop {
            let info = scheduler.wait_for_sweep().await;
            let expired = store.expire_idle(info.ttl);
            if !expired.is_empty() {
                tracing::info!(
                    sweep = info.sweep,
                    expired = expired.len(),
                    remaining = store.len(),
                    "sweep finished"
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_build_binds_ephemeral_port() {
        let server = PartyforgeServer::builder()
            .bind("127.0.0.1:0")
            .build(LogNotifier)
            .await
            .unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
        assert!(server.store().is_empty());
    }

    #[tokio::test]
    async fn test_build_rejects_template_without_placeholder() {
        let result = PartyforgeServerBuilder::new()
            .bind("127.0.0.1:0")
            .link_template("https://example.com/static")
            .build(LogNotifier)
            .await;
        assert!(matches!(result, Err(PartyforgeError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_expires_old_sessions() {
        let store = Arc::new(SessionStore::new());
        let registry = SessionRegistry::new(Arc::clone(&store), SessionKind::Duel);
        registry
            .create(partyforge_protocol::UserId(1), "1v1", "EU", "code")
            .unwrap();

        let config = SweepConfig {
            interval: Duration::from_secs(1),
            ttl: Duration::ZERO,
            initial_jitter: Duration::ZERO,
        };
        let handle = spawn_sweeper(Arc::clone(&store), config);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        tokio::task::yield_now().await;
        assert!(store.is_empty());
        handle.abort();
    }
}
