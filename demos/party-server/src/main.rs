//! Standalone Partyforge gateway.
//!
//! Configured entirely through the environment (see
//! `ServerConfig::from_env`). Deliveries are only logged; a real
//! deployment plugs in a `Notifier` that messages users on the chat
//! platform.
//!
//! ```text
//! PORT=8080 PARTYFORGE_KIND=duel RUST_LOG=debug cargo run -p party-server
//! ```

use partyforge::prelude::*;

#[tokio::main]
async fn main() -> Result<(), PartyforgeError> {
    partyforge::init_tracing("info");

    let config = ServerConfig::from_env()?;
    let server = PartyforgeServer::builder().config(config).build(LogNotifier).await?;

    match server.local_addr() {
        Ok(addr) => tracing::info!(%addr, "party server listening"),
        Err(e) => tracing::warn!(error = %e, "could not read local address"),
    }

    server.run().await
}
