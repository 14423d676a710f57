//! # punchclockd
//!
//! Background sync daemon: syncs the signed-in account once, then listens
//! on the push channel and syncs again whenever the server reports a
//! change. Runs until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use punchclock_client::{init_tracing, ClientConfig, SyncEngine};
use punchclock_net::{HttpsClient, PushChannel, PushEvent};
use punchclock_shared::{Model, User};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

type Engine = SyncEngine<HttpsClient>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("Starting punchclockd v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env();
    info!(?config, "Loaded configuration");

    let store = Arc::new(config.open_store().context("opening the local store")?);
    let user = store
        .load_current_user(true)?
        .context("no signed-in user in the local store")?;
    info!(uid = user.base().id(), "Loaded current user");

    // The REST client blocks, so every sync runs off the async runtime.
    let https = config.https();
    let (engine, user) = tokio::task::spawn_blocking(move || -> anyhow::Result<(Engine, User)> {
        let engine = SyncEngine::new(HttpsClient::new(https)?, store);
        let mut user = user;
        sync_once(&engine, &mut user);
        Ok((engine, user))
    })
    .await??;

    let mut push = PushChannel::new(config.push());
    let events = push.start_with_channel(user.api_token())?;
    let worker = tokio::task::spawn_blocking(move || sync_on_events(engine, user, events));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    // Stopping the channel drops its sender, which ends the sync loop.
    push.stop();
    worker.await?;
    Ok(())
}

fn sync_on_events(engine: Engine, mut user: User, mut events: UnboundedReceiver<PushEvent>) {
    while let Some(event) = events.blocking_recv() {
        let mut coalesced = 0usize;
        while events.try_recv().is_ok() {
            coalesced += 1;
        }
        info!(kind = %event.kind, coalesced, "push event, syncing");
        sync_once(&engine, &mut user);
    }
}

fn sync_once(engine: &Engine, user: &mut User) {
    match engine.sync(user) {
        Ok(report) => {
            for failure in &report.failures {
                warn!(
                    model = failure.model_name,
                    id = failure.id,
                    status = failure.status,
                    "server rejected change"
                );
            }
        }
        Err(e) => warn!(error = %e, "sync failed"),
    }
}
