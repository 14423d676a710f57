//! # punchclock-client
//!
//! The synchronization engine that reconciles the local store with the
//! remote service, plus the configuration and logging bootstrap shared by
//! the `punchclockd` daemon and embedders.

pub mod config;
pub mod merge;
pub mod sync;

mod error;

pub use config::ClientConfig;
pub use error::{Result, SyncError};
pub use sync::{PushFailure, SyncEngine, SyncReport};

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "punchclock_client=debug,punchclock_store=info,punchclock_net=info,warn";

/// Install the global `tracing` subscriber. Respects `RUST_LOG`. Calling it
/// again is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .try_init();
}
