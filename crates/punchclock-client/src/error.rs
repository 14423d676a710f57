use punchclock_net::NetError;
use punchclock_shared::ModelError;
use punchclock_store::StoreError;
use thiserror::Error;

/// Errors that abort a sync cycle.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A pulled or pushed document did not convert into entities.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Persisting the merged graph failed. The store has rolled back.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The REST call failed (transport, status or body).
    #[error("Network error: {0}")]
    Net(#[from] NetError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered in a shape the protocol does not allow.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Neither an API token nor a login email and password are set.
    #[error("No credentials to authenticate with")]
    MissingCredentials,
}

pub type Result<T> = std::result::Result<T, SyncError>;
