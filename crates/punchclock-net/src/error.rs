use thiserror::Error;

/// Errors produced by the REST transport and the push channel.
#[derive(Error, Debug)]
pub enum NetError {
    /// Connection, TLS or timeout failure below HTTP.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    /// A response body was not the JSON we expected.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Compressing a request or inflating a response failed.
    #[error("Compression error: {0}")]
    Compression(#[source] std::io::Error),

    /// WebSocket protocol or connection failure.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The push server closed the connection.
    #[error("WebSocket peer closed the connection")]
    Closed,

    /// Generic I/O error (e.g. building the push runtime).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NetError>;
