//! # punchclock-net
//!
//! Network plumbing for punchclock: a blocking JSON-over-HTTPS transport
//! for the REST API, the batch request codec, and the realtime push
//! channel that tells the client when to sync again.

pub mod batch;
pub mod https;
pub mod push;

mod error;

pub use batch::{BatchUpdate, BatchUpdateResult};
pub use error::{NetError, Result};
pub use https::{Credentials, HttpsClient, HttpsConfig, Transport};
pub use push::{PushChannel, PushConfig, PushEvent, PushState};
