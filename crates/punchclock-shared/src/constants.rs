/// Application name, also used as the `created_with` label of new time entries.
pub const APP_NAME: &str = "punchclock";

/// Default REST API base URL.
pub const DEFAULT_API_URL: &str = "https://www.toggl.com";

/// Default realtime push endpoint.
pub const DEFAULT_PUSH_URL: &str = "wss://stream.toggl.com/ws";

/// Account state, including every related collection.
pub const ME_PATH: &str = "/api/v8/me?with_related_data=true";

/// Batched multi-operation endpoint.
pub const BATCH_UPDATES_PATH: &str = "/api/v8/batch_updates";

/// Basic-auth password that accompanies an API token used as the username.
pub const API_TOKEN_PASSWORD: &str = "api_token";

/// Update channels accepted by the settings table.
pub const UPDATE_CHANNELS: [&str; 3] = ["stable", "beta", "dev"];

/// Maximum number of timeline events handed out per batch.
pub const TIMELINE_BATCH_SIZE: u32 = 100;

/// Seconds without any inbound frame before the push channel reconnects.
pub const PUSH_STALE_AFTER_SECS: u64 = 30;

/// Pause after a push channel I/O error before reconnecting.
pub const PUSH_RECONNECT_DELAY_SECS: u64 = 10;

/// Poll granularity of the push channel worker.
pub const PUSH_POLL_INTERVAL_MS: u64 = 250;
