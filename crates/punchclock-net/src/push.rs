//! Realtime push channel.
//!
//! A single worker thread owns a current-thread tokio runtime and the
//! WebSocket connection. The server only signals that something changed;
//! callers react by scheduling another sync cycle.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use punchclock_shared::constants::{
    DEFAULT_PUSH_URL, PUSH_POLL_INTERVAL_MS, PUSH_RECONNECT_DELAY_SECS, PUSH_STALE_AFTER_SECS,
};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::{NetError, Result};
use crate::https::user_agent;

const PUSH_ORIGIN: &str = "https://localhost";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct PushConfig {
    pub url: String,
    pub poll_interval: Duration,
    /// Reconnect when no frame arrived for this long.
    pub stale_after: Duration,
    pub reconnect_delay: Duration,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PUSH_URL.to_string(),
            poll_interval: Duration::from_millis(PUSH_POLL_INTERVAL_MS),
            stale_after: Duration::from_secs(PUSH_STALE_AFTER_SECS),
            reconnect_delay: Duration::from_secs(PUSH_RECONNECT_DELAY_SECS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PushState {
    Stopped = 0,
    Connecting = 1,
    Listening = 2,
    Reconnecting = 3,
}

impl PushState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => PushState::Connecting,
            2 => PushState::Listening,
            3 => PushState::Reconnecting,
            _ => PushState::Stopped,
        }
    }
}

/// A frame the server pushed. `payload` is the raw JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    pub kind: String,
    pub payload: String,
}

impl PushEvent {
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}

struct Worker {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct PushChannel {
    config: PushConfig,
    state: Arc<AtomicU8>,
    worker: Option<Worker>,
}

impl PushChannel {
    pub fn new(config: PushConfig) -> Self {
        Self {
            config,
            state: Arc::new(AtomicU8::new(PushState::Stopped as u8)),
            worker: None,
        }
    }

    pub fn state(&self) -> PushState {
        PushState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    /// Spawn the worker. Does nothing when it is already running.
    pub fn start<F>(&mut self, api_token: &str, handler: F) -> Result<()>
    where
        F: FnMut(PushEvent) + Send + 'static,
    {
        if self.is_running() {
            tracing::debug!("push channel already running");
            return Ok(());
        }
        // Reap a worker that exited on its own.
        self.stop();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (cancel, cancel_rx) = watch::channel(false);
        let ctx = WorkerContext {
            config: self.config.clone(),
            api_token: api_token.to_string(),
            state: Arc::clone(&self.state),
        };

        ctx.set_state(PushState::Connecting);
        let handle = std::thread::Builder::new()
            .name("punchclock-push".into())
            .spawn(move || runtime.block_on(run(ctx, handler, cancel_rx)))?;

        tracing::info!(url = %self.config.url, "push channel started");
        self.worker = Some(Worker { cancel, handle });
        Ok(())
    }

    /// Like [`PushChannel::start`], delivering events through a channel.
    pub fn start_with_channel(
        &mut self,
        api_token: &str,
    ) -> Result<mpsc::UnboundedReceiver<PushEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.start(api_token, move |event| {
            let _ = tx.send(event);
        })?;
        Ok(rx)
    }

    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = worker.cancel.send(true);
        if worker.handle.join().is_err() {
            tracing::error!("push worker panicked");
        }
        self.state.store(PushState::Stopped as u8, Ordering::SeqCst);
        tracing::info!("push channel stopped");
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.stop();
    }
}

struct WorkerContext {
    config: PushConfig,
    api_token: String,
    state: Arc<AtomicU8>,
}

impl WorkerContext {
    fn set_state(&self, state: PushState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

enum SessionEnd {
    Cancelled,
    Stale,
}

async fn run<F>(ctx: WorkerContext, mut handler: F, mut cancel: watch::Receiver<bool>)
where
    F: FnMut(PushEvent),
{
    loop {
        if *cancel.borrow() {
            break;
        }
        ctx.set_state(PushState::Connecting);

        match session(&ctx, &mut handler, &mut cancel).await {
            Ok(SessionEnd::Cancelled) => break,
            Ok(SessionEnd::Stale) => {
                tracing::warn!(
                    stale_after_secs = ctx.config.stale_after.as_secs_f64(),
                    "push connection went quiet, reconnecting"
                );
                ctx.set_state(PushState::Reconnecting);
            }
            Err(e) => {
                tracing::warn!(error = %e, delay_secs = ctx.config.reconnect_delay.as_secs(), "push connection lost");
                ctx.set_state(PushState::Reconnecting);

                let stop = tokio::select! {
                    _ = tokio::time::sleep(ctx.config.reconnect_delay) => false,
                    _ = cancel.wait_for(|stop| *stop) => true,
                };
                if stop {
                    break;
                }
            }
        }
    }
    ctx.set_state(PushState::Stopped);
}

async fn session<F>(
    ctx: &WorkerContext,
    handler: &mut F,
    cancel: &mut watch::Receiver<bool>,
) -> Result<SessionEnd>
where
    F: FnMut(PushEvent),
{
    let request = build_request(&ctx.config.url)?;
    let mut ws = tokio::select! {
        connected = tokio_tungstenite::connect_async(request) => connected?.0,
        _ = cancel.wait_for(|stop| *stop) => return Ok(SessionEnd::Cancelled),
    };

    let auth = serde_json::json!({ "type": "authenticate", "api_token": ctx.api_token });
    ws.send(Message::Binary(auth.to_string().into_bytes())).await?;
    ctx.set_state(PushState::Listening);
    tracing::debug!(url = %ctx.config.url, "push channel authenticated");

    let mut last_frame = Instant::now();
    loop {
        if *cancel.borrow() {
            let _ = ws.close(None).await;
            return Ok(SessionEnd::Cancelled);
        }
        if last_frame.elapsed() > ctx.config.stale_after {
            let _ = ws.close(None).await;
            return Ok(SessionEnd::Stale);
        }

        let frame = match tokio::time::timeout(ctx.config.poll_interval, ws.next()).await {
            Err(_) => continue,
            Ok(None) => return Err(NetError::Closed),
            Ok(Some(frame)) => frame?,
        };
        last_frame = Instant::now();

        let payload = match frame {
            Message::Text(text) => text.into_bytes(),
            Message::Binary(bytes) => bytes,
            Message::Close(_) => return Err(NetError::Closed),
            _ => continue,
        };
        dispatch(&payload, &mut ws, handler).await?;
    }
}

async fn dispatch<F>(payload: &[u8], ws: &mut Socket, handler: &mut F) -> Result<()>
where
    F: FnMut(PushEvent),
{
    let value: Value = match serde_json::from_slice(payload) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, bytes = payload.len(), "dropping malformed push frame");
            return Ok(());
        }
    };

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("data")
        .to_string();

    match kind.as_str() {
        "ping" => {
            let pong = serde_json::json!({ "type": "pong" });
            ws.send(Message::Binary(pong.to_string().into_bytes())).await?;
        }
        _ => handler(PushEvent {
            kind,
            payload: String::from_utf8_lossy(payload).into_owned(),
        }),
    }
    Ok(())
}

fn build_request(
    url: &str,
) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request> {
    let mut request = url.into_client_request()?;
    let headers = request.headers_mut();
    headers.insert("Origin", HeaderValue::from_static(PUSH_ORIGIN));
    if let Ok(agent) = HeaderValue::from_str(&user_agent()) {
        headers.insert("User-Agent", agent);
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::atomic::AtomicUsize;

    use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
    use axum::extract::State;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn config(addr: SocketAddr) -> PushConfig {
        PushConfig {
            url: format!("ws://{addr}/ws"),
            poll_interval: Duration::from_millis(50),
            stale_after: Duration::from_secs(30),
            reconnect_delay: Duration::from_millis(200),
        }
    }

    fn frame_text(message: WsMessage) -> Option<String> {
        match message {
            WsMessage::Text(text) => Some(text),
            WsMessage::Binary(bytes) => String::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// Records what the client sends, pings it, then pushes a malformed
    /// frame, a data frame and an untyped model update.
    async fn scripted(mut socket: WebSocket, seen: mpsc::UnboundedSender<String>) {
        while let Some(Ok(message)) = socket.recv().await {
            if let Some(text) = frame_text(message) {
                seen.send(text).unwrap();
                break;
            }
        }

        socket
            .send(WsMessage::Text(r#"{"type":"ping"}"#.into()))
            .await
            .unwrap();
        while let Some(Ok(message)) = socket.recv().await {
            if let Some(text) = frame_text(message) {
                seen.send(text).unwrap();
                break;
            }
        }

        socket.send(WsMessage::Text("not json".into())).await.unwrap();
        socket
            .send(WsMessage::Text(
                r#"{"type":"data","data":{"model":"time_entry","action":"update"}}"#.into(),
            ))
            .await
            .unwrap();
        socket
            .send(WsMessage::Binary(
                br#"{"type":"time_entry","action":"update"}"#.to_vec(),
            ))
            .await
            .unwrap();

        while let Some(Ok(_)) = socket.recv().await {}
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn authenticates_answers_ping_and_forwards_data() {
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        let app = Router::new().route(
            "/ws",
            get(move |ws: WebSocketUpgrade| {
                let seen = seen_tx.clone();
                async move { ws.on_upgrade(move |socket| scripted(socket, seen)) }
            }),
        );
        let addr = serve(app).await;

        let mut channel = PushChannel::new(config(addr));
        let mut events = channel.start_with_channel("tok").unwrap();

        let wait = Duration::from_secs(5);
        let auth: Value =
            serde_json::from_str(&tokio::time::timeout(wait, seen_rx.recv()).await.unwrap().unwrap())
                .unwrap();
        assert_eq!(auth["type"], "authenticate");
        assert_eq!(auth["api_token"], "tok");

        let pong: Value =
            serde_json::from_str(&tokio::time::timeout(wait, seen_rx.recv()).await.unwrap().unwrap())
                .unwrap();
        assert_eq!(pong, serde_json::json!({ "type": "pong" }));

        let event = tokio::time::timeout(wait, events.recv()).await.unwrap().unwrap();
        assert_eq!(event.kind, "data");
        assert_eq!(event.json().unwrap()["data"]["model"], "time_entry");

        let event = tokio::time::timeout(wait, events.recv()).await.unwrap().unwrap();
        assert_eq!(event.kind, "time_entry");
        assert_eq!(event.json().unwrap()["action"], "update");
        assert_eq!(channel.state(), PushState::Listening);

        // Neither the ping nor the malformed frame reached the handler.
        assert!(events.try_recv().is_err());

        channel.stop();
        assert_eq!(channel.state(), PushState::Stopped);
        assert!(!channel.is_running());
    }

    async fn silent(
        ws: WebSocketUpgrade,
        State(connections): State<Arc<AtomicUsize>>,
    ) -> impl IntoResponse {
        connections.fetch_add(1, Ordering::SeqCst);
        ws.on_upgrade(|mut socket| async move { while let Some(Ok(_)) = socket.recv().await {} })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn quiet_connection_is_replaced() {
        let connections = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/ws", get(silent))
            .with_state(Arc::clone(&connections));
        let addr = serve(app).await;

        let stale_after = Duration::from_millis(400);
        let mut channel = PushChannel::new(PushConfig {
            stale_after,
            ..config(addr)
        });
        channel.start("tok", |_| {}).unwrap();
        // Second start is a no-op while the worker runs.
        channel.start("other", |_| {}).unwrap();
        assert!(channel.is_running());

        let deadline = Instant::now() + Duration::from_secs(5);
        while connections.load(Ordering::SeqCst) < 1 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(connections.load(Ordering::SeqCst), 1);

        // One threshold crossing, one replacement connection.
        tokio::time::sleep(stale_after * 3 / 2).await;
        assert_eq!(connections.load(Ordering::SeqCst), 2);

        channel.stop();
        channel.stop();
        assert_eq!(channel.state(), PushState::Stopped);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_interrupts_reconnect_delay() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let mut channel = PushChannel::new(PushConfig {
            reconnect_delay: Duration::from_secs(60),
            ..config(addr)
        });
        channel.start("tok", |_| {}).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while channel.state() != PushState::Reconnecting && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(channel.state(), PushState::Reconnecting);

        let began = Instant::now();
        channel.stop();
        assert!(began.elapsed() < Duration::from_secs(5));
        assert_eq!(channel.state(), PushState::Stopped);
    }
}
