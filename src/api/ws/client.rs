//! Paradex WebSocket client
//!
//! One persistent connection carries JSON-RPC requests (`auth`, `subscribe`,
//! `unsubscribe`) and channel notifications. By default a background reader
//! task resolves pending requests by id, dispatches notifications to the
//! callback registered for their channel, and reconnects with backoff when
//! the socket drops. Registered callbacks survive reconnects and are
//! resubscribed.
//!
//! With `ws_auto_start_reader = false` no reader is spawned and the caller
//! drives dispatch with [`ParadexWebsocketClient::pump_once`] or
//! [`ParadexWebsocketClient::pump_until`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;

use super::channel::{ChannelParams, ParadexWebsocketChannel};
use super::connect::{TlsConnector, WsConnector, WsSink, WsSource};
use super::reconnect::{reconnect_with_backoff, ReconnectConfig};
use crate::api::auth::AuthProvider;
use crate::config::constants::{WS_PUMP_POLL_MS, WS_RPC_TIMEOUT_SECS};
use crate::config::ClientConfig;
use crate::error::{ParadexError, ParadexResult};
use crate::types::JsonRpcError;
use crate::utils::current_time_micros;

/// Async callback invoked with the channel kind and the whole notification.
///
/// Callbacks run on the reader task: awaiting a `request` on the same client
/// from inside a callback would wait on the reader itself.
pub type WsCallback =
    Arc<dyn Fn(ParadexWebsocketChannel, Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap an async closure as a `WsCallback`
pub fn callback<F, Fut>(f: F) -> WsCallback
where
    F: Fn(ParadexWebsocketChannel, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |channel, message| Box::pin(f(channel, message)))
}

/// Malformed bearer token, invalid bearer token, geo IP blocked
const AUTH_ERROR_CODES: [i64; 3] = [40110, 40111, 40112];

type PendingRequests = HashMap<u64, oneshot::Sender<ParadexResult<Value>>>;

struct Inner {
    url: String,
    read_timeout: Duration,
    reconnect: bool,
    reconnect_config: ReconnectConfig,
    auto_start_reader: bool,
    ping_interval: Option<Duration>,
    connector: Arc<dyn WsConnector>,
    auth: RwLock<Option<Arc<dyn AuthProvider>>>,
    sink: Mutex<Option<WsSink>>,
    /// Read half when the caller pumps instead of the reader task
    source: Mutex<Option<WsSource>>,
    callbacks: RwLock<HashMap<String, WsCallback>>,
    /// Channel name -> subscription confirmed by the server
    subscribed: RwLock<HashMap<String, bool>>,
    pending: Mutex<PendingRequests>,
    next_id: AtomicU64,
    reader: Mutex<Option<JoinHandle<()>>>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
    connected: AtomicBool,
    closing: AtomicBool,
}

#[derive(Clone)]
pub struct ParadexWebsocketClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ParadexWebsocketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParadexWebsocketClient")
            .field("url", &self.inner.url)
            .field("auto_start_reader", &self.inner.auto_start_reader)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl ParadexWebsocketClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_reconnect_config(config, ReconnectConfig::default())
    }

    pub fn with_reconnect_config(config: &ClientConfig, reconnect_config: ReconnectConfig) -> Self {
        Self::with_connector(config, reconnect_config, Arc::new(TlsConnector))
    }

    /// Client whose connections are opened by `connector`.
    pub fn with_connector(
        config: &ClientConfig,
        reconnect_config: ReconnectConfig,
        connector: Arc<dyn WsConnector>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                url: config.ws_url(),
                read_timeout: config.ws_timeout(),
                reconnect: config.ws_reconnect,
                reconnect_config,
                auto_start_reader: config.ws_auto_start_reader,
                ping_interval: config.ws_ping_interval(),
                connector,
                auth: RwLock::new(None),
                sink: Mutex::new(None),
                source: Mutex::new(None),
                callbacks: RwLock::new(HashMap::new()),
                subscribed: RwLock::new(HashMap::new()),
                pending: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(current_time_micros()),
                reader: Mutex::new(None),
                heartbeat: Mutex::new(None),
                connected: AtomicBool::new(false),
                closing: AtomicBool::new(false),
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Authenticate this and every later connection with tokens from `auth`.
    pub async fn init_account(&self, auth: Arc<dyn AuthProvider>) {
        *self.inner.auth.write().await = Some(auth);
    }

    /// Open the socket, start the reader, authenticate and resubscribe.
    ///
    /// Any previous connection's reader is stopped first. Without the
    /// background reader the auth request is sent without waiting; its
    /// response is handled by the next pump.
    #[tracing::instrument(skip(self), fields(url = %self.inner.url))]
    pub async fn connect(&self) -> ParadexResult<()> {
        self.inner.closing.store(false, Ordering::SeqCst);
        self.inner.stop_tasks().await;

        let (source, bearer) = self.inner.open().await?;
        if self.inner.auto_start_reader {
            let handle = tokio::spawn(Inner::read_loop(self.inner.clone(), source));
            *self.inner.reader.lock().await = Some(handle);
        } else {
            *self.inner.source.lock().await = Some(source);
        }

        if let Some(every) = self.inner.ping_interval {
            let handle = tokio::spawn(Inner::heartbeat_loop(self.inner.clone(), every));
            *self.inner.heartbeat.lock().await = Some(handle);
        }

        if let Some(token) = bearer {
            let auth = if self.inner.auto_start_reader {
                self.inner.authenticate(&token).await
            } else {
                self.inner
                    .notify("auth", json!({ "bearer": token }))
                    .await
                    .map(|_| ())
            };
            if let Err(e) = auth {
                self.close().await;
                return Err(e);
            }
        }

        self.inner.resubscribe().await?;
        tracing::info!("Paradex WebSocket connected");
        Ok(())
    }

    /// Subscribe to `channel` formatted with `params`; returns the channel name.
    pub async fn subscribe(
        &self,
        channel: ParadexWebsocketChannel,
        params: &ChannelParams,
        callback: WsCallback,
    ) -> ParadexResult<String> {
        let name = channel.format(params)?;
        self.subscribe_by_name(&name, Some(callback)).await?;
        Ok(name)
    }

    /// Subscribe to a concrete channel name.
    ///
    /// The callback is registered right away; when disconnected the
    /// subscription request goes out on the next `connect`.
    pub async fn subscribe_by_name(&self, name: &str, callback: Option<WsCallback>) -> ParadexResult<()> {
        if let Some(callback) = callback {
            self.inner
                .callbacks
                .write()
                .await
                .insert(name.to_string(), callback);
        }

        if !self.is_connected() {
            tracing::debug!(channel = %name, "Not connected, subscription deferred");
            return Ok(());
        }

        self.inner.send_subscribe(name).await?;
        tracing::info!(channel = %name, "Paradex subscribe request sent");
        Ok(())
    }

    pub async fn unsubscribe_by_name(&self, name: &str) -> ParadexResult<()> {
        self.inner.callbacks.write().await.remove(name);
        self.inner.subscribed.write().await.remove(name);

        if !self.is_connected() {
            return Ok(());
        }

        self.inner
            .notify("unsubscribe", json!({ "channel": name }))
            .await?;
        tracing::info!(channel = %name, "Paradex unsubscribe request sent");
        Ok(())
    }

    /// Channel name -> whether the server confirmed the subscription
    pub async fn get_subscriptions(&self) -> HashMap<String, bool> {
        self.inner.subscribed.read().await.clone()
    }

    /// Send a JSON-RPC request and wait for the response with the same id.
    ///
    /// Without the background reader another task must pump meanwhile.
    pub async fn request(&self, method: &str, params: Value) -> ParadexResult<Value> {
        self.inner.request(method, params).await
    }

    /// Feed a raw frame through the dispatcher as if it came from the socket.
    pub async fn inject(&self, raw: &str) {
        self.inner.process_message(raw).await;
    }

    /// Read and dispatch one frame from a connection without a reader task.
    ///
    /// Returns `false` when nothing arrived within a millisecond or the
    /// connection is gone.
    pub async fn pump_once(&self) -> bool {
        let deadline = Instant::now() + Duration::from_millis(WS_PUMP_POLL_MS);
        match self.inner.next_text(deadline).await {
            Some(text) => {
                self.inner.process_message(&text).await;
                true
            }
            None => false,
        }
    }

    /// Dispatch frames until `predicate` accepts one or `timeout` elapses.
    ///
    /// Returns the number of frames processed, the accepted one included.
    pub async fn pump_until<P>(&self, mut predicate: P, timeout: Duration) -> usize
    where
        P: FnMut(&Value) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut processed = 0;
        while let Some(text) = self.inner.next_text(deadline).await {
            processed += 1;
            if let Some(message) = self.inner.process_message(&text).await {
                if predicate(&message) {
                    break;
                }
            }
        }
        processed
    }

    /// Close the socket and stop the reader; no reconnect follows.
    pub async fn close(&self) {
        self.inner.closing.store(true, Ordering::SeqCst);
        self.inner.connected.store(false, Ordering::SeqCst);

        if let Some(mut sink) = self.inner.sink.lock().await.take() {
            if let Err(e) = sink.close().await {
                tracing::debug!("Paradex WebSocket close frame not sent: {}", e);
            }
        }
        self.inner.stop_tasks().await;
        self.inner.source.lock().await.take();
        self.inner.fail_pending("closed by client").await;
        tracing::info!("Paradex WebSocket closed");
    }
}

impl Inner {
    /// Connect with a fresh token and install the write half
    async fn open(&self) -> ParadexResult<(WsSource, Option<String>)> {
        let provider = self.auth.read().await.clone();
        let bearer = match provider {
            Some(provider) => provider.bearer_token().await?,
            None => None,
        };

        let connection = self.connector.connect(&self.url, bearer.as_deref()).await?;

        self.subscribed.write().await.clear();
        *self.sink.lock().await = Some(connection.sink);
        self.connected.store(true, Ordering::SeqCst);

        Ok((connection.source, bearer))
    }

    async fn stop_tasks(&self) {
        if let Some(handle) = self.reader.lock().await.take() {
            handle.abort();
        }
        if let Some(handle) = self.heartbeat.lock().await.take() {
            handle.abort();
        }
    }

    async fn authenticate(&self, token: &str) -> ParadexResult<()> {
        match self.request("auth", json!({ "bearer": token })).await {
            Ok(_) => {
                tracing::info!("Paradex WebSocket authenticated successfully");
                Ok(())
            }
            Err(ParadexError::Rpc { code, message }) if AUTH_ERROR_CODES.contains(&code) => {
                Err(ParadexError::AuthenticationFailed(format!("{} ({})", message, code)))
            }
            Err(e) => Err(e),
        }
    }

    async fn resubscribe(&self) -> ParadexResult<()> {
        let names: Vec<String> = self.callbacks.read().await.keys().cloned().collect();
        for name in names {
            self.send_subscribe(&name).await?;
        }
        Ok(())
    }

    async fn send_subscribe(&self, name: &str) -> ParadexResult<u64> {
        self.subscribed.write().await.insert(name.to_string(), false);
        self.notify("subscribe", json!({ "channel": name })).await
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn send_rpc(&self, id: u64, method: &str, params: Value) -> ParadexResult<()> {
        let msg = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id
        });

        let mut guard = self.sink.lock().await;
        let sink = guard
            .as_mut()
            .ok_or_else(|| ParadexError::ConnectionFailed("WebSocket not connected".into()))?;
        sink.send(Message::Text(msg.to_string())).await?;
        Ok(())
    }

    /// Send without waiting; the response is only logged
    async fn notify(&self, method: &str, params: Value) -> ParadexResult<u64> {
        let id = self.next_id();
        self.send_rpc(id, method, params).await?;
        Ok(id)
    }

    async fn request(&self, method: &str, params: Value) -> ParadexResult<Value> {
        let id = self.next_id();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        if let Err(e) = self.send_rpc(id, method, params).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(Duration::from_secs(WS_RPC_TIMEOUT_SECS), rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ParadexError::ConnectionFailed(format!(
                "WebSocket closed before response to '{}'",
                method
            ))),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(ParadexError::NetworkTimeout(WS_RPC_TIMEOUT_SECS * 1000))
            }
        }
    }

    async fn fail_pending(&self, reason: &str) {
        let pending: Vec<_> = self.pending.lock().await.drain().collect();
        for (_, tx) in pending {
            let _ = tx.send(Err(ParadexError::ConnectionFailed(format!(
                "WebSocket disconnected: {}",
                reason
            ))));
        }
    }

    /// Ping the server every `every` while connected
    async fn heartbeat_loop(self: Arc<Self>, every: Duration) {
        let mut interval = tokio::time::interval(every);
        // the first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            if self.closing.load(Ordering::SeqCst) {
                break;
            }
            if !self.connected.load(Ordering::SeqCst) {
                continue;
            }

            let mut guard = self.sink.lock().await;
            if let Some(sink) = guard.as_mut() {
                match sink.send(Message::Ping(Vec::new())).await {
                    Ok(()) => tracing::trace!("Paradex heartbeat: ping sent"),
                    Err(e) => tracing::warn!("Paradex heartbeat: failed to send ping - {}", e),
                }
            }
        }
    }

    /// Background reader: dispatch frames, reconnect on disconnect
    async fn read_loop(self: Arc<Self>, mut source: WsSource) {
        tracing::info!("Paradex message reader loop started");
        loop {
            let reason = self.read_until_disconnect(&mut source).await;
            self.connected.store(false, Ordering::SeqCst);
            self.fail_pending(&reason).await;

            if self.closing.load(Ordering::SeqCst) {
                break;
            }
            tracing::warn!("Paradex WebSocket disconnected: {}", reason);
            if !self.reconnect {
                tracing::error!("Paradex WebSocket down and reconnect is disabled: {}", reason);
                break;
            }

            let inner = self.clone();
            let result = reconnect_with_backoff(&self.reconnect_config, "Paradex", || {
                let inner = inner.clone();
                async move { inner.reopen().await }
            })
            .await;

            match result {
                Ok(new_source) => source = new_source,
                Err(e) => {
                    tracing::error!(
                        attempts = self.reconnect_config.max_attempts,
                        "Paradex WebSocket reconnect gave up, client is disconnected: {}",
                        e
                    );
                    break;
                }
            }
        }

        self.connected.store(false, Ordering::SeqCst);
        *self.sink.lock().await = None;
        if let Some(handle) = self.heartbeat.lock().await.take() {
            handle.abort();
        }
        tracing::info!("Paradex message reader loop ended");
    }

    /// Read until close or error; returns the reason
    async fn read_until_disconnect(&self, source: &mut WsSource) -> String {
        loop {
            match tokio::time::timeout(self.read_timeout, source.next()).await {
                Err(_) => {
                    tracing::trace!("Paradex WebSocket read timeout");
                }
                Ok(None) => return "stream ended".to_string(),
                Ok(Some(Ok(Message::Text(text)))) => {
                    self.process_message(&text).await;
                }
                Ok(Some(Ok(Message::Close(frame)))) => {
                    tracing::info!("Paradex WebSocket closed by server");
                    return match frame {
                        Some(frame) => format!("closed by server ({})", frame.code),
                        None => "closed by server".to_string(),
                    };
                }
                Ok(Some(Ok(Message::Ping(data)))) => {
                    // tungstenite queues the pong itself
                    tracing::trace!("Ping received: {:?}", data);
                }
                Ok(Some(Ok(_))) => {}
                Ok(Some(Err(e))) => {
                    tracing::error!("Paradex WebSocket error: {}", e);
                    return e.to_string();
                }
            }
        }
    }

    /// Next text frame of a pumped connection; `None` at the deadline or
    /// once the connection is gone
    async fn next_text(&self, deadline: Instant) -> Option<String> {
        let mut guard = self.source.lock().await;
        let source = guard.as_mut()?;

        let reason = loop {
            match tokio::time::timeout_at(deadline, source.next()).await {
                Err(_) => return None,
                Ok(Some(Ok(Message::Text(text)))) => return Some(text),
                Ok(Some(Ok(Message::Close(_)))) => break "closed by server".to_string(),
                Ok(Some(Ok(_))) => {}
                Ok(Some(Err(e))) => break e.to_string(),
                Ok(None) => break "stream ended".to_string(),
            }
        };

        *guard = None;
        drop(guard);

        tracing::warn!("Paradex WebSocket disconnected: {}", reason);
        self.connected.store(false, Ordering::SeqCst);
        *self.sink.lock().await = None;
        self.fail_pending(&reason).await;
        None
    }

    /// Reconnect attempt: new socket, auth without waiting, resubscribe
    async fn reopen(&self) -> ParadexResult<WsSource> {
        if self.closing.load(Ordering::SeqCst) {
            return Err(ParadexError::ConnectionFailed("WebSocket is closing".into()));
        }

        let (source, bearer) = self.open().await?;
        if let Err(e) = self.restore_session(bearer).await {
            self.connected.store(false, Ordering::SeqCst);
            *self.sink.lock().await = None;
            return Err(e);
        }

        tracing::info!("Paradex WebSocket reconnected");
        Ok(source)
    }

    async fn restore_session(&self, bearer: Option<String>) -> ParadexResult<()> {
        if let Some(token) = bearer {
            self.notify("auth", json!({ "bearer": token })).await?;
        }
        self.resubscribe().await
    }

    /// Parse and dispatch one frame; returns the parsed message
    async fn process_message(&self, text: &str) -> Option<Value> {
        tracing::trace!("Paradex raw WS message: {}", text);

        let message: Value = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, message = %text, "Paradex message parse failed");
                return None;
            }
        };

        self.dispatch(&message).await;
        Some(message)
    }

    async fn dispatch(&self, message: &Value) {
        if let Some(id) = message.get("id").and_then(Value::as_u64) {
            self.handle_response(id, message).await;
            return;
        }

        let Some(name) = message.pointer("/params/channel").and_then(Value::as_str) else {
            tracing::debug!(message = %message, "Non-actionable message");
            return;
        };

        let Some(channel) = ParadexWebsocketChannel::from_channel_name(name) else {
            tracing::debug!(channel = %name, "Unknown channel, message dropped");
            return;
        };

        let callback = self.callbacks.read().await.get(name).cloned();
        match callback {
            Some(callback) => callback(channel, message.clone()).await,
            None => tracing::info!(channel = %name, "Non-callback channel, message dropped"),
        }
    }

    async fn handle_response(&self, id: u64, message: &Value) {
        if let Some(channel) = message.pointer("/result/channel").and_then(Value::as_str) {
            self.subscribed.write().await.insert(channel.to_string(), true);
            tracing::debug!(channel = %channel, "Paradex subscription confirmed");
        }

        let result = match message.get("error") {
            Some(err) if !err.is_null() => {
                let err = serde_json::from_value::<JsonRpcError>(err.clone()).unwrap_or_else(|_| {
                    JsonRpcError {
                        code: 0,
                        message: err.to_string(),
                        data: None,
                    }
                });
                Err(ParadexError::Rpc {
                    code: err.code,
                    message: err.message,
                })
            }
            _ => Ok(message.get("result").cloned().unwrap_or(Value::Null)),
        };

        let waiter = self.pending.lock().await.remove(&id);
        match (waiter, result) {
            (Some(tx), result) => {
                let _ = tx.send(result);
            }
            (None, Err(e)) => tracing::warn!("JSON-RPC error for id={}: {}", id, e),
            (None, Ok(_)) => tracing::debug!("JSON-RPC response: id={}", id),
        }
    }
}
