//! Realtime channel — a reconnecting WebSocket client scoped to one session.
//!
//! ## Lifecycle
//!
//! ```text
//!   Closed ──connect()──> Connecting ──handshake ok──> Open
//!                            ^   │                      │
//!                            │   │ handshake failed     │ socket closed
//!                            │   v                      v
//!                            └── retry (attempts < max, fixed interval)
//!                                │
//!                                └─ attempts exhausted ──> Failed
//!
//!   disconnect() from any state ──> Closed (pinned, terminal)
//! ```
//!
//! The channel never inspects payloads: every decoded `{type, payload}`
//! frame is fanned out to the subscribers of its `type`, then once more to
//! the subscribers of [`envelope::MESSAGE`] with the frame as received.

pub mod envelope;
pub mod subscribers;
pub mod transport;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use reqwest::Url;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::errors::ChannelError;
use envelope::{CONNECTION_ESTABLISHED, CONNECTION_FAILED, ClientMessage, Envelope, MESSAGE};
use subscribers::{Listener, SubscriberTable, SubscriptionId};
use transport::{Connection, Connector, Frame, WsConnector};

pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8080/ws";

/// Reconnect attempts allowed after a close before giving up.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Fixed delay between a close and the next reconnect attempt.
pub const RECONNECT_INTERVAL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RECONNECT_ATTEMPTS,
            interval: RECONNECT_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Failed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Shared state between the handle and the driver task ──────────────

struct Control {
    attempts: u32,
    /// Set by `disconnect()`. Once set, nothing transitions or emits again.
    pinned: bool,
    outbound: Option<mpsc::UnboundedSender<String>>,
}

struct Shared {
    control: Mutex<Control>,
    subscribers: Mutex<SubscriberTable>,
    state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
}

impl Shared {
    fn control(&self) -> MutexGuard<'_, Control> {
        // Plain data: usable after a listener panic.
        self.control.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn subscribers(&self) -> MutexGuard<'_, SubscriberTable> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_pinned(&self) -> bool {
        self.control().pinned
    }

    /// Move to `next` unless the channel has been pinned.
    fn transition(&self, next: ConnectionState) -> bool {
        let control = self.control();
        if control.pinned {
            return false;
        }
        self.state.send_replace(next);
        true
    }

    /// Invoke the listeners for `event` in order. A listener that
    /// disconnects the channel stops the rest of the fan-out.
    fn emit(&self, event: &str, payload: &Value) {
        let listeners = self.subscribers().listeners_for(event);
        for listener in listeners {
            if self.is_pinned() {
                tracing::debug!(event, "channel disconnected mid-dispatch");
                return;
            }
            listener(payload);
        }
    }

    fn dispatch_frame(&self, text: &str) {
        let Some((envelope, raw)) = Envelope::decode_raw(text) else {
            tracing::debug!(len = text.len(), "dropping malformed realtime frame");
            return;
        };
        tracing::trace!(kind = %envelope.kind, "realtime frame");
        self.emit(&envelope.kind, &envelope.payload);
        if self.is_pinned() {
            return;
        }
        self.emit(MESSAGE, &raw);
    }

    /// Mark the transport open. Returns the outbound receiver, or `None` if
    /// the channel was pinned while the handshake was in flight.
    fn open(&self) -> Option<mpsc::UnboundedReceiver<String>> {
        let mut control = self.control();
        if control.pinned {
            return None;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        control.attempts = 0;
        control.outbound = Some(tx);
        self.state.send_replace(ConnectionState::Open);
        Some(rx)
    }

    fn clear_outbound(&self) {
        self.control().outbound = None;
    }
}

// ── Channel handle ───────────────────────────────────────────────────

/// Persistent, auto-reconnecting realtime connection for one session
/// token. Dropping the handle disconnects it.
pub struct RealtimeChannel {
    token: String,
    endpoint: String,
    policy: ReconnectPolicy,
    connector: Arc<dyn Connector>,
    shared: Arc<Shared>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl RealtimeChannel {
    /// Bind a channel to a session token. Does not connect.
    pub fn new(token: impl Into<String>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Closed);
        Self {
            token: token.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            policy: ReconnectPolicy::default(),
            connector: Arc::new(WsConnector),
            shared: Arc::new(Shared {
                control: Mutex::new(Control {
                    attempts: 0,
                    pinned: false,
                    outbound: None,
                }),
                subscribers: Mutex::new(SubscriberTable::new()),
                state,
                cancel: CancellationToken::new(),
            }),
            driver: Mutex::new(None),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    /// Endpoint with the session token attached as a query parameter.
    pub fn endpoint_url(&self) -> String {
        match Url::parse(&self.endpoint) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("token", &self.token);
                url.to_string()
            }
            // Let the connector report the bad endpoint through the retry path.
            Err(_) => format!("{}?token={}", self.endpoint, self.token),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Reconnect attempts made since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.shared.control().attempts
    }

    /// Open the transport. Must be called from within a tokio runtime.
    ///
    /// Only starts from the idle `Closed` state: calling it while a
    /// connection is live, after the channel failed, or after
    /// `disconnect()` does nothing.
    pub fn connect(&self) {
        if self.shared.is_pinned() {
            tracing::debug!("connect ignored: channel was disconnected");
            return;
        }
        let mut driver = self.driver.lock().unwrap_or_else(|e| e.into_inner());
        if driver.is_some() {
            tracing::debug!(state = %self.state(), "connect ignored: channel already started");
            return;
        }
        let url = self.endpoint_url();
        tracing::info!(endpoint = %self.endpoint, "opening realtime channel");
        *driver = Some(tokio::spawn(drive(
            Arc::clone(&self.shared),
            Arc::clone(&self.connector),
            url,
            self.policy,
        )));
    }

    /// Subscribe to an event type. Listeners run on the channel's driver
    /// task, in subscription order.
    pub fn on<F>(&self, event: &str, listener: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        self.shared.subscribers().subscribe(event, listener)
    }

    /// Unsubscribe. Unknown ids are a no-op.
    pub fn off(&self, event: &str, id: SubscriptionId) {
        self.shared.subscribers().unsubscribe(event, id);
    }

    /// Serialize and transmit `message` if the transport is open; otherwise
    /// drop it. Returns whether the message was handed to the transport.
    pub fn send<T: Serialize>(&self, message: &T) -> bool {
        let text = match encode(message) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode outbound realtime message");
                return false;
            }
        };
        let control = self.shared.control();
        if self.state() != ConnectionState::Open {
            tracing::debug!(state = %self.state(), "dropping outbound message: channel not open");
            return false;
        }
        match &control.outbound {
            Some(tx) => tx.send(text).is_ok(),
            None => false,
        }
    }

    pub fn subscribe_project(&self, project_id: i64) -> bool {
        self.send(&ClientMessage::SubscribeProject { project_id })
    }

    pub fn unsubscribe_project(&self, project_id: i64) -> bool {
        self.send(&ClientMessage::UnsubscribeProject { project_id })
    }

    /// Stop the channel permanently. Pins the attempt counter, cancels any
    /// pending reconnect timer and closes the transport. Idempotent.
    pub fn disconnect(&self) {
        {
            let mut control = self.shared.control();
            if control.pinned {
                return;
            }
            control.pinned = true;
            control.attempts = self.policy.max_attempts;
            control.outbound = None;
            self.shared.state.send_replace(ConnectionState::Closed);
        }
        self.shared.cancel.cancel();
        tracing::info!("realtime channel disconnected");
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn encode<T: Serialize>(message: &T) -> Result<String, ChannelError> {
    Ok(serde_json::to_string(message)?)
}

// ── Driver task ──────────────────────────────────────────────────────

async fn drive(
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    url: String,
    policy: ReconnectPolicy,
) {
    loop {
        if !shared.transition(ConnectionState::Connecting) {
            return;
        }

        let attempt = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => return,
            result = connector.connect(&url) => result,
        };

        match attempt {
            Ok(connection) => {
                let Some(outbound) = shared.open() else {
                    let mut sink = connection.sink;
                    let _ = sink.close().await;
                    return;
                };
                tracing::info!("realtime channel open");
                shared.emit(CONNECTION_ESTABLISHED, &json!({ "message": "Connected" }));
                pump(&shared, connection, outbound).await;
                shared.clear_outbound();
                tracing::info!("realtime channel closed");
            }
            Err(e) => {
                tracing::warn!(error = %e, "realtime connect failed");
            }
        }

        if !schedule_retry(&shared, &policy).await {
            return;
        }
    }
}

/// Forward frames in both directions until the transport closes or the
/// channel is cancelled.
async fn pump(
    shared: &Shared,
    connection: Connection,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    let Connection {
        mut sink,
        mut stream,
    } = connection;

    loop {
        tokio::select! {
            biased;

            _ = shared.cancel.cancelled() => {
                // Flush messages queued before the disconnect (unsubscribe).
                while let Ok(text) = outbound.try_recv() {
                    if sink.send(text).await.is_err() {
                        break;
                    }
                }
                let _ = sink.close().await;
                break;
            }

            Some(text) = outbound.recv() => {
                if let Err(e) = sink.send(text).await {
                    tracing::warn!(error = %e, "realtime send failed");
                    break;
                }
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(Frame::Text(text))) => {
                        if shared.is_pinned() {
                            break;
                        }
                        shared.dispatch_frame(&text);
                    }
                    Some(Ok(Frame::Other)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "realtime transport error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }
}

/// After a close: wait and retry while attempts remain, otherwise report
/// failure. Returns `true` when the caller should connect again.
async fn schedule_retry(shared: &Shared, policy: &ReconnectPolicy) -> bool {
    let next_attempt = {
        let mut control = shared.control();
        if control.pinned {
            return false;
        }
        if control.attempts < policy.max_attempts {
            control.attempts += 1;
            Some(control.attempts)
        } else {
            None
        }
    };

    match next_attempt {
        Some(attempt) => {
            if !shared.transition(ConnectionState::Connecting) {
                return false;
            }
            tracing::info!(
                attempt,
                max_attempts = policy.max_attempts,
                delay_ms = policy.interval.as_millis() as u64,
                "scheduling realtime reconnect"
            );
            tokio::select! {
                biased;
                _ = shared.cancel.cancelled() => false,
                _ = tokio::time::sleep(policy.interval) => !shared.is_pinned(),
            }
        }
        None => {
            if shared.transition(ConnectionState::Failed) {
                tracing::warn!(
                    max_attempts = policy.max_attempts,
                    "realtime channel gave up reconnecting"
                );
                shared.emit(CONNECTION_FAILED, &json!({ "message": "Unable to reconnect" }));
            }
            false
        }
    }
}
