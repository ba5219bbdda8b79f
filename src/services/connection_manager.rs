use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::entities::{
    validate_transition, ConnectionState, NotificationSnapshot, Route, SessionContext,
};
use crate::domain::ports::notification_stream::{StreamConnector, StreamFrame, TransportEvent};
use crate::domain::ports::time_service::TimeService;
use crate::services::notification_store::NotificationStore;

/// Owns the single push connection to the notification stream.
///
/// A connection exists iff the current [`SessionContext`] is eligible
/// (token present, route on the allow-list). Every context change tears the
/// old connection down, cancelling any scheduled reconnect, before a new one
/// is opened. Unexpected loss is retried forever after a fixed delay.
pub struct ConnectionManager {
    connector: Arc<dyn StreamConnector>,
    store: NotificationStore,
    time_service: Arc<dyn TimeService>,
    reconnect_delay: Duration,
    state: Arc<watch::Sender<ConnectionState>>,
    inner: Mutex<ManagerInner>,
}

struct ManagerInner {
    context: SessionContext,
    active: Option<ActiveConnection>,
}

struct ActiveConnection {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ConnectionManager {
    pub fn new(
        connector: Arc<dyn StreamConnector>,
        store: NotificationStore,
        time_service: Arc<dyn TimeService>,
        reconnect_delay: Duration,
    ) -> Self {
        let (state, _rx) = watch::channel(ConnectionState::Disconnected);

        Self {
            connector,
            store,
            time_service,
            reconnect_delay,
            state: Arc::new(state),
            inner: Mutex::new(ManagerInner {
                context: SessionContext::default(),
                active: None,
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    pub async fn context(&self) -> SessionContext {
        self.inner.lock().await.context.clone()
    }

    /// Whether a stream worker currently exists (connected or retrying)
    pub async fn is_active(&self) -> bool {
        self.inner.lock().await.active.is_some()
    }

    /// Open a connection for the current context if it is eligible and none exists
    pub async fn start(&self) {
        let mut inner = self.inner.lock().await;
        if inner.active.is_none() {
            self.open_if_eligible(&mut inner);
        }
    }

    /// Close the connection and cancel any pending reconnect
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        self.teardown(&mut inner).await;
        transition(&self.state, ConnectionState::Closed);
    }

    /// Apply a new (token, route) pair
    pub async fn update_session(&self, context: SessionContext) {
        let mut inner = self.inner.lock().await;
        self.apply(&mut inner, context).await;
    }

    pub async fn set_token(&self, token: Option<String>) {
        let mut inner = self.inner.lock().await;
        let context = SessionContext::new(token, inner.context.route.clone());
        self.apply(&mut inner, context).await;
    }

    pub async fn set_route(&self, route: Route) {
        let mut inner = self.inner.lock().await;
        let context = SessionContext::new(inner.context.token.clone(), route);
        self.apply(&mut inner, context).await;
    }

    async fn apply(&self, inner: &mut ManagerInner, context: SessionContext) {
        if inner.context == context && inner.active.is_some() {
            debug!("Session context unchanged, keeping notification stream");
            return;
        }

        if self.teardown(inner).await {
            transition(&self.state, ConnectionState::Closed);
        }

        // Another user's (or a signed-out) snapshot must not linger
        if inner.context.token != context.token && !self.store.is_empty() {
            debug!("Session token changed, discarding previous notifications");
            self.store.replace_all(Vec::new());
        }

        inner.context = context;
        self.open_if_eligible(inner);
    }

    fn open_if_eligible(&self, inner: &mut ManagerInner) {
        let Some(token) = inner.context.stream_token() else {
            debug!(
                route = %inner.context.route.path(),
                signed_in = inner.context.token.is_some(),
                "Notification stream not eligible"
            );
            return;
        };

        let cancel = CancellationToken::new();
        let worker = StreamWorker {
            connector: self.connector.clone(),
            store: self.store.clone(),
            state: self.state.clone(),
            time_service: self.time_service.clone(),
            reconnect_delay: self.reconnect_delay,
            token: token.to_string(),
            cancel: cancel.clone(),
        };

        info!(route = %inner.context.route.path(), "Opening notification stream");
        transition(&self.state, ConnectionState::Connecting);

        let task = tokio::spawn(worker.run());
        inner.active = Some(ActiveConnection { cancel, task });
    }

    /// Cancel and await the current worker so its transport is dropped
    /// before anything else opens. Returns false if there was none.
    async fn teardown(&self, inner: &mut ManagerInner) -> bool {
        let Some(active) = inner.active.take() else {
            return false;
        };

        active.cancel.cancel();
        if let Err(e) = active.task.await {
            if e.is_panic() {
                warn!("Notification stream worker panicked: {}", e);
            }
        }

        info!("Notification stream closed");
        true
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(active) = self.inner.get_mut().active.take() {
            active.cancel.cancel();
            active.task.abort();
        }
    }
}

fn transition(state: &watch::Sender<ConnectionState>, to: ConnectionState) {
    state.send_if_modified(|current| {
        if *current == to {
            return false;
        }
        match validate_transition(*current, to) {
            Ok(()) => {
                debug!(from = %current, to = %to, "Notification stream state change");
                *current = to;
                true
            }
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    });
}

#[derive(Debug)]
enum SessionEnd {
    ConnectFailed,
    TransportFailed,
    StreamEnded,
}

/// Connect/consume/retry loop for one eligibility period
struct StreamWorker {
    connector: Arc<dyn StreamConnector>,
    store: NotificationStore,
    state: Arc<watch::Sender<ConnectionState>>,
    time_service: Arc<dyn TimeService>,
    reconnect_delay: Duration,
    token: String,
    cancel: CancellationToken,
}

impl StreamWorker {
    async fn run(self) {
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            transition(&self.state, ConnectionState::Connecting);

            let end = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                end = self.stream_session(attempt) => end,
            };

            transition(&self.state, ConnectionState::Reconnecting);
            metrics::counter!("notification_stream_reconnects_total").increment(1);
            info!(
                attempt,
                reason = ?end,
                delay_secs = self.reconnect_delay.as_secs_f64(),
                "Notification stream lost, scheduling reconnect"
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                _ = self.time_service.sleep(self.reconnect_delay) => {}
            }
        }
    }

    async fn stream_session(&self, attempt: u64) -> SessionEnd {
        let mut channel = match self.connector.connect(&self.token).await {
            Ok(channel) => channel,
            Err(e) => {
                warn!(attempt, error = %e, "Failed to open notification stream");
                return SessionEnd::ConnectFailed;
            }
        };

        while let Some(event) = channel.next().await {
            match event {
                TransportEvent::Open => {
                    transition(&self.state, ConnectionState::Connected);
                    metrics::counter!("notification_stream_connects_total").increment(1);
                    info!(attempt, "Notification stream connected");
                }
                TransportEvent::Message(frame) => self.handle_frame(frame),
                TransportEvent::Error {
                    terminal: false,
                    message,
                } => {
                    warn!(error = %message, "Transient notification stream error");
                }
                TransportEvent::Error {
                    terminal: true,
                    message,
                } => {
                    warn!(error = %message, "Notification stream closed by transport error");
                    drop(channel);
                    return SessionEnd::TransportFailed;
                }
            }
        }

        SessionEnd::StreamEnded
    }

    fn handle_frame(&self, frame: StreamFrame) {
        if !frame.carries_snapshot() {
            debug!(event = ?frame.event, "Ignoring unrelated stream event");
            return;
        }

        let snapshot = match NotificationSnapshot::from_json(&frame.data) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                metrics::counter!("notification_stream_payloads_dropped_total").increment(1);
                warn!(error = %e, "Dropping malformed notification payload");
                return;
            }
        };

        if !snapshot.success {
            debug!(message = ?snapshot.message, "Server sent an unsuccessful snapshot");
            return;
        }

        match snapshot.into_notifications() {
            Some(notifications) => {
                let count = notifications.len();
                self.store.replace_all(notifications);
                debug!(count, "Applied notification snapshot");
            }
            None => {
                metrics::counter!("notification_stream_payloads_dropped_total").increment(1);
                warn!("Dropping notification payload without a data list");
            }
        }
    }
}
