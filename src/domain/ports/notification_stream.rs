use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::errors::NotifyResult;

/// Event name that carries notification snapshots
pub const NOTIFICATION_EVENT: &str = "notification";

/// One dispatched server-sent event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamFrame {
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

impl StreamFrame {
    /// Frame on the named `notification` channel
    pub fn notification(data: impl Into<String>) -> Self {
        Self {
            event: Some(NOTIFICATION_EVENT.to_string()),
            data: data.into(),
            id: None,
        }
    }

    /// Unlabelled frame, delivered to the default message handler
    pub fn unlabelled(data: impl Into<String>) -> Self {
        Self {
            event: None,
            data: data.into(),
            id: None,
        }
    }

    /// Whether this frame should be decoded as a notification snapshot.
    /// Unlabelled and `message` frames are accepted for older servers.
    pub fn carries_snapshot(&self) -> bool {
        match self.event.as_deref() {
            None | Some("") | Some("message") => true,
            Some(name) => name == NOTIFICATION_EVENT,
        }
    }
}

/// What a live push channel yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The server accepted the connection
    Open,
    Message(StreamFrame),
    /// `terminal` is set when the transport is closed and will yield nothing more
    Error { terminal: bool, message: String },
}

/// Lazy, non-restartable sequence of transport events. The channel ending
/// means the transport closed; dropping it closes the transport.
pub type NotificationChannel = BoxStream<'static, TransportEvent>;

/// Opens push connections to the notification stream
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(&self, token: &str) -> NotifyResult<NotificationChannel>;
}
