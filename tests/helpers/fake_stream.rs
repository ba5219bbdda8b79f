use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use guarantor_notify::domain::errors::{NotifyError, NotifyResult};
use guarantor_notify::domain::ports::notification_stream::{
    NotificationChannel, StreamConnector, StreamFrame, TransportEvent,
};

/// Scriptable stream connector.
///
/// Every successful `connect` hands out a channel that has already emitted
/// `Open`. The test drives the newest channel through the connector.
#[derive(Default)]
pub struct FakeConnector {
    tokens: Mutex<Vec<String>>,
    senders: Mutex<Vec<mpsc::UnboundedSender<TransportEvent>>>,
    fail_next: AtomicUsize,
    open: Arc<AtomicUsize>,
    max_open: Arc<AtomicUsize>,
}

struct OpenGuard {
    open: Arc<AtomicUsize>,
}

impl Drop for OpenGuard {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Refuse the next `count` connection attempts
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    /// Channels not yet dropped by the consumer
    pub fn open_channels(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn max_open_channels(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    pub fn send(&self, event: TransportEvent) {
        if let Some(sender) = self.senders.lock().unwrap().last() {
            let _ = sender.send(event);
        }
    }

    pub fn push_snapshot(&self, json: impl Into<String>) {
        self.send(TransportEvent::Message(StreamFrame::notification(json)));
    }

    /// End the newest channel as if the server closed the response
    pub fn close_current(&self) {
        self.senders.lock().unwrap().pop();
    }

    pub fn fail_current(&self, message: &str) {
        self.send(TransportEvent::Error {
            terminal: true,
            message: message.to_string(),
        });
    }
}

#[async_trait]
impl StreamConnector for FakeConnector {
    async fn connect(&self, token: &str) -> NotifyResult<NotificationChannel> {
        self.tokens.lock().unwrap().push(token.to_string());

        let refused = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(NotifyError::Transport("connection refused".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(TransportEvent::Open);
        self.senders.lock().unwrap().push(tx);

        let now_open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_open.fetch_max(now_open, Ordering::SeqCst);
        let guard = OpenGuard {
            open: self.open.clone(),
        };

        Ok(UnboundedReceiverStream::new(rx)
            .map(move |event| {
                let _open = &guard;
                event
            })
            .boxed())
    }
}
