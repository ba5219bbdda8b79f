use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::domain::entities::Notification;

/// Ordered, in-memory set of the user's notifications.
///
/// Backed by a watch channel so the view layer can re-render on every
/// change. Counts are derived from the current contents on each call.
#[derive(Clone)]
pub struct NotificationStore {
    inner: Arc<watch::Sender<Vec<Notification>>>,
}

impl NotificationStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(tx),
        }
    }

    /// Discard the current contents and install a pushed snapshot
    pub fn replace_all(&self, notifications: Vec<Notification>) {
        self.inner.send_replace(notifications);
    }

    /// Drop a notification after a confirmed accept or decline.
    /// Returns false if it was not present.
    pub fn remove(&self, id: &str) -> bool {
        self.inner.send_if_modified(|notifications| {
            let before = notifications.len();
            notifications.retain(|n| n.id != id);
            notifications.len() != before
        })
    }

    /// Flag a notification as read after a confirmed mark-as-read.
    /// Returns false if it was absent or already read.
    pub fn mark_read(&self, id: &str) -> bool {
        self.inner.send_if_modified(|notifications| {
            notifications
                .iter_mut()
                .find(|n| n.id == id)
                .map(Notification::mark_read)
                .unwrap_or(false)
        })
    }

    pub fn get(&self, id: &str) -> Option<Notification> {
        self.inner.borrow().iter().find(|n| n.id == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.borrow().iter().any(|n| n.id == id)
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.inner.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.inner.borrow().iter().filter(|n| !n.is_read).count()
    }

    pub fn read_count(&self) -> usize {
        self.inner.borrow().iter().filter(|n| n.is_read).count()
    }

    /// Receiver that is notified after every mutation
    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.inner.subscribe()
    }

    /// Stream of store contents, starting with the current value
    pub fn changes(&self) -> WatchStream<Vec<Notification>> {
        WatchStream::new(self.subscribe())
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}
