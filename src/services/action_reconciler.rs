use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::domain::entities::{
    ActionKind, ActionOutcome, ActionStatus, GuarantorDecision, GuarantorResponse, IgnoreReason,
    Notification, NotificationKind, PendingAction,
};
use crate::domain::errors::NotifyResult;
use crate::domain::ports::notification_api::NotificationApi;
use crate::domain::ports::view_binding::{Notice, ViewBinding};
use crate::services::notification_store::NotificationStore;

type ActionTable = Arc<Mutex<HashMap<String, PendingAction>>>;

/// Executes user actions on notifications against the server.
///
/// At most one action per notification is in flight; a second request for
/// the same notification while one is pending is dropped, not queued. The
/// store is only touched after the server confirms.
#[derive(Clone)]
pub struct ActionReconciler {
    api: Arc<dyn NotificationApi>,
    store: NotificationStore,
    view: Arc<dyn ViewBinding>,
    actions: ActionTable,
}

impl ActionReconciler {
    pub fn new(
        api: Arc<dyn NotificationApi>,
        store: NotificationStore,
        view: Arc<dyn ViewBinding>,
    ) -> Self {
        Self {
            api,
            store,
            view,
            actions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Accept a guarantor request
    pub async fn accept(&self, notification: &Notification) -> NotifyResult<ActionOutcome> {
        self.respond(notification, GuarantorDecision::Accepted, String::new())
            .await
    }

    /// Decline a guarantor request, with an optional free-text reason
    pub async fn decline(
        &self,
        notification: &Notification,
        reason: impl Into<String>,
    ) -> NotifyResult<ActionOutcome> {
        self.respond(notification, GuarantorDecision::Declined, reason.into())
            .await
    }

    async fn respond(
        &self,
        notification: &Notification,
        decision: GuarantorDecision,
        reason: String,
    ) -> NotifyResult<ActionOutcome> {
        let kind = ActionKind::from(decision);

        match notification.kind {
            NotificationKind::GuarantorRequest => {}
            NotificationKind::GuarantorAcceptance
            | NotificationKind::GuarantorRejection
            | NotificationKind::Other(_) => {
                debug!(notification_id = %notification.id, kind = %notification.kind, "Only guarantor requests can be answered");
                return Ok(ActionOutcome::Ignored(IgnoreReason::NotActionable));
            }
        }

        let Some(loan_id) = notification.loan_id() else {
            warn!(notification_id = %notification.id, "Guarantor request has no loan attached");
            return Ok(ActionOutcome::Ignored(IgnoreReason::NotActionable));
        };

        let Some(guard) = self.begin(&notification.id, kind) else {
            return Ok(ActionOutcome::Ignored(IgnoreReason::InFlight));
        };

        let request = GuarantorResponse {
            response: decision,
            reason,
            loan_id: loan_id.to_string(),
            notification_id: notification.id.clone(),
        };

        match self.api.respond(&request).await {
            Ok(ack) => {
                // Removal also retires the unread flag
                guard.complete_after(ActionStatus::Done, || {
                    self.store.remove(&notification.id);
                });
                record_outcome(kind, "applied");
                info!(notification_id = %notification.id, action = %kind, "Guarantor response confirmed");

                let message = ack
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| default_success_message(decision).to_string());
                self.view.show_notice(Notice::success(message));

                Ok(ActionOutcome::Applied)
            }
            Err(e) => {
                guard.complete(ActionStatus::Failed);
                record_outcome(kind, "failed");
                warn!(notification_id = %notification.id, action = %kind, error = %e, "Guarantor response failed");

                let message = e
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| default_failure_message(decision).to_string());
                self.view.show_notice(Notice::error(message));

                Err(e)
            }
        }
    }

    /// Mark an unread notification as read. Failures are logged, not shown.
    pub async fn mark_as_read(&self, notification: &Notification) -> NotifyResult<ActionOutcome> {
        if self.is_read(notification) {
            return Ok(ActionOutcome::Ignored(IgnoreReason::AlreadyRead));
        }

        let Some(guard) = self.begin(&notification.id, ActionKind::MarkAsRead) else {
            return Ok(ActionOutcome::Ignored(IgnoreReason::InFlight));
        };

        match self.api.mark_as_read(&notification.id).await {
            Ok(_) => {
                guard.complete_after(ActionStatus::Done, || {
                    self.store.mark_read(&notification.id);
                });
                record_outcome(ActionKind::MarkAsRead, "applied");
                debug!(notification_id = %notification.id, "Notification marked as read");
                Ok(ActionOutcome::Applied)
            }
            Err(e) => {
                guard.complete(ActionStatus::Failed);
                record_outcome(ActionKind::MarkAsRead, "failed");
                warn!(notification_id = %notification.id, error = %e, "Failed to mark notification as read");
                Err(e)
            }
        }
    }

    /// Mark an acceptance/rejection as read, then open its loan
    pub async fn view_details(&self, notification: &Notification) -> NotifyResult<ActionOutcome> {
        match notification.kind {
            NotificationKind::GuarantorAcceptance | NotificationKind::GuarantorRejection => {}
            NotificationKind::GuarantorRequest | NotificationKind::Other(_) => {
                return Ok(ActionOutcome::Ignored(IgnoreReason::NotActionable));
            }
        }

        let Some(loan_id) = notification.loan_id() else {
            warn!(notification_id = %notification.id, "Notification has no loan to show");
            return Ok(ActionOutcome::Ignored(IgnoreReason::NotActionable));
        };

        let Some(guard) = self.begin(&notification.id, ActionKind::ViewDetails) else {
            return Ok(ActionOutcome::Ignored(IgnoreReason::InFlight));
        };

        if !self.is_read(notification) {
            match self.api.mark_as_read(&notification.id).await {
                Ok(_) => {
                    self.store.mark_read(&notification.id);
                }
                Err(e) => {
                    warn!(notification_id = %notification.id, error = %e, "Failed to mark notification as read before opening loan");
                }
            }
        }

        guard.complete(ActionStatus::Done);
        record_outcome(ActionKind::ViewDetails, "applied");
        self.view.open_loan_details(loan_id);

        Ok(ActionOutcome::Applied)
    }

    /// Latest action recorded for a notification
    pub fn pending_action(&self, notification_id: &str) -> Option<PendingAction> {
        lock(&self.actions).get(notification_id).cloned()
    }

    pub fn is_in_flight(&self, notification_id: &str) -> bool {
        lock(&self.actions)
            .get(notification_id)
            .map_or(false, PendingAction::is_in_flight)
    }

    fn is_read(&self, notification: &Notification) -> bool {
        self.store
            .get(&notification.id)
            .map_or(notification.is_read, |current| current.is_read)
    }

    /// Claim the in-flight slot for a notification, or `None` if it is taken
    fn begin(&self, notification_id: &str, kind: ActionKind) -> Option<InFlightGuard> {
        let mut actions = lock(&self.actions);

        if let Some(current) = actions.get(notification_id) {
            if current.is_in_flight() {
                debug!(
                    notification_id,
                    requested = %kind,
                    pending = %current.kind,
                    "Action already in flight, ignoring"
                );
                return None;
            }
        }

        // Settled records for notifications that are gone are no longer useful
        actions.retain(|id, action| action.is_in_flight() || self.store.contains(id));
        actions.insert(
            notification_id.to_string(),
            PendingAction::in_flight(notification_id, kind),
        );

        Some(InFlightGuard {
            actions: self.actions.clone(),
            notification_id: notification_id.to_string(),
            settled: false,
        })
    }
}

fn lock(actions: &ActionTable) -> MutexGuard<'_, HashMap<String, PendingAction>> {
    actions.lock().unwrap_or_else(PoisonError::into_inner)
}

fn record_outcome(kind: ActionKind, outcome: &'static str) {
    metrics::counter!("notification_actions_total", "action" => kind.as_str(), "outcome" => outcome)
        .increment(1);
}

fn default_success_message(decision: GuarantorDecision) -> &'static str {
    match decision {
        GuarantorDecision::Accepted => "Guarantor request accepted",
        GuarantorDecision::Declined => "Guarantor request declined",
    }
}

fn default_failure_message(decision: GuarantorDecision) -> &'static str {
    match decision {
        GuarantorDecision::Accepted => "Could not accept the guarantor request. Please try again.",
        GuarantorDecision::Declined => "Could not decline the guarantor request. Please try again.",
    }
}

/// Holds the in-flight slot; a guard dropped without `complete` (the caller
/// abandoned the future) records the action as failed.
struct InFlightGuard {
    actions: ActionTable,
    notification_id: String,
    settled: bool,
}

impl InFlightGuard {
    fn complete(mut self, status: ActionStatus) {
        self.settle(status);
    }

    /// Apply the confirmed local change, then release the slot
    fn complete_after(self, status: ActionStatus, apply: impl FnOnce()) {
        apply();
        self.complete(status);
    }

    fn settle(&mut self, status: ActionStatus) {
        if self.settled {
            return;
        }
        self.settled = true;

        if let Some(action) = lock(&self.actions).get_mut(&self.notification_id) {
            action.status = status;
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.settle(ActionStatus::Failed);
    }
}
