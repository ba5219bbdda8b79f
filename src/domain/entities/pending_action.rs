use serde::{Deserialize, Serialize};

/// User action that can be reconciled against the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Accept,
    Decline,
    MarkAsRead,
    ViewDetails,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Accept => "accept",
            ActionKind::Decline => "decline",
            ActionKind::MarkAsRead => "mark_as_read",
            ActionKind::ViewDetails => "view_details",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    InFlight,
    Done,
    Failed,
}

/// Most recent action issued against a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub notification_id: String,
    pub kind: ActionKind,
    pub status: ActionStatus,
}

impl PendingAction {
    pub fn in_flight(notification_id: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            notification_id: notification_id.into(),
            kind,
            status: ActionStatus::InFlight,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.status == ActionStatus::InFlight
    }
}

/// Result of asking the reconciler to perform an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The server confirmed the action and local state was updated
    Applied,
    /// The action was dropped before reaching the server
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Another action for the same notification has not resolved yet
    InFlight,
    AlreadyRead,
    /// Wrong notification kind, or no loan attached
    NotActionable,
}

/// Decision sent to the respond endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuarantorDecision {
    Accepted,
    Declined,
}

impl From<GuarantorDecision> for ActionKind {
    fn from(decision: GuarantorDecision) -> Self {
        match decision {
            GuarantorDecision::Accepted => ActionKind::Accept,
            GuarantorDecision::Declined => ActionKind::Decline,
        }
    }
}

/// Body of `POST /users/{user_id}/notification-response`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuarantorResponse {
    pub response: GuarantorDecision,
    pub reason: String,
    pub loan_id: String,
    pub notification_id: String,
}
