use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::entities::pending_action::GuarantorResponse;
use crate::domain::errors::NotifyResult;

/// Successful reply from an action endpoint
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiAck {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Remote authority for notification actions
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// `POST /notifications/{id}/read`
    async fn mark_as_read(&self, notification_id: &str) -> NotifyResult<ApiAck>;

    /// `POST /users/{user_id}/notification-response`
    async fn respond(&self, response: &GuarantorResponse) -> NotifyResult<ApiAck>;
}
