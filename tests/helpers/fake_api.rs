use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use guarantor_notify::domain::entities::GuarantorResponse;
use guarantor_notify::domain::errors::{NotifyError, NotifyResult};
use guarantor_notify::domain::ports::notification_api::{ApiAck, NotificationApi};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    MarkAsRead(String),
    Respond(GuarantorResponse),
}

/// In-memory action endpoint.
///
/// When gated, every call waits for a permit from [`FakeApi::release`] so
/// tests can observe the in-flight window.
pub struct FakeApi {
    calls: Mutex<Vec<ApiCall>>,
    gate: Option<Semaphore>,
    failure: Mutex<Option<(u16, String)>>,
    ack_message: Mutex<Option<String>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(None))
    }

    pub fn gated() -> Arc<Self> {
        Arc::new(Self::build(Some(Semaphore::new(0))))
    }

    fn build(gate: Option<Semaphore>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            gate,
            failure: Mutex::new(None),
            ack_message: Mutex::new(None),
        }
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    /// Make every following call fail with this status and server message
    pub fn fail_with(&self, status: u16, message: &str) {
        *self.failure.lock().unwrap() = Some((status, message.to_string()));
    }

    pub fn succeed(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn ack_with(&self, message: &str) {
        *self.ack_message.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn respond_calls(&self) -> Vec<GuarantorResponse> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::Respond(body) => Some(body),
                ApiCall::MarkAsRead(_) => None,
            })
            .collect()
    }

    pub fn mark_read_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::MarkAsRead(id) => Some(id),
                ApiCall::Respond(_) => None,
            })
            .collect()
    }

    async fn complete(&self, call: ApiCall) -> NotifyResult<ApiAck> {
        self.calls.lock().unwrap().push(call);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        if let Some((status, message)) = self.failure.lock().unwrap().clone() {
            return Err(NotifyError::Http { status, message });
        }

        Ok(ApiAck {
            message: self.ack_message.lock().unwrap().clone(),
            data: None,
        })
    }
}

#[async_trait]
impl NotificationApi for FakeApi {
    async fn mark_as_read(&self, notification_id: &str) -> NotifyResult<ApiAck> {
        self.complete(ApiCall::MarkAsRead(notification_id.to_string()))
            .await
    }

    async fn respond(&self, response: &GuarantorResponse) -> NotifyResult<ApiAck> {
        self.complete(ApiCall::Respond(response.clone())).await
    }
}
