use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::domain::entities::{CredentialStore, Credentials, GuarantorResponse};
use crate::domain::errors::{NotifyError, NotifyResult};
use crate::domain::ports::notification_api::{ApiAck, NotificationApi};
use crate::infrastructure::http::truncate_body;

/// Envelope every action endpoint replies with
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// reqwest-backed [`NotificationApi`]
pub struct HttpNotificationApi {
    http_client: Client,
    config: ClientConfig,
    credentials: CredentialStore,
}

impl HttpNotificationApi {
    pub fn new(config: &ClientConfig, credentials: CredentialStore) -> NotifyResult<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            config: config.clone(),
            credentials,
        })
    }

    fn credentials(&self) -> NotifyResult<Credentials> {
        self.credentials
            .current()
            .ok_or(NotifyError::Unauthenticated)
    }

    fn authorized_post(&self, url: &str, credentials: &Credentials) -> RequestBuilder {
        self.http_client
            .post(url)
            .bearer_auth(&credentials.token)
            .header(ACCEPT, "application/json")
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn mark_as_read(&self, notification_id: &str) -> NotifyResult<ApiAck> {
        let credentials = self.credentials()?;
        let url = self.config.mark_read_url(notification_id);
        debug!(notification_id, "Marking notification as read");

        let response = self.authorized_post(&url, &credentials).send().await?;
        read_ack(response).await
    }

    async fn respond(&self, response: &GuarantorResponse) -> NotifyResult<ApiAck> {
        let credentials = self.credentials()?;
        let url = self.config.respond_url(&credentials.user_id);
        info!(
            notification_id = %response.notification_id,
            loan_id = %response.loan_id,
            decision = ?response.response,
            "Submitting guarantor response"
        );

        let reply = self
            .authorized_post(&url, &credentials)
            .json(response)
            .send()
            .await?;
        read_ack(reply).await
    }
}

/// Non-2xx and `success: false` are failures; the server message is kept
async fn read_ack(response: Response) -> NotifyResult<ApiAck> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiEnvelope>(&body)
            .ok()
            .and_then(|envelope| envelope.message)
            .unwrap_or_else(|| truncate_body(&body));
        return Err(NotifyError::Http {
            status: status.as_u16(),
            message,
        });
    }

    if body.trim().is_empty() {
        return Ok(ApiAck::default());
    }

    let envelope: ApiEnvelope = serde_json::from_str(&body)?;
    if envelope.success == Some(false) {
        return Err(NotifyError::Rejected(
            envelope
                .message
                .unwrap_or_else(|| "Request was not successful".to_string()),
        ));
    }

    Ok(ApiAck {
        message: envelope.message,
        data: envelope.data,
    })
}
