use std::sync::Arc;

use crate::config::ClientConfig;
use crate::domain::entities::{CredentialStore, Credentials, Route, SessionContext};
use crate::domain::errors::NotifyResult;
use crate::domain::ports::notification_api::NotificationApi;
use crate::domain::ports::notification_stream::StreamConnector;
use crate::domain::ports::time_service::TimeService;
use crate::domain::ports::view_binding::ViewBinding;
use crate::infrastructure::http::{HttpNotificationApi, HttpStreamConnector};
use crate::infrastructure::runtime::TokioTimeService;
use crate::services::action_reconciler::ActionReconciler;
use crate::services::connection_manager::ConnectionManager;
use crate::services::notification_store::NotificationStore;

/// Application-root owner of the notification subsystem.
///
/// Build once when the app mounts, feed it sign-in and navigation changes,
/// and call [`NotificationCenter::shutdown`] on unmount.
pub struct NotificationCenter {
    store: NotificationStore,
    connection: ConnectionManager,
    reconciler: ActionReconciler,
    credentials: CredentialStore,
}

impl NotificationCenter {
    /// Wire the HTTP stream and action adapters from config
    pub fn new(config: &ClientConfig, view: Arc<dyn ViewBinding>) -> NotifyResult<Self> {
        let credentials = CredentialStore::new();

        let connector: Arc<dyn StreamConnector> = Arc::new(HttpStreamConnector::new(config)?);
        let api: Arc<dyn NotificationApi> =
            Arc::new(HttpNotificationApi::new(config, credentials.clone())?);
        let time_service: Arc<dyn TimeService> = Arc::new(TokioTimeService::new());

        tracing::info!(api = %config.api_base_url, "Notification center initialized");

        Ok(Self::with_adapters(
            config,
            connector,
            api,
            view,
            time_service,
            credentials,
        ))
    }

    pub fn with_adapters(
        config: &ClientConfig,
        connector: Arc<dyn StreamConnector>,
        api: Arc<dyn NotificationApi>,
        view: Arc<dyn ViewBinding>,
        time_service: Arc<dyn TimeService>,
        credentials: CredentialStore,
    ) -> Self {
        let store = NotificationStore::new();
        let connection = ConnectionManager::new(
            connector,
            store.clone(),
            time_service,
            config.reconnect_delay,
        );
        let reconciler = ActionReconciler::new(api, store.clone(), view);

        Self {
            store,
            connection,
            reconciler,
            credentials,
        }
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn reconciler(&self) -> &ActionReconciler {
        &self.reconciler
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Apply the initial session, e.g. a token restored from storage
    pub async fn start(&self, credentials: Option<Credentials>, route: Route) {
        let token = credentials.as_ref().map(|c| c.token.clone());
        match credentials {
            Some(credentials) => self.credentials.set(credentials),
            None => self.credentials.clear(),
        }

        self.connection
            .update_session(SessionContext::new(token, route))
            .await;
    }

    pub async fn sign_in(&self, credentials: Credentials) {
        tracing::info!(user_id = %credentials.user_id, "Signed in, enabling notifications");
        let token = credentials.token.clone();
        self.credentials.set(credentials);
        self.connection.set_token(Some(token)).await;
    }

    pub async fn sign_out(&self) {
        tracing::info!("Signed out, disabling notifications");
        self.credentials.clear();
        self.connection.set_token(None).await;
    }

    pub async fn navigate(&self, route: Route) {
        self.connection.set_route(route).await;
    }

    /// Tear down the stream; no reconnect fires after this returns
    pub async fn shutdown(&self) {
        self.connection.stop().await;
        tracing::info!("Notification center shut down");
    }
}
