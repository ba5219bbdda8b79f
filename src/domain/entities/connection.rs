use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of the notification stream connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid connection transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },
}

/// Validates if a connection state transition is allowed
pub fn validate_transition(
    from: ConnectionState,
    to: ConnectionState,
) -> Result<(), TransitionError> {
    use ConnectionState::*;

    match (from, to) {
        // Same state is always valid (no-op)
        (a, b) if a == b => Ok(()),

        // Teardown is reachable from anywhere
        (_, Closed) => Ok(()),

        (Disconnected, Connecting) => Ok(()),
        (Closed, Connecting) => Ok(()),
        (Connecting, Connected) => Ok(()),
        (Connecting, Reconnecting) => Ok(()),
        (Connected, Reconnecting) => Ok(()),
        (Reconnecting, Connecting) => Ok(()),

        _ => Err(TransitionError::InvalidTransition { from, to }),
    }
}

/// Where the user currently is in the application
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Notifications,
    LoanDetails(String),
    Other(String),
}

impl Route {
    /// Map a router path onto a route
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = trimmed.trim_end_matches('/');

        match trimmed {
            "" | "/home" | "/dashboard" => Route::Home,
            "/notifications" => Route::Notifications,
            other => match other.strip_prefix("/loans/") {
                Some(id) if !id.is_empty() && !id.contains('/') => {
                    Route::LoanDetails(id.to_string())
                }
                _ => Route::Other(path.to_string()),
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/home".to_string(),
            Route::Notifications => "/notifications".to_string(),
            Route::LoanDetails(id) => format!("/loans/{}", id),
            Route::Other(path) => path.clone(),
        }
    }

    /// Routes on which the notification stream should be live
    pub fn wants_notifications(&self) -> bool {
        matches!(self, Route::Home | Route::Notifications)
    }
}

/// Inputs that decide whether a stream connection should exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub token: Option<String>,
    pub route: Route,
}

impl SessionContext {
    pub fn new(token: Option<String>, route: Route) -> Self {
        Self { token, route }
    }

    /// Signed-out context on the home route
    pub fn signed_out() -> Self {
        Self::new(None, Route::Home)
    }

    /// The token to connect with, if the context is eligible for a stream
    pub fn stream_token(&self) -> Option<&str> {
        match self.token.as_deref() {
            Some(token) if !token.trim().is_empty() && self.route.wants_notifications() => {
                Some(token)
            }
            _ => None,
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.stream_token().is_some()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::signed_out()
    }
}
