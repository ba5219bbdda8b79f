use std::env;
use std::time::Duration;

/// Fixed delay between a stream failure and the next connection attempt
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub reconnect_delay: Duration,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub otel_exporter_endpoint: Option<String>,
    pub service_name: String,
}

impl ClientConfig {
    /// Config with defaults for everything but the API base URL
    pub fn new(api_base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let api_base_url = normalize_base_url(&api_base_url.into())?;

        Ok(ClientConfig {
            api_base_url,
            reconnect_delay: Duration::from_secs(DEFAULT_RECONNECT_DELAY_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            otel_exporter_endpoint: None,
            service_name: "guarantor-notify".to_string(),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("NOTIFY_API_BASE_URL").ok_or(ConfigError::MissingApiBaseUrl)?;

        let mut config = Self::new(api_base_url)?;

        config.reconnect_delay = seconds(
            &lookup,
            "NOTIFY_RECONNECT_DELAY_SECS",
            DEFAULT_RECONNECT_DELAY_SECS,
        )?;
        config.request_timeout = seconds(
            &lookup,
            "NOTIFY_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        config.connect_timeout = seconds(
            &lookup,
            "NOTIFY_CONNECT_TIMEOUT_SECS",
            DEFAULT_CONNECT_TIMEOUT_SECS,
        )?;

        config.otel_exporter_endpoint =
            lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.trim().is_empty());

        if let Some(service_name) = lookup("SERVICE_NAME") {
            config.service_name = service_name;
        }

        Ok(config)
    }

    /// `{base}/notifications`
    pub fn stream_url(&self) -> String {
        format!("{}/notifications", self.api_base_url)
    }

    /// `{base}/notifications/{id}/read`
    pub fn mark_read_url(&self, notification_id: &str) -> String {
        format!("{}/notifications/{}/read", self.api_base_url, notification_id)
    }

    /// `{base}/users/{user_id}/notification-response`
    pub fn respond_url(&self, user_id: &str) -> String {
        format!("{}/users/{}/notification-response", self.api_base_url, user_id)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');

    let url = reqwest::Url::parse(trimmed)
        .map_err(|e| ConfigError::InvalidApiBaseUrl(format!("{}: {}", trimmed, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidApiBaseUrl(format!(
            "{}: unsupported scheme {}",
            trimmed,
            url.scheme()
        )));
    }

    Ok(trimmed.to_string())
}

fn seconds<F>(lookup: &F, key: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidDuration(key)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("NOTIFY_API_BASE_URL environment variable not set")]
    MissingApiBaseUrl,

    #[error("Invalid API base URL: {0}")]
    InvalidApiBaseUrl(String),

    #[error("{0} must be a whole number of seconds")]
    InvalidDuration(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[("NOTIFY_API_BASE_URL", "https://api.example.com/api/")]))
                .unwrap();

        assert_eq!(config.api_base_url, "https://api.example.com/api");
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.otel_exporter_endpoint, None);
        assert_eq!(config.service_name, "guarantor-notify");
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("NOTIFY_API_BASE_URL", "http://localhost:8000/api"),
            ("NOTIFY_RECONNECT_DELAY_SECS", "2"),
            ("NOTIFY_REQUEST_TIMEOUT_SECS", " 15 "),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
            ("SERVICE_NAME", "loans-client"),
        ]))
        .unwrap();

        assert_eq!(config.reconnect_delay, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(
            config.otel_exporter_endpoint.as_deref(),
            Some("http://localhost:4317")
        );
        assert_eq!(config.service_name, "loans-client");
    }

    #[test]
    fn test_missing_base_url() {
        let result = ClientConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::MissingApiBaseUrl)));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ClientConfig::new("not a url"),
            Err(ConfigError::InvalidApiBaseUrl(_))
        ));
        assert!(matches!(
            ClientConfig::new("ftp://files.example.com"),
            Err(ConfigError::InvalidApiBaseUrl(_))
        ));
    }

    #[test]
    fn test_invalid_duration() {
        let result = ClientConfig::from_lookup(lookup_from(&[
            ("NOTIFY_API_BASE_URL", "http://localhost:8000/api"),
            ("NOTIFY_RECONNECT_DELAY_SECS", "five"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidDuration("NOTIFY_RECONNECT_DELAY_SECS"))
        ));
    }

    #[test]
    fn test_endpoint_urls() {
        let config = ClientConfig::new("https://api.example.com/api").unwrap();

        assert_eq!(config.stream_url(), "https://api.example.com/api/notifications");
        assert_eq!(
            config.mark_read_url("17"),
            "https://api.example.com/api/notifications/17/read"
        );
        assert_eq!(
            config.respond_url("42"),
            "https://api.example.com/api/users/42/notification-response"
        );
    }
}
