pub mod api_client;
pub mod sse;
pub mod stream_connector;

pub use api_client::HttpNotificationApi;
pub use sse::{SseDecoder, SseError};
pub use stream_connector::{sse_channel, HttpStreamConnector};

const MAX_ERROR_BODY_CHARS: usize = 500;

/// Cap a response body before it ends up in an error message
pub(crate) fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() > MAX_ERROR_BODY_CHARS {
        let head: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}...", head)
    } else {
        body.to_string()
    }
}
