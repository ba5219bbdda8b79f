use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Not signed in")]
    Unauthenticated,
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl NotifyError {
    /// Message the server attached to a failed request, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            NotifyError::Rejected(msg) => Some(msg.as_str()),
            NotifyError::Http { message, .. } if !message.is_empty() => Some(message.as_str()),
            _ => None,
        }
    }
}

// Convert from reqwest errors
impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NotifyError::Transport(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            NotifyError::Transport(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            NotifyError::Transport(format!("Invalid response body: {}", err))
        } else {
            NotifyError::Transport(format!("Network error: {}", err))
        }
    }
}

pub type NotifyResult<T> = Result<T, NotifyError>;
