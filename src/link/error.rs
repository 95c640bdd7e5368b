use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("link already running")]
    AlreadyRunning,
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),
    #[error("stream error: {0}")]
    Stream(String),
    #[error("connection closed by producer")]
    Closed,
    #[error("gave up after {0} attempts")]
    RetriesExhausted(u32),
    #[error("link worker failed: {0}")]
    Worker(String),
}

impl LinkError {
    /// True when the socket never came up, as opposed to a live connection
    /// that dropped.
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, LinkError::Connect(_) | LinkError::ConnectTimeout(_))
    }
}
