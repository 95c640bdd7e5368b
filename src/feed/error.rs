use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp { input: String, reason: String },
    #[error("malformed message: {0}")]
    MalformedMessage(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::MalformedMessage(err.to_string())
    }
}
