// Errors raised at the feed boundary
use crate::application::sensor_feed::FeedSource;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Request to Firebase failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Firebase returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to decode Firebase payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Malformed event stream: {0}")]
    EventStream(String),

    #[error("Subscription to {0} was cancelled by the server")]
    Cancelled(FeedSource),

    #[error("Credentials for {0} were revoked")]
    AuthRevoked(FeedSource),

    #[error("Subscription to {0} closed")]
    Closed(FeedSource),
}

pub type FeedResult<T> = Result<T, FeedError>;
