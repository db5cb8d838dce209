// Feed trait for sensor data access
use crate::error::FeedResult;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use std::fmt;

/// The database locations the dashboard reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedSource {
    Current,
    Normal,
    History,
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeedSource::Current => "current",
            FeedSource::Normal => "normal",
            FeedSource::History => "history",
        };
        f.write_str(name)
    }
}

/// Full snapshots of one location; `None` means the location holds no data.
pub type SnapshotStream = BoxStream<'static, FeedResult<Option<Value>>>;

#[async_trait]
pub trait SensorFeed: Send + Sync {
    /// Read the most recent `limit` history records, oldest first, keyed by
    /// their record id.
    async fn fetch_history(&self, limit: usize) -> FeedResult<Vec<(String, Value)>>;

    /// Subscribe to a location and receive its full value after every change
    async fn subscribe(&self, source: FeedSource) -> FeedResult<SnapshotStream>;
}
