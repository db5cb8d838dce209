// Feed listener - Turns database reads and subscriptions into dashboard events
use crate::application::sensor_feed::{FeedSource, SensorFeed};
use crate::domain::baseline::BaselineUpdate;
use crate::domain::sensor::{SensorPoint, SensorReading};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Assumed spacing between history records that carry no timestamp.
pub const HISTORY_SPACING_MS: i64 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    BulkLoaded(Vec<SensorPoint>),
    HistoryUnavailable(String),
    /// Latest current-value snapshot, stamped when it was received.
    PointAppended {
        timestamp: i64,
        reading: Option<SensorReading>,
    },
    BaselineChanged(BaselineUpdate),
    FeedError {
        source: FeedSource,
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct HistoryRecord {
    /// Stored timestamps may have been written as floats.
    #[serde(default)]
    timestamp: Option<f64>,
    #[serde(flatten)]
    reading: SensorReading,
}

/// Convert ordered history records into timed points.
///
/// Records without a stored timestamp are placed one second apart, counted
/// back from `now_ms`. This is an approximation: the device does not
/// guarantee that spacing.
pub fn history_points(records: Vec<(String, Value)>, now_ms: i64) -> Vec<SensorPoint> {
    let total = records.len() as i64;
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, (key, value))| {
            match serde_json::from_value::<HistoryRecord>(value) {
                Ok(record) => {
                    let timestamp = record
                        .timestamp
                        .filter(|t| t.is_finite())
                        .map(|t| t as i64)
                        .unwrap_or(now_ms - (total - index as i64) * HISTORY_SPACING_MS);
                    Some(SensorPoint::new(timestamp, record.reading))
                }
                Err(e) => {
                    tracing::warn!("Skipping history record {}: {}", key, e);
                    None
                }
            }
        })
        .collect()
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct FeedListener {
    feed: Arc<dyn SensorFeed>,
    history_limit: usize,
    tx: mpsc::Sender<FeedEvent>,
}

impl FeedListener {
    pub fn new(feed: Arc<dyn SensorFeed>, history_limit: usize, tx: mpsc::Sender<FeedEvent>) -> Self {
        Self {
            feed,
            history_limit,
            tx,
        }
    }

    /// Start the history load and both subscriptions as independent tasks.
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        let history = tokio::spawn(load_history(
            self.feed.clone(),
            self.history_limit,
            self.tx.clone(),
        ));
        let normal = tokio::spawn(listen(self.feed.clone(), FeedSource::Normal, self.tx.clone()));
        let current = tokio::spawn(listen(self.feed, FeedSource::Current, self.tx));
        vec![history, normal, current]
    }
}

async fn load_history(feed: Arc<dyn SensorFeed>, limit: usize, tx: mpsc::Sender<FeedEvent>) {
    tracing::info!("Loading historical data (last {} records)", limit);
    let event = match feed.fetch_history(limit).await {
        Ok(records) if records.is_empty() => {
            tracing::info!("No historical data available");
            FeedEvent::BulkLoaded(Vec::new())
        }
        Ok(records) => {
            let count = records.len();
            let points = history_points(records, now_ms());
            tracing::info!("Historical data loaded: {} of {} records usable", points.len(), count);
            FeedEvent::BulkLoaded(points)
        }
        Err(e) => {
            tracing::error!("Error loading historical data: {}", e);
            FeedEvent::HistoryUnavailable(e.to_string())
        }
    };
    let _ = tx.send(event).await;
}

async fn listen(feed: Arc<dyn SensorFeed>, source: FeedSource, tx: mpsc::Sender<FeedEvent>) {
    tracing::info!("Setting up {} listener", source);
    let mut stream = match feed.subscribe(source).await {
        Ok(stream) => stream,
        Err(e) => {
            let _ = tx.send(feed_error(source, e.to_string())).await;
            return;
        }
    };

    while let Some(item) = stream.next().await {
        let event = match item {
            Ok(snapshot) => match snapshot_event(source, snapshot) {
                Some(event) => event,
                None => continue,
            },
            Err(e) => feed_error(source, e.to_string()),
        };
        if tx.send(event).await.is_err() {
            tracing::debug!("Dispatcher gone, stopping {} listener", source);
            return;
        }
    }

    let _ = tx
        .send(feed_error(source, crate::error::FeedError::Closed(source).to_string()))
        .await;
}

fn feed_error(source: FeedSource, message: String) -> FeedEvent {
    tracing::error!("Firebase error on {}: {}", source, message);
    FeedEvent::FeedError { source, message }
}

/// Map a snapshot of `source` to the event the dispatcher expects.
fn snapshot_event(source: FeedSource, snapshot: Option<Value>) -> Option<FeedEvent> {
    match source {
        FeedSource::Current => {
            let reading = snapshot.map(|value| {
                serde_json::from_value::<SensorReading>(value).unwrap_or_else(|e| {
                    tracing::warn!("Current value is not a sensor reading: {}", e);
                    SensorReading::default()
                })
            });
            Some(FeedEvent::PointAppended {
                timestamp: now_ms(),
                reading,
            })
        }
        FeedSource::Normal => {
            let value = snapshot?;
            match serde_json::from_value::<BaselineUpdate>(value) {
                Ok(update) if !update.is_empty() => Some(FeedEvent::BaselineChanged(update)),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("Ignoring malformed normal values: {}", e);
                    None
                }
            }
        }
        FeedSource::History => None,
    }
}
