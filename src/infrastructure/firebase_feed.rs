// Firebase Realtime Database feed over the REST streaming API
use crate::application::sensor_feed::{FeedSource, SensorFeed, SnapshotStream};
use crate::error::{FeedError, FeedResult};
use crate::infrastructure::config::FirebaseSettings;
use crate::infrastructure::event_stream::{EventStreamDecoder, ServerEvent};
use crate::infrastructure::snapshot_tree::{PathUpdate, SnapshotTree};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct FirebaseFeed {
    client: reqwest::Client,
    database_url: String,
    auth_token: Option<String>,
    current_path: String,
    normal_path: String,
    history_path: String,
}

impl FirebaseFeed {
    pub fn new(settings: FirebaseSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            database_url: settings.database_url.trim_end_matches('/').to_string(),
            auth_token: settings.auth_token,
            current_path: settings.current_path,
            normal_path: settings.normal_path,
            history_path: settings.history_path,
        }
    }

    fn path(&self, source: FeedSource) -> &str {
        match source {
            FeedSource::Current => &self.current_path,
            FeedSource::Normal => &self.normal_path,
            FeedSource::History => &self.history_path,
        }
    }

    /// `{database_url}/{path}.json?{params}` with the auth token appended.
    fn build_url(&self, source: FeedSource, params: &[(&str, String)]) -> String {
        let mut query: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();
        if let Some(token) = &self.auth_token {
            query.push(format!("auth={}", urlencoding::encode(token)));
        }

        let mut url = format!(
            "{}/{}.json",
            self.database_url,
            self.path(source).trim_matches('/')
        );
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    async fn check(response: reqwest::Response) -> FeedResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(FeedError::Status { status, body })
    }
}

/// Order history records by key; push keys sort chronologically.
fn history_records(value: Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(records) => {
            let mut records: Vec<(String, Value)> = records.into_iter().collect();
            records.sort_by(|a, b| a.0.cmp(&b.0));
            records
        }
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}

/// Apply one server event to `tree`.
///
/// Returns `Ok(true)` when the snapshot changed and should be emitted.
fn apply_event(source: FeedSource, tree: &mut SnapshotTree, event: &ServerEvent) -> FeedResult<bool> {
    match event.event.as_str() {
        "put" => {
            let update: PathUpdate = serde_json::from_str(&event.data)?;
            tree.put(&update.path, update.data);
            Ok(true)
        }
        "patch" => {
            let update: PathUpdate = serde_json::from_str(&event.data)?;
            tree.patch(&update.path, update.data);
            Ok(true)
        }
        "keep-alive" => Ok(false),
        "cancel" => Err(FeedError::Cancelled(source)),
        "auth_revoked" => Err(FeedError::AuthRevoked(source)),
        other => Err(FeedError::EventStream(format!("unexpected event {:?}", other))),
    }
}

#[async_trait]
impl SensorFeed for FirebaseFeed {
    async fn fetch_history(&self, limit: usize) -> FeedResult<Vec<(String, Value)>> {
        let url = self.build_url(
            FeedSource::History,
            &[
                ("orderBy", "\"$key\"".to_string()),
                ("limitToLast", limit.to_string()),
            ],
        );
        tracing::debug!("Fetching history from {}", self.path(FeedSource::History));

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;
        let value: Value = Self::check(response).await?.json().await?;
        Ok(history_records(value))
    }

    async fn subscribe(&self, source: FeedSource) -> FeedResult<SnapshotStream> {
        let url = self.build_url(source, &[]);
        tracing::debug!("Subscribing to {}", self.path(source));

        let response = self
            .client
            .get(&url)
            .header("Accept", "text/event-stream")
            .send()
            .await?;
        let mut body = Self::check(response).await?.bytes_stream();

        let stream = async_stream::stream! {
            let mut decoder = EventStreamDecoder::new();
            let mut tree = SnapshotTree::new();

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(FeedError::Http(e));
                        return;
                    }
                };

                for event in decoder.push(&chunk) {
                    match apply_event(source, &mut tree, &event) {
                        Ok(true) => yield Ok(tree.snapshot()),
                        Ok(false) => {}
                        Err(e) => {
                            let fatal = matches!(e, FeedError::Cancelled(_) | FeedError::AuthRevoked(_));
                            yield Err(e);
                            if fatal {
                                return;
                            }
                        }
                    }
                }
            }
        };

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feed(token: Option<&str>) -> FirebaseFeed {
        FirebaseFeed::new(FirebaseSettings {
            database_url: "https://demo.firebaseio.com/".to_string(),
            auth_token: token.map(str::to_string),
            current_path: "sensor/current".to_string(),
            normal_path: "/sensor/normal/".to_string(),
            history_path: "sensor/history".to_string(),
        })
    }

    fn event(name: &str, data: &str) -> ServerEvent {
        ServerEvent {
            event: name.to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_build_url() {
        let plain = feed(None);
        assert_eq!(
            plain.build_url(FeedSource::Normal, &[]),
            "https://demo.firebaseio.com/sensor/normal.json"
        );
        assert_eq!(
            plain.build_url(
                FeedSource::History,
                &[("orderBy", "\"$key\"".to_string()), ("limitToLast", "3600".to_string())]
            ),
            "https://demo.firebaseio.com/sensor/history.json?orderBy=%22%24key%22&limitToLast=3600"
        );

        let authed = feed(Some("s3cr3t/+"));
        assert_eq!(
            authed.build_url(FeedSource::Current, &[]),
            "https://demo.firebaseio.com/sensor/current.json?auth=s3cr3t%2F%2B"
        );
    }

    #[test]
    fn test_history_records_sorted_by_key() {
        let records = history_records(json!({
            "-Nb": {"dist": 2},
            "-Na": {"dist": 1},
        }));
        let keys: Vec<&str> = records.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["-Na", "-Nb"]);

        assert!(history_records(Value::Null).is_empty());
        assert_eq!(history_records(json!([null, {"dist": 1}])).len(), 1);
    }

    #[test]
    fn test_apply_events() {
        let mut tree = SnapshotTree::new();
        let source = FeedSource::Current;

        assert!(apply_event(source, &mut tree, &event("put", r#"{"path":"/","data":{"dist":5}}"#)).unwrap());
        assert!(apply_event(source, &mut tree, &event("patch", r#"{"path":"/","data":{"light":7}}"#)).unwrap());
        assert_eq!(tree.snapshot(), Some(json!({"dist": 5, "light": 7})));

        assert!(!apply_event(source, &mut tree, &event("keep-alive", "null")).unwrap());
        assert!(matches!(
            apply_event(source, &mut tree, &event("cancel", "null")),
            Err(FeedError::Cancelled(FeedSource::Current))
        ));
        assert!(matches!(
            apply_event(source, &mut tree, &event("auth_revoked", "null")),
            Err(FeedError::AuthRevoked(_))
        ));
        assert!(matches!(
            apply_event(source, &mut tree, &event("put", "not json")),
            Err(FeedError::Decode(_))
        ));
    }
}
