// Dispatcher - Sole owner of dashboard state, applies feed events in order
use crate::application::display::DisplayAdapter;
use crate::application::feed_listener::FeedEvent;
use crate::application::sensor_feed::FeedSource;
use crate::domain::dashboard::DashboardState;
use crate::domain::sensor::Channel;
use crate::domain::status::ConnectionStatus;
use tokio::sync::mpsc;

pub struct Dispatcher {
    state: DashboardState,
    display: DisplayAdapter,
    /// Open once history is loaded or known to be missing. Live points
    /// arriving before that are not charted, so the bulk load cannot
    /// replace them.
    history_settled: bool,
}

impl Dispatcher {
    pub fn new(state: DashboardState, display: DisplayAdapter) -> Self {
        let dispatcher = Self {
            state,
            display,
            history_settled: false,
        };
        dispatcher.display.render_status(ConnectionStatus::Connecting);
        dispatcher.render(&Channel::ALL);
        dispatcher
    }

    #[cfg(test)]
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Handle events until every sender is dropped.
    pub async fn run(mut self, mut rx: mpsc::Receiver<FeedEvent>) -> DashboardState {
        while let Some(event) = rx.recv().await {
            self.handle(event);
        }
        tracing::info!("Feed channel closed, dispatcher stopping");
        self.state
    }

    pub fn handle(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::BulkLoaded(points) => {
                let count = points.len();
                let changed = self.state.load_bulk(points);
                self.render(&changed);
                self.history_settled = true;
                tracing::info!("Loaded {} historical points", count);
            }
            FeedEvent::HistoryUnavailable(reason) => {
                tracing::warn!("Continuing without history: {}", reason);
                self.history_settled = true;
            }
            FeedEvent::PointAppended {
                reading: None,
                ..
            } => {
                self.display.render_status(ConnectionStatus::Disconnected);
            }
            FeedEvent::PointAppended {
                timestamp,
                reading: Some(reading),
            } => {
                self.display.render_status(ConnectionStatus::Connected);
                self.display.render_current_values(timestamp, &reading);

                if self.history_settled {
                    let changed = self.state.append(timestamp, &reading);
                    self.render(&changed);
                } else {
                    tracing::debug!("History still loading, not charting point at {}", timestamp);
                }
            }
            FeedEvent::BaselineChanged(update) => {
                tracing::info!("Updating normal values: {:?}", update);
                let changed = self.state.set_normal_values(&update);
                self.render(&changed);
            }
            FeedEvent::FeedError { source, message } => {
                if source == FeedSource::Current {
                    self.display.render_status(ConnectionStatus::Error);
                } else {
                    tracing::warn!("Error on {} feed: {}", source, message);
                }
            }
        }
    }

    fn render(&self, channels: &[Channel]) {
        for channel in channels {
            let state = self.state.channel(*channel);
            self.display.render(*channel, &state.buffer, &state.overlay);
        }
    }
}
