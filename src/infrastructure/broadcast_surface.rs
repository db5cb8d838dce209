// Display surface that serves HTTP clients: latest view plus live updates
use crate::application::display::{ChartFrame, DisplaySurface, ReadoutKey};
use crate::domain::decimation::lttb;
use crate::domain::sensor::Channel;
use crate::domain::series::SeriesPoint;
use crate::domain::status::ConnectionStatus;
use crate::infrastructure::config::ChartConfig;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::{broadcast, watch};

const UPDATE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub channel: Channel,
    pub label: String,
    pub unit: &'static str,
    pub color: Option<String>,
    pub baseline_color: Option<String>,
    pub baseline: Vec<SeriesPoint>,
    pub data: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusView {
    pub state: ConnectionStatus,
    pub text: &'static str,
    pub class: &'static str,
}

impl From<ConnectionStatus> for StatusView {
    fn from(state: ConnectionStatus) -> Self {
        Self {
            state,
            text: state.text(),
            class: state.class(),
        }
    }
}

/// Everything a freshly connected client needs to draw the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub charts: Vec<ChartView>,
    pub readouts: BTreeMap<ReadoutKey, String>,
    pub status: StatusView,
}

impl DashboardView {
    fn new(charts: &[ChartConfig]) -> Self {
        let charts = Channel::ALL
            .into_iter()
            .map(|channel| {
                let config = charts.iter().find(|c| c.channel == channel);
                ChartView {
                    channel,
                    label: config
                        .map(|c| c.label.clone())
                        .unwrap_or_else(|| channel.key().to_string()),
                    unit: channel.unit(),
                    color: config.and_then(|c| c.color.clone()),
                    baseline_color: config.and_then(|c| c.baseline_color.clone()),
                    baseline: Vec::new(),
                    data: Vec::new(),
                }
            })
            .collect();

        Self {
            charts,
            readouts: BTreeMap::new(),
            status: ConnectionStatus::Connecting.into(),
        }
    }

    /// Downsample every data series to at most `samples` points.
    pub fn decimated(mut self, samples: usize) -> Self {
        if samples > 0 {
            for chart in &mut self.charts {
                chart.data = lttb(&chart.data, samples);
            }
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayUpdate {
    Chart(ChartFrame),
    Readout { key: ReadoutKey, text: String },
    Status(StatusView),
}

pub struct BroadcastSurface {
    view: watch::Sender<DashboardView>,
    updates: broadcast::Sender<DisplayUpdate>,
}

impl BroadcastSurface {
    pub fn new(charts: &[ChartConfig]) -> Self {
        let (view, _) = watch::channel(DashboardView::new(charts));
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Self { view, updates }
    }

    pub fn view(&self) -> DashboardView {
        self.view.borrow().clone()
    }

    /// Subscribe before taking the snapshot so no update falls in between.
    pub fn subscribe(&self) -> (DashboardView, broadcast::Receiver<DisplayUpdate>) {
        let rx = self.updates.subscribe();
        (self.view(), rx)
    }

    fn publish(&self, update: DisplayUpdate) {
        // No receivers just means no client is connected
        let _ = self.updates.send(update);
    }
}

impl DisplaySurface for BroadcastSurface {
    fn draw_chart(&self, frame: ChartFrame) {
        self.view.send_modify(|view| {
            if let Some(chart) = view.charts.iter_mut().find(|c| c.channel == frame.channel) {
                chart.baseline = frame.baseline.clone();
                chart.data = frame.data.clone();
            }
        });
        self.publish(DisplayUpdate::Chart(frame));
    }

    fn write_text(&self, key: ReadoutKey, text: String) {
        self.view.send_modify(|view| {
            view.readouts.insert(key, text.clone());
        });
        self.publish(DisplayUpdate::Readout { key, text });
    }

    fn write_status(&self, status: ConnectionStatus) {
        self.view.send_modify(|view| view.status = status.into());
        self.publish(DisplayUpdate::Status(status.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::display::Transition;
    use crate::infrastructure::config::default_charts;

    #[test]
    fn test_view_starts_empty_with_chart_metadata() {
        let surface = BroadcastSurface::new(&default_charts());
        let view = surface.view();
        assert_eq!(view.charts.len(), 3);
        assert_eq!(view.charts[0].label, "Distance (cm)");
        assert_eq!(view.charts[2].unit, "dB");
        assert_eq!(view.status.state, ConnectionStatus::Connecting);
        assert!(view.readouts.is_empty());
    }

    #[test]
    fn test_missing_chart_config_falls_back_to_key() {
        let surface = BroadcastSurface::new(&[]);
        assert_eq!(surface.view().charts[1].label, "light");
        assert_eq!(surface.view().charts[1].color, None);
    }

    #[tokio::test]
    async fn test_updates_reach_view_and_subscribers() {
        let surface = BroadcastSurface::new(&default_charts());
        let (_, mut rx) = surface.subscribe();

        let frame = ChartFrame {
            channel: Channel::Sound,
            baseline: vec![SeriesPoint::new(1, 35.0), SeriesPoint::new(2, 35.0)],
            data: vec![SeriesPoint::new(1, 40.0), SeriesPoint::new(2, 41.0)],
            transition: Transition::Immediate,
        };
        surface.draw_chart(frame.clone());
        surface.write_text(ReadoutKey::Sound, "41 dB".to_string());
        surface.write_status(ConnectionStatus::Connected);

        let view = surface.view();
        assert_eq!(view.charts[2].data, frame.data);
        assert_eq!(view.readouts.get(&ReadoutKey::Sound).map(String::as_str), Some("41 dB"));
        assert_eq!(view.status.class, "status connected");

        assert_eq!(rx.recv().await.unwrap(), DisplayUpdate::Chart(frame));
        assert_eq!(
            rx.recv().await.unwrap(),
            DisplayUpdate::Readout {
                key: ReadoutKey::Sound,
                text: "41 dB".to_string()
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            DisplayUpdate::Status(ConnectionStatus::Connected.into())
        );
    }

    #[test]
    fn test_update_serialization() {
        let json = serde_json::to_value(DisplayUpdate::Readout {
            key: ReadoutKey::LastUpdate,
            text: "3:04:05 PM".to_string(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "readout", "key": "lastUpdate", "text": "3:04:05 PM"})
        );
    }

    #[test]
    fn test_decimated_view() {
        let surface = BroadcastSurface::new(&default_charts());
        surface.draw_chart(ChartFrame {
            channel: Channel::Light,
            baseline: Vec::new(),
            data: (0..100).map(|t| SeriesPoint::new(t, t as f64)).collect(),
            transition: Transition::Immediate,
        });
        assert_eq!(surface.view().decimated(10).charts[1].data.len(), 10);
        assert_eq!(surface.view().decimated(0).charts[1].data.len(), 100);
    }
}
