// Display adapter - Hands dashboard state to the chart and readout surfaces
use crate::domain::baseline::ReferenceOverlay;
use crate::domain::sensor::{Channel, SensorReading};
use crate::domain::series::{SeriesBuffer, SeriesPoint};
use crate::domain::status::ConnectionStatus;
use chrono::{Local, TimeZone};
use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;

/// Locale-style time string, e.g. `3:04:05 PM`.
pub const DEFAULT_TIME_FORMAT: &str = "%-I:%M:%S %p";

/// How the chart surface should move from the old data to the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Transition {
    /// Redraw at once without animating.
    #[serde(rename = "none")]
    Immediate,
}

/// Both series of one channel's chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFrame {
    pub channel: Channel,
    pub baseline: Vec<SeriesPoint>,
    pub data: Vec<SeriesPoint>,
    pub transition: Transition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ReadoutKey {
    #[serde(rename = "distance")]
    Distance,
    #[serde(rename = "light")]
    Light,
    #[serde(rename = "sound")]
    Sound,
    #[serde(rename = "lastUpdate")]
    LastUpdate,
}

impl From<Channel> for ReadoutKey {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Distance => ReadoutKey::Distance,
            Channel::Light => ReadoutKey::Light,
            Channel::Sound => ReadoutKey::Sound,
        }
    }
}

/// The external surfaces a dashboard renders into.
pub trait DisplaySurface: Send + Sync {
    fn draw_chart(&self, frame: ChartFrame);
    fn write_text(&self, key: ReadoutKey, text: String);
    fn write_status(&self, status: ConnectionStatus);
}

/// Print a reading the way a browser would: `12` rather than `12.0`.
pub fn format_value(value: f64) -> String {
    format!("{}", value)
}

pub fn format_readout(channel: Channel, value: f64) -> String {
    format!("{} {}", format_value(value), channel.unit())
}

#[derive(Clone)]
pub struct DisplayAdapter {
    surface: Arc<dyn DisplaySurface>,
    time_format: String,
}

impl DisplayAdapter {
    pub fn new(surface: Arc<dyn DisplaySurface>, time_format: impl Into<String>) -> Self {
        Self {
            surface,
            time_format: time_format.into(),
        }
    }

    pub fn render(&self, channel: Channel, buffer: &SeriesBuffer, overlay: &ReferenceOverlay) {
        self.surface.draw_chart(ChartFrame {
            channel,
            baseline: overlay.points().to_vec(),
            data: buffer.to_vec(),
            transition: Transition::Immediate,
        });
    }

    /// Write every present field plus the time of the update.
    pub fn render_current_values(&self, timestamp: i64, reading: &SensorReading) {
        for (channel, value) in reading.values() {
            self.surface
                .write_text(channel.into(), format_readout(channel, value));
        }
        self.surface
            .write_text(ReadoutKey::LastUpdate, self.format_time(timestamp));
    }

    pub fn render_status(&self, status: ConnectionStatus) {
        self.surface.write_status(status);
    }

    fn format_time(&self, timestamp: i64) -> String {
        let Some(time) = Local.timestamp_millis_opt(timestamp).single() else {
            return String::new();
        };
        let mut text = String::new();
        if write!(text, "{}", time.format(&self.time_format)).is_err() {
            tracing::warn!("Invalid time format {:?}", self.time_format);
            text.clear();
        }
        text
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Drawn {
        Chart(ChartFrame),
        Text(ReadoutKey, String),
        Status(ConnectionStatus),
    }

    /// Surface that records every call in order.
    #[derive(Default)]
    pub(crate) struct RecordingSurface {
        pub(crate) calls: Mutex<Vec<Drawn>>,
    }

    impl RecordingSurface {
        pub(crate) fn take(&self) -> Vec<Drawn> {
            std::mem::take(&mut *self.calls.lock().unwrap())
        }
    }

    impl DisplaySurface for RecordingSurface {
        fn draw_chart(&self, frame: ChartFrame) {
            self.calls.lock().unwrap().push(Drawn::Chart(frame));
        }

        fn write_text(&self, key: ReadoutKey, text: String) {
            self.calls.lock().unwrap().push(Drawn::Text(key, text));
        }

        fn write_status(&self, status: ConnectionStatus) {
            self.calls.lock().unwrap().push(Drawn::Status(status));
        }
    }

    // 2024-07-03, the same calendar year in every time zone
    const JULY_2024: i64 = 1_720_000_000_000;

    #[test]
    fn test_format_readout() {
        assert_eq!(format_readout(Channel::Distance, 12.0), "12 cm");
        assert_eq!(format_readout(Channel::Light, 3.5), "3.5 lux");
        assert_eq!(format_readout(Channel::Sound, 41.25), "41.25 dB");
    }

    #[test]
    fn test_render_hands_over_both_series() {
        let surface = Arc::new(RecordingSurface::default());
        let adapter = DisplayAdapter::new(surface.clone(), DEFAULT_TIME_FORMAT);

        let mut buffer = SeriesBuffer::new(5);
        buffer.append(SeriesPoint::new(1, 2.0));
        buffer.append(SeriesPoint::new(3, 4.0));
        let overlay = ReferenceOverlay::for_buffer(&buffer, 25.0);
        adapter.render(Channel::Distance, &buffer, &overlay);

        assert_eq!(
            surface.take(),
            vec![Drawn::Chart(ChartFrame {
                channel: Channel::Distance,
                baseline: vec![SeriesPoint::new(1, 25.0), SeriesPoint::new(3, 25.0)],
                data: vec![SeriesPoint::new(1, 2.0), SeriesPoint::new(3, 4.0)],
                transition: Transition::Immediate,
            })]
        );
    }

    #[test]
    fn test_render_current_values_skips_absent_fields() {
        let surface = Arc::new(RecordingSurface::default());
        let adapter = DisplayAdapter::new(surface.clone(), "%Y");

        let reading = SensorReading {
            light: Some(12.0),
            ..Default::default()
        };
        adapter.render_current_values(JULY_2024, &reading);

        assert_eq!(
            surface.take(),
            vec![
                Drawn::Text(ReadoutKey::Light, "12 lux".to_string()),
                Drawn::Text(ReadoutKey::LastUpdate, "2024".to_string()),
            ]
        );
    }

    #[test]
    fn test_transition_serializes_as_none() {
        assert_eq!(
            serde_json::to_string(&Transition::Immediate).unwrap(),
            "\"none\""
        );
        assert_eq!(
            serde_json::to_string(&ReadoutKey::LastUpdate).unwrap(),
            "\"lastUpdate\""
        );
    }
}
