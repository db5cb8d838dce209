// Normal values and the reference overlay derived from them
use super::sensor::{Channel, SensorReading};
use super::series::{SeriesBuffer, SeriesPoint};
use serde::{Deserialize, Serialize};

/// Baseline value per channel, drawn as a flat reference line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalValues {
    pub distance: f64,
    pub light: f64,
    pub sound: f64,
}

impl Default for NormalValues {
    fn default() -> Self {
        Self {
            distance: 25.0,
            light: 32.0,
            sound: 35.0,
        }
    }
}

impl NormalValues {
    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Distance => self.distance,
            Channel::Light => self.light,
            Channel::Sound => self.sound,
        }
    }
}

/// Baseline updates arrive in the same shape as readings.
pub type BaselineUpdate = SensorReading;

/// Either empty or exactly two points sharing the same value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReferenceOverlay(Vec<SeriesPoint>);

impl ReferenceOverlay {
    /// Span the buffer's time range at `normal`.
    pub fn for_buffer(buffer: &SeriesBuffer, normal: f64) -> Self {
        match (buffer.first(), buffer.last()) {
            (Some(first), Some(last)) => Self(vec![
                SeriesPoint::new(first.time_ms, normal),
                SeriesPoint::new(last.time_ms, normal),
            ]),
            _ => Self::default(),
        }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.0
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
