// Sensor domain models
use serde::{Deserialize, Serialize};

/// One sensor quantity shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Distance,
    Light,
    Sound,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Distance, Channel::Light, Channel::Sound];

    /// Stable key used by the readout surface and the chart view.
    pub fn key(self) -> &'static str {
        match self {
            Channel::Distance => "distance",
            Channel::Light => "light",
            Channel::Sound => "sound",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Channel::Distance => "cm",
            Channel::Light => "lux",
            Channel::Sound => "dB",
        }
    }

    fn index(self) -> usize {
        match self {
            Channel::Distance => 0,
            Channel::Light => 1,
            Channel::Sound => 2,
        }
    }
}

/// Fixed-size table holding one value per channel.
#[derive(Debug, Clone)]
pub struct PerChannel<T>([T; 3]);

impl<T> PerChannel<T> {
    pub fn from_fn(mut f: impl FnMut(Channel) -> T) -> Self {
        Self(Channel::ALL.map(&mut f))
    }

    pub fn get(&self, channel: Channel) -> &T {
        &self.0[channel.index()]
    }

    pub fn get_mut(&mut self, channel: Channel) -> &mut T {
        &mut self.0[channel.index()]
    }
}

/// A partial reading as stored in the database: any field may be missing.
///
/// The device writes distance under `dist`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(rename = "dist", alias = "distance", default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<f64>,
}

impl SensorReading {
    pub fn value(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Distance => self.distance,
            Channel::Light => self.light,
            Channel::Sound => self.sound,
        }
    }

    pub fn is_empty(&self) -> bool {
        Channel::ALL.iter().all(|c| self.value(*c).is_none())
    }

    /// Present fields in channel order.
    pub fn values(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        Channel::ALL
            .into_iter()
            .filter_map(move |c| self.value(c).map(|v| (c, v)))
    }
}

/// A reading with the time it was taken, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorPoint {
    pub timestamp: i64,
    pub reading: SensorReading,
}

impl SensorPoint {
    pub fn new(timestamp: i64, reading: SensorReading) -> Self {
        Self { timestamp, reading }
    }
}
