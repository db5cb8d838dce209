// Dashboard domain model
use super::baseline::{BaselineUpdate, NormalValues, ReferenceOverlay};
use super::sensor::{Channel, PerChannel, SensorPoint, SensorReading};
use super::series::{SeriesBuffer, SeriesPoint};

/// Buffer, baseline and overlay for one channel.
#[derive(Debug, Clone)]
pub struct ChannelState {
    pub buffer: SeriesBuffer,
    pub normal: f64,
    pub overlay: ReferenceOverlay,
}

impl ChannelState {
    fn new(capacity: usize, normal: f64) -> Self {
        Self {
            buffer: SeriesBuffer::new(capacity),
            normal,
            overlay: ReferenceOverlay::default(),
        }
    }

    fn recompute(&mut self) -> &ReferenceOverlay {
        self.overlay = ReferenceOverlay::for_buffer(&self.buffer, self.normal);
        &self.overlay
    }
}

/// Everything the dashboard shows, owned by a single dispatcher.
#[derive(Debug, Clone)]
pub struct DashboardState {
    channels: PerChannel<ChannelState>,
}

impl DashboardState {
    pub fn new(max_points: usize, normal: NormalValues) -> Self {
        Self {
            channels: PerChannel::from_fn(|c| ChannelState::new(max_points, normal.get(c))),
        }
    }

    pub fn channel(&self, channel: Channel) -> &ChannelState {
        self.channels.get(channel)
    }

    #[cfg(test)]
    pub fn normal_values(&self) -> NormalValues {
        NormalValues {
            distance: self.channel(Channel::Distance).normal,
            light: self.channel(Channel::Light).normal,
            sound: self.channel(Channel::Sound).normal,
        }
    }

    /// Replace every channel's buffer with historical points.
    ///
    /// Points are sorted by timestamp and only the most recent `max_points`
    /// are considered before splitting them by channel. Empty input leaves
    /// the state untouched and returns no channels.
    pub fn load_bulk(&mut self, mut points: Vec<SensorPoint>) -> Vec<Channel> {
        if points.is_empty() {
            return Vec::new();
        }

        points.sort_by_key(|p| p.timestamp);
        let capacity = self.channel(Channel::Distance).buffer.capacity();
        let recent = &points[points.len().saturating_sub(capacity)..];

        for channel in Channel::ALL {
            let series: Vec<SeriesPoint> = recent
                .iter()
                .filter_map(|p| {
                    p.reading
                        .value(channel)
                        .map(|v| SeriesPoint::new(p.timestamp, v))
                })
                .collect();
            self.channels.get_mut(channel).buffer.replace(series);
            self.recompute(channel);
        }

        Channel::ALL.to_vec()
    }

    /// Append a live reading to every channel it carries a value for.
    pub fn append(&mut self, timestamp: i64, reading: &SensorReading) -> Vec<Channel> {
        let mut changed = Vec::new();
        for (channel, value) in reading.values() {
            let evicted = self
                .channels
                .get_mut(channel)
                .buffer
                .append(SeriesPoint::new(timestamp, value));
            if let Some(evicted) = evicted {
                tracing::trace!("Evicted {} point at {}", channel.key(), evicted.time_ms);
            }
            self.recompute(channel);
            changed.push(channel);
        }
        changed
    }

    pub fn set_normal_value(&mut self, channel: Channel, value: f64) {
        self.channels.get_mut(channel).normal = value;
        self.recompute(channel);
    }

    /// Apply every field present in `update`; absent fields keep their value.
    pub fn set_normal_values(&mut self, update: &BaselineUpdate) -> Vec<Channel> {
        let mut changed = Vec::new();
        for (channel, value) in update.values() {
            self.set_normal_value(channel, value);
            changed.push(channel);
        }
        changed
    }

    pub fn recompute(&mut self, channel: Channel) -> &ReferenceOverlay {
        self.channels.get_mut(channel).recompute()
    }
}
