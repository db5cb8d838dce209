// Bounded time series for a single channel
use serde::Serialize;
use std::collections::VecDeque;

/// Default history window: one hour at one reading per second.
pub const DEFAULT_MAX_POINTS: usize = 3600;
/// Largest window the dashboard accepts.
pub const MAX_POINTS_LIMIT: usize = 36_000;

/// A single chart point, serialized the way chart surfaces expect it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    #[serde(rename = "x")]
    pub time_ms: i64,
    #[serde(rename = "y")]
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self { time_ms, value }
    }
}

/// Timestamp-ordered points, never longer than `capacity`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesBuffer {
    points: VecDeque<SeriesPoint>,
    capacity: usize,
}

impl SeriesBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Replace the contents with the most recent `capacity` points of `points`.
    pub fn replace(&mut self, mut points: Vec<SeriesPoint>) {
        // sort_by_key is stable, so equal timestamps keep their input order
        points.sort_by_key(|p| p.time_ms);
        let skip = points.len().saturating_sub(self.capacity);
        self.points.clear();
        self.points.extend(points.into_iter().skip(skip));
    }

    /// Append a point and trim back to capacity.
    ///
    /// Returns the evicted point, which is always the one with the smallest
    /// timestamp. A point older than the current tail is inserted after any
    /// points with an equal or smaller timestamp.
    pub fn append(&mut self, point: SeriesPoint) -> Option<SeriesPoint> {
        match self.points.back() {
            Some(last) if point.time_ms < last.time_ms => {
                let at = self.points.partition_point(|p| p.time_ms <= point.time_ms);
                self.points.insert(at, point);
            }
            _ => self.points.push_back(point),
        }

        if self.points.len() > self.capacity {
            self.points.pop_front()
        } else {
            None
        }
    }

    /// Owned variant of [`append`](Self::append).
    #[cfg(test)]
    pub fn appended(mut self, point: SeriesPoint) -> (Self, Option<SeriesPoint>) {
        let evicted = self.append(point);
        (self, evicted)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn first(&self) -> Option<&SeriesPoint> {
        self.points.front()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.back()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &SeriesPoint> {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<SeriesPoint> {
        self.points.iter().copied().collect()
    }
}
