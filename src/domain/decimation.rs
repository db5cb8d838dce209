// Largest-triangle-three-buckets downsampling for chart series
use super::series::SeriesPoint;

/// Reduce `points` to `threshold` points while keeping the visual shape.
///
/// Returns the input unchanged when it already fits or when `threshold` is
/// too small to keep both end points plus one bucket.
pub fn lttb(points: &[SeriesPoint], threshold: usize) -> Vec<SeriesPoint> {
    if threshold >= points.len() || threshold < 3 {
        return points.to_vec();
    }

    let mut sampled = Vec::with_capacity(threshold);
    let bucket_size = (points.len() - 2) as f64 / (threshold - 2) as f64;

    let mut a = 0;
    sampled.push(points[a]);

    for i in 0..threshold - 2 {
        // Average of the next bucket is the third triangle vertex
        let next_start = (((i + 1) as f64 * bucket_size) as usize + 1).min(points.len() - 1);
        let next_end = (((i + 2) as f64 * bucket_size) as usize + 1).clamp(next_start + 1, points.len());
        let next = &points[next_start..next_end];
        let count = next.len() as f64;
        let avg_x = next.iter().map(|p| p.time_ms as f64).sum::<f64>() / count;
        let avg_y = next.iter().map(|p| p.value).sum::<f64>() / count;

        let start = (i as f64 * bucket_size) as usize + 1;
        let end = ((i + 1) as f64 * bucket_size) as usize + 1;

        let ax = points[a].time_ms as f64;
        let ay = points[a].value;

        let mut max_area = -1.0;
        let mut chosen = start;
        for (j, p) in points.iter().enumerate().take(end).skip(start) {
            let area = ((ax - avg_x) * (p.value - ay) - (ax - p.time_ms as f64) * (avg_y - ay)).abs();
            if area > max_area {
                max_area = area;
                chosen = j;
            }
        }

        sampled.push(points[chosen]);
        a = chosen;
    }

    sampled.push(points[points.len() - 1]);
    sampled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: i64) -> Vec<SeriesPoint> {
        (0..n).map(|t| SeriesPoint::new(t * 1000, t as f64)).collect()
    }

    #[test]
    fn test_small_input_is_untouched() {
        let points = ramp(5);
        assert_eq!(lttb(&points, 10), points);
        assert_eq!(lttb(&points, 2), points);
    }

    #[test]
    fn test_keeps_end_points_and_size() {
        let points = ramp(3600);
        let sampled = lttb(&points, 1000);
        assert_eq!(sampled.len(), 1000);
        assert_eq!(sampled.first(), points.first());
        assert_eq!(sampled.last(), points.last());
        assert!(sampled.windows(2).all(|w| w[0].time_ms < w[1].time_ms));
    }

    #[test]
    fn test_keeps_spike() {
        let mut points = ramp(100);
        for p in points.iter_mut() {
            p.value = 0.0;
        }
        points[50].value = 500.0;
        let sampled = lttb(&points, 10);
        assert!(sampled.iter().any(|p| p.value == 500.0));
    }
}
