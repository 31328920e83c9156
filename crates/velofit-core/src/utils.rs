//! Numeric helpers shared by the aggregation and scoring stages.

use ndarray::{s, Array1};

/// Centered moving average whose window narrows at the sequence edges.
///
/// Each output sample is the mean of the inputs within `window_size / 2`
/// positions on either side, so an even width behaves like the next odd one.
/// Nothing is padded or wrapped. A window of 0 or 1 returns the input.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn moving_average(data: &Array1<f64>, window_size: usize) -> Array1<f64> {
    if window_size <= 1 || data.len() <= 1 {
        return data.clone();
    }

    let half_window = window_size / 2;
    Array1::from_shape_fn(data.len(), |i| {
        let start = i.saturating_sub(half_window);
        let end = (i + half_window + 1).min(data.len());
        let window = data.slice(s![start..end]);
        window.sum() / window.len() as f64
    })
}

/// Minimum, maximum and mean of a non-empty series.
#[must_use]
pub fn min_max_mean(data: &Array1<f64>) -> Option<(f64, f64, f64)> {
    let mean = data.mean()?;
    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max, mean))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_moving_average_narrows_at_edges() {
        let data = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let smoothed = moving_average(&data, 3);
        assert!((smoothed[0] - 1.5).abs() < 1e-10);
        assert!((smoothed[2] - 3.0).abs() < 1e-10);
        assert!((smoothed[4] - 4.5).abs() < 1e-10);
    }

    #[test]
    fn test_moving_average_suppresses_spike() {
        let data = array![100.0, 100.0, 150.0, 100.0, 100.0];
        let smoothed = moving_average(&data, 5);
        assert!((smoothed[2] - 110.0).abs() < 1e-10);
    }

    #[test]
    fn test_window_wider_than_data_still_smooths() {
        let data = array![0.0, 10.0];
        let smoothed = moving_average(&data, 9);
        assert!((smoothed[0] - 5.0).abs() < 1e-10);
        assert!((smoothed[1] - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_unit_window_is_identity() {
        let data = array![3.0, 1.0, 2.0];
        assert_eq!(moving_average(&data, 1), data);
        assert_eq!(moving_average(&data, 0), data);
    }

    #[test]
    fn test_min_max_mean() {
        let (min, max, mean) = min_max_mean(&array![2.0, 8.0, 5.0]).unwrap();
        assert!((min - 2.0).abs() < 1e-10);
        assert!((max - 8.0).abs() < 1e-10);
        assert!((mean - 5.0).abs() < 1e-10);
        assert!(min_max_mean(&Array1::zeros(0)).is_none());
    }
}
