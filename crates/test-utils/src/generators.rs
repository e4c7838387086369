//! Synthetic data generators for fields and axes.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

/// Evenly spaced axis of `n` values starting at `start`.
///
/// ```
/// use test_utils::create_axis;
///
/// assert_eq!(create_axis(-40.0, 0.25, 3), vec![-40.0, -39.75, -39.5]);
/// ```
pub fn create_axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Constant field over `times` planes, e.g. a uniform wind component.
pub fn create_constant_field(times: usize, width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; times * width * height]
}

/// Wave-height-like grid: rises linearly from 0 m in the first column to
/// `max_height` in the last, identical on every row.
pub fn create_wave_height_grid(width: usize, height: usize, max_height: f32) -> Vec<f32> {
    let denom = width.saturating_sub(1).max(1) as f32;
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            data.push(max_height * col as f32 / denom);
        }
    }
    data
}

/// Creates a grid with NaN values at the given `(row, col)` positions.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    value: f32,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![value; width * height];
    for &(row, col) in nan_positions {
        if row < height && col < width {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}
