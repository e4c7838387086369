//! Threshold overlays for scalar fields.
//!
//! Each threshold becomes an independent translucent PNG layer in which a
//! cell is colored iff its value is strictly greater than the threshold.
//! Missing (NaN) cells are always transparent. Layers are rendered in
//! parallel with rayon.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;
use grid_sampler::{GriddedField, ScalarGrid};
use marine_common::{utc_day_bounds, BoundingBox, Color};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RenderError;
use crate::png::encode_mask;

/// One overlay level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub value: f64,
    pub color: Color,
    pub label: String,
}

impl Threshold {
    pub fn new(value: f64, color: Color, label: impl Into<String>) -> Self {
        Self {
            value,
            color,
            label: label.into(),
        }
    }
}

/// Significant wave height levels: >3 m, >4 m, >6 m.
pub fn default_wave_thresholds() -> Vec<Threshold> {
    vec![
        Threshold::new(3.0, Color::named("yellow"), ">3 m"),
        Threshold::new(4.0, Color::named("orange"), ">4 m"),
        Threshold::new(6.0, Color::named("red"), ">6 m"),
    ]
}

/// A rendered, geo-referenced overlay.
#[derive(Debug, Clone)]
pub struct OverlayLayer {
    pub threshold: Threshold,
    /// Extent covered by the image (cell edges, not centers).
    pub bounds: BoundingBox,
    pub width: usize,
    pub height: usize,
    /// Row-major, north-up.
    pub mask: Vec<bool>,
    pub png: Vec<u8>,
}

impl OverlayLayer {
    pub fn label(&self) -> &str {
        &self.threshold.label
    }

    /// Whether pixel (row, col) of the north-up image is colored.
    pub fn is_set(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width && self.mask[row * self.width + col]
    }

    pub fn set_cells(&self) -> usize {
        self.mask.iter().filter(|on| **on).count()
    }

    /// `data:image/png;base64,...` for embedding in HTML.
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}

/// Per-cell maximum of `field` over the UTC calendar day `day`.
pub fn daily_max(field: &GriddedField, day: NaiveDate) -> Option<ScalarGrid> {
    let (start, end) = utc_day_bounds(day);
    field.max_over_window(start, end)
}

/// Mask of `value > threshold`, flipped so row 0 is the northernmost row.
pub fn threshold_mask(grid: &ScalarGrid, threshold: f64) -> Vec<bool> {
    let (w, h) = (grid.width(), grid.height());
    let flip = grid.south_to_north();
    let mut mask = Vec::with_capacity(w * h);
    for out_row in 0..h {
        let src_row = if flip { h - 1 - out_row } else { out_row };
        mask.extend(
            grid.values[src_row * w..(src_row + 1) * w]
                .iter()
                .map(|v| (*v as f64) > threshold),
        );
    }
    mask
}

/// Bounds of the cells' outer edges, assuming a regular grid.
pub fn cell_edge_bounds(grid: &ScalarGrid) -> BoundingBox {
    let centers = grid.bounding_box();
    let half = |axis: &[f64]| {
        if axis.len() > 1 {
            (axis[1] - axis[0]).abs() / 2.0
        } else {
            0.0
        }
    };
    let (hx, hy) = (half(&grid.lons), half(&grid.lats));
    BoundingBox::new(
        centers.min_x - hx,
        centers.min_y - hy,
        centers.max_x + hx,
        centers.max_y + hy,
    )
}

/// Build one overlay per threshold. A field below every threshold yields
/// fully transparent layers.
pub fn build_threshold_overlays(
    grid: &ScalarGrid,
    thresholds: &[Threshold],
    fill_alpha: u8,
) -> Result<Vec<OverlayLayer>, RenderError> {
    let (width, height) = (grid.width(), grid.height());
    if grid.values.len() != width * height || width == 0 || height == 0 {
        return Err(RenderError::InvalidDimensions {
            width,
            height,
            len: grid.values.len(),
        });
    }
    let bounds = cell_edge_bounds(grid);

    thresholds
        .par_iter()
        .map(|threshold| {
            let mask = threshold_mask(grid, threshold.value);
            let (r, g, b, _) = threshold.color.to_rgba();
            let png = encode_mask(width, height, &mask, (r, g, b, fill_alpha))?;
            let layer = OverlayLayer {
                threshold: threshold.clone(),
                bounds,
                width,
                height,
                mask,
                png,
            };
            debug!(
                label = %layer.threshold.label,
                cells = layer.set_cells(),
                bytes = layer.png.len(),
                "Rendered overlay"
            );
            Ok(layer)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn grid(lats: Vec<f64>, lons: Vec<f64>, values: Vec<f32>) -> ScalarGrid {
        ScalarGrid { lats, lons, values }
    }

    #[test]
    fn test_mask_is_strictly_greater() {
        let g = grid(vec![0.0], vec![0.0, 1.0, 2.0], vec![2.9, 3.0, 3.1]);
        assert_eq!(threshold_mask(&g, 3.0), vec![false, false, true]);
    }

    #[test]
    fn test_mask_flips_south_to_north() {
        // row 0 is the south row
        let g = grid(vec![-40.0, -39.0], vec![0.0, 1.0], vec![5.0, 5.0, 0.0, 0.0]);
        assert_eq!(threshold_mask(&g, 3.0), vec![false, false, true, true]);

        let north_first = grid(vec![-39.0, -40.0], vec![0.0, 1.0], vec![5.0, 5.0, 0.0, 0.0]);
        assert_eq!(threshold_mask(&north_first, 3.0), vec![true, true, false, false]);
    }

    #[test]
    fn test_nan_is_transparent() {
        let g = grid(vec![0.0], vec![0.0, 1.0], vec![f32::NAN, 7.0]);
        assert_eq!(threshold_mask(&g, 6.0), vec![false, true]);
    }

    #[test]
    fn test_cell_edge_bounds() {
        let g = grid(vec![-60.0, -59.5], vec![-80.0, -79.5, -79.0], vec![0.0; 6]);
        let b = cell_edge_bounds(&g);
        assert_eq!(b, BoundingBox::new(-80.25, -60.25, -78.75, -59.25));
    }

    #[test]
    fn test_daily_max_selects_day() {
        let day1 = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        let day1_late = Utc.with_ymd_and_hms(2024, 3, 15, 21, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2024, 3, 16, 0, 0, 0).unwrap();
        let field = GriddedField::new(
            "VHM0",
            vec![day1, day1_late, day2],
            vec![-40.0],
            vec![-60.0],
            vec![2.0, 3.5, 9.0],
        )
        .unwrap();

        let max = daily_max(&field, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()).unwrap();
        assert_eq!(max.values, vec![3.5]);
        assert!(daily_max(&field, NaiveDate::from_ymd_opt(2024, 3, 17).unwrap()).is_none());
    }

    #[test]
    fn test_data_uri_prefix() {
        let g = grid(vec![0.0], vec![0.0], vec![1.0]);
        let layers = build_threshold_overlays(&g, &default_wave_thresholds(), 102).unwrap();
        assert!(layers[0].data_uri().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }
}
