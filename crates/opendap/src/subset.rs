//! Planning which index ranges of a remote grid to request.
//!
//! Only the cells around the area of interest are fetched: the bounding box
//! widened by a margin of whole grid cells, so nearest-neighbor lookups at
//! the box edge still see their true nearest cell.

use chrono::{DateTime, Utc};
use marine_common::{BoundingBox, LongitudeConvention};

use crate::error::{OpendapError, OpendapResult};
use crate::url::IndexRange;

/// Coordinate axes of a remote dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetAxes {
    pub times: Vec<DateTime<Utc>>,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
}

/// Which time steps to fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeSelection {
    /// These exact valid times; those not on the axis are left out.
    Exact(Vec<DateTime<Utc>>),
    /// Every step in `[start, end)`.
    Window {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Index ranges to request plus the axes of the resulting subset.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetPlan {
    /// `None` when no requested time exists on the axis.
    pub time: Option<IndexRange>,
    /// Positions within `time` to keep, parallel to `times`.
    pub keep: Vec<usize>,
    pub times: Vec<DateTime<Utc>>,
    pub lat: IndexRange,
    pub lon: IndexRange,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
}

/// Indices of `axis` whose value lies in `[lo, hi]`, widened by `margin`
/// cells on each side and clamped to the axis.
pub fn axis_index_range(axis: &[f64], lo: f64, hi: f64, margin: usize) -> Option<IndexRange> {
    let inside: Vec<usize> = axis
        .iter()
        .enumerate()
        .filter(|(_, v)| **v >= lo && **v <= hi)
        .map(|(i, _)| i)
        .collect();

    let (first, last) = match (inside.first(), inside.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => {
            // Box smaller than one cell: take the cell nearest its center.
            let center = (lo + hi) / 2.0;
            let nearest = axis
                .iter()
                .enumerate()
                .min_by(|a, b| {
                    (a.1 - center)
                        .abs()
                        .partial_cmp(&(b.1 - center).abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(i, _)| i)?;
            let step = if axis.len() > 1 {
                (axis[1] - axis[0]).abs()
            } else {
                f64::INFINITY
            };
            if (axis[nearest] - center).abs() > step {
                return None;
            }
            (nearest, nearest)
        }
    };

    Some(IndexRange::new(
        first.saturating_sub(margin),
        (last + margin).min(axis.len() - 1),
    ))
}

fn time_range(axis: &[DateTime<Utc>], selection: &TimeSelection) -> (Vec<usize>, Option<IndexRange>) {
    let mut indices: Vec<usize> = match selection {
        TimeSelection::Exact(wanted) => wanted
            .iter()
            .filter_map(|t| axis.iter().position(|a| a == t))
            .collect(),
        TimeSelection::Window { start, end } => axis
            .iter()
            .enumerate()
            .filter(|(_, t)| *t >= start && *t < end)
            .map(|(i, _)| i)
            .collect(),
    };
    indices.sort_unstable();
    indices.dedup();

    let (first, last) = match (indices.first(), indices.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return (indices, None),
    };

    // One strided request when the steps are evenly spaced
    let stride = if indices.len() > 1 { indices[1] - indices[0] } else { 1 };
    let evenly_spaced = indices.windows(2).all(|w| w[1] - w[0] == stride);
    let range = if evenly_spaced {
        IndexRange::strided(first, stride, last)
    } else {
        IndexRange::new(first, last)
    };
    (indices, Some(range))
}

/// Plan a subset of `axes` covering `bbox` (signed longitudes).
pub fn plan_subset(
    axes: &DatasetAxes,
    selection: &TimeSelection,
    bbox: &BoundingBox,
    margin: usize,
) -> OpendapResult<SubsetPlan> {
    let convention = LongitudeConvention::detect(&axes.lons);
    let (west, east) = (convention.normalize(bbox.min_x), convention.normalize(bbox.max_x));
    if west > east {
        return Err(OpendapError::EmptySubset(format!(
            "longitudes {}..{} cross the dataset's longitude seam",
            bbox.min_x, bbox.max_x
        )));
    }

    let lat = axis_index_range(&axes.lats, bbox.min_y, bbox.max_y, margin).ok_or_else(|| {
        OpendapError::EmptySubset(format!(
            "latitudes {}..{} are outside the dataset",
            bbox.min_y, bbox.max_y
        ))
    })?;
    let lon = axis_index_range(&axes.lons, west, east, margin).ok_or_else(|| {
        OpendapError::EmptySubset(format!(
            "longitudes {}..{} are outside the dataset",
            bbox.min_x, bbox.max_x
        ))
    })?;

    let (indices, time) = time_range(&axes.times, selection);
    let keep = match &time {
        Some(range) => range
            .indices()
            .enumerate()
            .filter(|(_, i)| indices.contains(i))
            .map(|(pos, _)| pos)
            .collect(),
        None => Vec::new(),
    };

    Ok(SubsetPlan {
        time,
        keep,
        times: indices.iter().map(|i| axes.times[*i]).collect(),
        lats: lat.indices().map(|i| axes.lats[i]).collect(),
        lons: lon.indices().map(|i| axes.lons[i]).collect(),
        lat,
        lon,
    })
}
