//! In-memory gridded forecast fields indexed by (time, latitude, longitude).
//!
//! A `GriddedField` is produced by a data-retrieval collaborator (an OPeNDAP
//! client, a cache file) and is never mutated afterwards. Sampling code only
//! queries it.

use chrono::{DateTime, Utc};
use marine_common::{BoundingBox, LongitudeConvention, MarineError, MarineResult};
use serde::{Deserialize, Serialize};

/// One of the two horizontal axes of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Latitude,
    Longitude,
}

/// Why a coordinate could not be resolved to a grid index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisLookupError {
    /// The query is not a finite number.
    NotFinite,
    /// The query lies more than one grid step outside the axis.
    OutOfRange { value: f64, min: f64, max: f64 },
}

/// Index of the axis value closest to `x`.
///
/// Queries farther than one grid step beyond either end of the axis are
/// rejected rather than clamped to the edge cell.
pub fn nearest_index(axis: &[f64], x: f64) -> Result<usize, AxisLookupError> {
    if !x.is_finite() {
        return Err(AxisLookupError::NotFinite);
    }

    let (min, max) = axis_extent(axis);
    if axis.is_empty() {
        return Err(AxisLookupError::OutOfRange { value: x, min, max });
    }
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &value) in axis.iter().enumerate() {
        let dist = (value - x).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }

    let step = if axis.len() > 1 {
        (axis[1] - axis[0]).abs()
    } else {
        f64::INFINITY
    };
    if best_dist > step {
        return Err(AxisLookupError::OutOfRange { value: x, min, max });
    }
    Ok(best)
}

fn axis_extent(axis: &[f64]) -> (f64, f64) {
    axis.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

fn is_monotonic(axis: &[f64]) -> bool {
    axis.windows(2).all(|w| w[1] > w[0]) || axis.windows(2).all(|w| w[1] < w[0])
}

/// A read-only scalar field on a regular (time, lat, lon) grid.
///
/// Values are stored row-major: time, then latitude, then longitude.
/// Deserialization goes through [`GriddedField::new`], so a cached field is
/// validated the same way as a freshly fetched one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FieldParts")]
pub struct GriddedField {
    /// Variable name as published by the data service (e.g. `ugrd10m`, `VHM0`).
    pub variable: String,
    times: Vec<DateTime<Utc>>,
    lats: Vec<f64>,
    lons: Vec<f64>,
    #[serde(serialize_with = "serialize_missing_as_null")]
    values: Vec<f32>,
    fill_value: Option<f32>,
}

/// JSON has no NaN; missing cells are written as `null`.
fn serialize_missing_as_null<S: serde::Serializer>(values: &[f32], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(values.iter().map(|v| if v.is_finite() { Some(*v) } else { None }))
}

#[derive(Deserialize)]
struct FieldParts {
    variable: String,
    times: Vec<DateTime<Utc>>,
    lats: Vec<f64>,
    lons: Vec<f64>,
    values: Vec<Option<f32>>,
    #[serde(default)]
    fill_value: Option<f32>,
}

impl TryFrom<FieldParts> for GriddedField {
    type Error = MarineError;

    fn try_from(parts: FieldParts) -> Result<Self, Self::Error> {
        let values = parts
            .values
            .into_iter()
            .map(|v| v.unwrap_or(f32::NAN))
            .collect();
        let field = GriddedField::new(parts.variable, parts.times, parts.lats, parts.lons, values)?;
        Ok(match parts.fill_value {
            Some(fill) => field.with_fill_value(fill),
            None => field,
        })
    }
}

impl GriddedField {
    /// Build a field, checking the data length against the axes.
    pub fn new(
        variable: impl Into<String>,
        times: Vec<DateTime<Utc>>,
        lats: Vec<f64>,
        lons: Vec<f64>,
        values: Vec<f32>,
    ) -> MarineResult<Self> {
        let variable = variable.into();

        if lats.is_empty() || lons.is_empty() {
            return Err(MarineError::MalformedData(format!(
                "{}: latitude and longitude axes must not be empty",
                variable
            )));
        }
        if !is_monotonic(&lats) || !is_monotonic(&lons) {
            return Err(MarineError::MalformedData(format!(
                "{}: coordinate axes must be strictly monotonic",
                variable
            )));
        }
        let expected = times.len() * lats.len() * lons.len();
        if values.len() != expected {
            return Err(MarineError::MalformedData(format!(
                "{}: expected {} values for shape [{}][{}][{}], got {}",
                variable,
                expected,
                times.len(),
                lats.len(),
                lons.len(),
                values.len()
            )));
        }

        Ok(Self {
            variable,
            times,
            lats,
            lons,
            values,
            fill_value: None,
        })
    }

    /// Treat `fill` as a missing-value marker in addition to NaN.
    pub fn with_fill_value(mut self, fill: f32) -> Self {
        self.fill_value = Some(fill);
        self
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// `(times, lats, lons)`
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.times.len(), self.lats.len(), self.lons.len())
    }

    /// Longitude convention of this field's longitude axis.
    pub fn longitude_convention(&self) -> LongitudeConvention {
        LongitudeConvention::detect(&self.lons)
    }

    /// Position of `t` on the time axis (exact match only).
    pub fn time_index(&self, t: &DateTime<Utc>) -> Option<usize> {
        self.times.iter().position(|x| x == t)
    }

    pub fn nearest_lat_index(&self, lat: f64) -> Result<usize, AxisLookupError> {
        nearest_index(&self.lats, lat)
    }

    /// `lon` must already be expressed in this field's longitude convention.
    pub fn nearest_lon_index(&self, lon: f64) -> Result<usize, AxisLookupError> {
        nearest_index(&self.lons, lon)
    }

    /// Value at a cell, `None` when the cell is out of bounds or missing.
    pub fn value(&self, ti: usize, yi: usize, xi: usize) -> Option<f32> {
        let (nt, ny, nx) = self.shape();
        if ti >= nt || yi >= ny || xi >= nx {
            return None;
        }
        let v = self.values[(ti * ny + yi) * nx + xi];
        if self.is_missing(v) {
            None
        } else {
            Some(v)
        }
    }

    fn is_missing(&self, v: f32) -> bool {
        !v.is_finite() || self.fill_value.map_or(false, |fill| v == fill)
    }

    /// Geographic extent of the grid (in the field's own longitude convention).
    pub fn bounding_box(&self) -> BoundingBox {
        let (min_x, max_x) = axis_extent(&self.lons);
        let (min_y, max_y) = axis_extent(&self.lats);
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }

    /// Per-cell maximum over the time steps in `[start, end)`.
    ///
    /// Missing values are skipped; a cell with no valid value in the window
    /// becomes NaN. Returns `None` when no time step falls in the window.
    pub fn max_over_window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<ScalarGrid> {
        let (_, ny, nx) = self.shape();
        let plane = ny * nx;
        let steps: Vec<usize> = self
            .times
            .iter()
            .enumerate()
            .filter(|(_, t)| **t >= start && **t < end)
            .map(|(i, _)| i)
            .collect();

        if steps.is_empty() {
            return None;
        }

        let mut out = vec![f32::NAN; plane];
        for ti in steps {
            let slab = &self.values[ti * plane..(ti + 1) * plane];
            for (acc, &v) in out.iter_mut().zip(slab) {
                if self.is_missing(v) {
                    continue;
                }
                if acc.is_nan() || v > *acc {
                    *acc = v;
                }
            }
        }

        Some(ScalarGrid {
            lats: self.lats.clone(),
            lons: self.lons.clone(),
            values: out,
        })
    }
}

/// A single 2-D plane of a field, row-major by latitude then longitude.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarGrid {
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub values: Vec<f32>,
}

impl ScalarGrid {
    pub fn width(&self) -> usize {
        self.lons.len()
    }

    pub fn height(&self) -> usize {
        self.lats.len()
    }

    /// Whether row 0 is the southernmost latitude.
    pub fn south_to_north(&self) -> bool {
        self.lats.len() < 2 || self.lats[1] > self.lats[0]
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let (min_x, max_x) = axis_extent(&self.lons);
        let (min_y, max_y) = axis_extent(&self.lats);
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }
}

/// Eastward and northward wind components on a shared grid.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
    pub u: GriddedField,
    pub v: GriddedField,
}

impl VectorField {
    /// Pair two components, requiring identical axes.
    pub fn new(u: GriddedField, v: GriddedField) -> MarineResult<Self> {
        if u.times != v.times || u.lats != v.lats || u.lons != v.lons {
            return Err(MarineError::MalformedData(format!(
                "{} and {} are not on the same grid",
                u.variable, v.variable
            )));
        }
        Ok(Self { u, v })
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        self.u.times()
    }

    /// Both components at a cell; `None` if either is missing.
    pub fn vector(&self, ti: usize, yi: usize, xi: usize) -> Option<(f32, f32)> {
        Some((self.u.value(ti, yi, xi)?, self.v.value(ti, yi, xi)?))
    }
}
