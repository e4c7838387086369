//! Dataset URLs and OPeNDAP constraint expressions.

use std::fmt;

use marine_common::ForecastCycle;

/// NOMADS GrADS Data Server root for the GFS 0.25° runs.
pub const NOMADS_GFS_BASE: &str = "https://nomads.ncep.noaa.gov/dods/gfs_0p25";

/// Copernicus Marine OPeNDAP root.
pub const COPERNICUS_BASE: &str = "https://nrt.cmems-du.eu/thredds/dodsC";

/// Copernicus global wave analysis/forecast, 3-hourly, 1/12°.
pub const COPERNICUS_WAVE_DATASET: &str = "cmems_mod_glo_wav_anfc_0.083deg_PT3H-i";

/// URL of one GFS run.
///
/// URL format: `{base}/gfs{YYYYMMDD}/gfs_0p25_{HH}z`
/// Example: `https://nomads.ncep.noaa.gov/dods/gfs_0p25/gfs20240315/gfs_0p25_00z`
pub fn gfs_dataset_url(base: &str, cycle: &ForecastCycle) -> String {
    format!(
        "{}/gfs{}/gfs_0p25_{}",
        base.trim_end_matches('/'),
        cycle.compact_date(),
        cycle.cycle_label()
    )
}

/// URL of a Copernicus Marine dataset.
pub fn copernicus_dataset_url(base: &str, dataset_id: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), dataset_id)
}

/// Index range along one dimension, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub start: usize,
    pub stride: usize,
    pub stop: usize,
}

impl IndexRange {
    pub fn new(start: usize, stop: usize) -> Self {
        Self {
            start,
            stride: 1,
            stop,
        }
    }

    pub fn strided(start: usize, stride: usize, stop: usize) -> Self {
        Self {
            start,
            stride: stride.max(1),
            stop,
        }
    }

    pub fn single(index: usize) -> Self {
        Self::new(index, index)
    }

    /// Number of indices selected.
    pub fn len(&self) -> usize {
        if self.stop < self.start {
            0
        } else {
            (self.stop - self.start) / self.stride + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> {
        (self.start..=self.stop).step_by(self.stride)
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stride == 1 {
            write!(f, "[{}:{}]", self.start, self.stop)
        } else {
            write!(f, "[{}:{}:{}]", self.start, self.stride, self.stop)
        }
    }
}

/// A variable with one index range per dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperslab {
    pub variable: String,
    pub ranges: Vec<IndexRange>,
}

impl Hyperslab {
    pub fn new(variable: impl Into<String>, ranges: Vec<IndexRange>) -> Self {
        Self {
            variable: variable.into(),
            ranges,
        }
    }

    /// Number of values the server will return.
    pub fn len(&self) -> usize {
        self.ranges.iter().map(IndexRange::len).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Hyperslab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.variable)?;
        for range in &self.ranges {
            write!(f, "{}", range)?;
        }
        Ok(())
    }
}

/// `{dataset}.ascii?{projection},{projection},...`
pub fn ascii_url<P: fmt::Display>(dataset_url: &str, projections: &[P]) -> String {
    let constraint: Vec<String> = projections.iter().map(ToString::to_string).collect();
    format!("{}.ascii?{}", dataset_url, constraint.join(","))
}
