//! Named coastal locations and longitude conventions.
//!
//! The location table is static for the lifetime of a process: it is built
//! once from configuration (or the built-in port list) and validated before
//! any sampling happens.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::error::{MarineError, MarineResult};

/// A named point of interest, in the signed (-180, 180] longitude convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Human-readable name (e.g., "Mar del Plata").
    pub name: String,
    /// Latitude in degrees, [-90, 90].
    pub latitude: f64,
    /// Longitude in degrees, [-180, 180].
    pub longitude: f64,
}

impl Location {
    /// Create a location without validating it.
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// Check that the coordinates are finite and in range.
    pub fn validate(&self) -> MarineResult<()> {
        let invalid = |message: String| MarineError::InvalidLocation {
            name: self.name.clone(),
            message,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty".to_string()));
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(invalid(format!("latitude {} outside [-90, 90]", self.latitude)));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(invalid(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }

    /// Longitude expressed in the given grid convention.
    pub fn grid_longitude(&self, convention: LongitudeConvention) -> f64 {
        convention.normalize(self.longitude)
    }
}

/// Convert a signed longitude to the 0–360° convention.
///
/// Negative longitudes (west of Greenwich) become `360 + lon`; everything
/// else is returned unchanged.
pub fn correct_longitude(lon: f64) -> f64 {
    if lon < 0.0 {
        360.0 + lon
    } else {
        lon
    }
}

/// Longitude convention used by a gridded dataset's longitude axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LongitudeConvention {
    /// Longitudes in (-180, 180] (Copernicus Marine).
    Signed,
    /// Longitudes in [0, 360) (GFS).
    Positive360,
}

impl LongitudeConvention {
    /// Infer the convention from a longitude axis.
    ///
    /// Any value above 180° means the axis runs 0–360.
    pub fn detect(axis: &[f64]) -> Self {
        if axis.iter().any(|&lon| lon > 180.0) {
            LongitudeConvention::Positive360
        } else {
            LongitudeConvention::Signed
        }
    }

    /// Express a signed longitude in this convention.
    pub fn normalize(self, lon: f64) -> f64 {
        match self {
            LongitudeConvention::Signed => lon,
            LongitudeConvention::Positive360 => correct_longitude(lon),
        }
    }
}

/// Ordered, validated table of locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Location>", into = "Vec<Location>")]
pub struct LocationTable {
    locations: Vec<Location>,
}

impl LocationTable {
    /// Build a table, validating every entry and rejecting duplicate names.
    pub fn new(locations: Vec<Location>) -> MarineResult<Self> {
        for (i, loc) in locations.iter().enumerate() {
            loc.validate()?;
            if locations[..i].iter().any(|other| other.name == loc.name) {
                return Err(MarineError::InvalidLocation {
                    name: loc.name.clone(),
                    message: "duplicate location name".to_string(),
                });
            }
        }
        Ok(Self { locations })
    }

    /// Main ports of the Argentine Atlantic coast.
    pub fn argentine_ports() -> Self {
        let ports = [
            ("Mar del Plata", -38.03, -57.5),
            ("Bahía Blanca", -39.0, -61.9),
            ("San Antonio", -40.82, -64.8),
            ("Puerto Madryn", -42.7, -65.02),
            ("Rawson", -43.3, -65.14),
            ("Comodoro Rivadavia", -45.9, -67.38),
            ("Caleta Olivia", -46.45, -67.55),
            ("Puerto Deseado", -47.76, -65.87),
            ("San Julián", -49.30, -67.6),
            ("Punta Quilla", -50.11, -68.46),
            ("Río Gallegos", -51.6, -68.96),
        ];
        Self {
            locations: ports
                .iter()
                .map(|&(name, lat, lon)| Location::new(name, lat, lon))
                .collect(),
        }
    }

    /// Find a location by name.
    pub fn find(&self, name: &str) -> Option<&Location> {
        self.locations.iter().find(|loc| loc.name == name)
    }

    /// Whether `(lat, lon)` is exactly the coordinate pair of some entry.
    pub fn contains_coords(&self, lat: f64, lon: f64) -> bool {
        self.locations
            .iter()
            .any(|loc| loc.latitude == lat && loc.longitude == lon)
    }

    /// Smallest box enclosing all locations.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::enclosing(self.locations.iter().map(|l| (l.latitude, l.longitude)))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Location> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl Default for LocationTable {
    fn default() -> Self {
        Self::argentine_ports()
    }
}

impl TryFrom<Vec<Location>> for LocationTable {
    type Error = MarineError;

    fn try_from(locations: Vec<Location>) -> Result<Self, Self::Error> {
        LocationTable::new(locations)
    }
}

impl From<LocationTable> for Vec<Location> {
    fn from(table: LocationTable) -> Self {
        table.locations
    }
}

impl<'a> IntoIterator for &'a LocationTable {
    type Item = &'a Location;
    type IntoIter = std::slice::Iter<'a, Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.locations.iter()
    }
}
