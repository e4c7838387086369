//! Geographic bounding boxes.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in degrees.
///
/// `min_x`/`max_x` are longitudes, `min_y`/`max_y` latitudes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box enclosing every `(lat, lon)` point.
    ///
    /// Returns `None` for an empty iterator.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        points.into_iter().fold(None, |acc, (lat, lon)| {
            Some(match acc {
                None => BoundingBox::new(lon, lat, lon, lat),
                Some(b) => BoundingBox::new(
                    b.min_x.min(lon),
                    b.min_y.min(lat),
                    b.max_x.max(lon),
                    b.max_y.max(lat),
                ),
            })
        })
    }

    /// Width of the bounding box in degrees.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in degrees.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center as `(lat, lon)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_y + self.max_y) / 2.0,
            (self.min_x + self.max_x) / 2.0,
        )
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Leaflet-style bounds: `[[south, west], [north, east]]`.
    pub fn to_leaflet_bounds(&self) -> [[f64; 2]; 2] {
        [[self.min_y, self.min_x], [self.max_y, self.max_x]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enclosing() {
        let bbox = BoundingBox::enclosing([(-38.03, -57.5), (-51.6, -68.96), (-45.9, -67.38)])
            .unwrap();
        assert_eq!(bbox.min_x, -68.96);
        assert_eq!(bbox.max_x, -57.5);
        assert_eq!(bbox.min_y, -51.6);
        assert_eq!(bbox.max_y, -38.03);
        assert!(BoundingBox::enclosing(Vec::new()).is_none());
    }

    #[test]
    fn test_leaflet_bounds() {
        let bbox = BoundingBox::new(-80.0, -60.0, -50.0, -33.0);
        assert_eq!(bbox.to_leaflet_bounds(), [[-60.0, -80.0], [-33.0, -50.0]]);
        assert!(bbox.contains_point(-57.5, -38.03));
        assert!(!bbox.contains_point(-40.0, -38.03));
    }
}
