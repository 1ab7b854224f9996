// src/geo.rs
//! Geographic primitives: raw samples, accepted track points, distance math

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A single raw location reading from a positioning source.
///
/// Samples are never stored directly; only readings that clear the accuracy
/// and displacement filters become [`TrackPoint`]s.
#[derive(Debug, Clone, Copy)]
pub struct GeoSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Estimated horizontal error radius in meters, when the source reports one.
    pub accuracy_m: Option<f64>,
    /// Device clock at fix time.
    pub captured_at: DateTime<Utc>,
}

impl GeoSample {
    pub fn new(latitude: f64, longitude: f64, accuracy_m: Option<f64>) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m,
            captured_at: Utc::now(),
        }
    }

    /// Check that the coordinates are inside valid WGS84 ranges.
    pub fn position_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// An accepted, recorded vertex of a route. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Epoch milliseconds of the originating fix.
    pub timestamp: i64,
}

impl TrackPoint {
    pub fn from_sample(sample: &GeoSample) -> Self {
        Self {
            latitude: sample.latitude,
            longitude: sample.longitude,
            timestamp: sample.captured_at.timestamp_millis(),
        }
    }

    pub fn lat_lon(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Great-circle distance between two lat/lon pairs in kilometers.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let d_lat = (to.0 - from.0).to_radians();
    let d_lon = (to.1 - from.1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.0.to_radians().cos() * to.0.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Total distance along an ordered point sequence in kilometers.
pub fn polyline_length_km(points: &[TrackPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_km(w[0].lat_lon(), w[1].lat_lon()))
        .sum()
}

/// Axis-aligned bounding box over a point sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    pub fn from_points(points: &[TrackPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self {
            min_lat: first.latitude,
            min_lon: first.longitude,
            max_lat: first.latitude,
            max_lon: first.longitude,
        };
        for point in &points[1..] {
            bounds.extend(point.latitude, point.longitude);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, lat: f64, lon: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lat = self.max_lat.max(lat);
        self.max_lon = self.max_lon.max(lon);
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> TrackPoint {
        TrackPoint {
            latitude: lat,
            longitude: lon,
            timestamp: 0,
        }
    }

    #[test]
    fn test_haversine_known_distance() {
        // London to Paris, roughly 343 km
        let distance = haversine_km((51.5074, -0.1278), (48.8566, 2.3522));
        assert!((distance - 343.5).abs() < 2.0);
    }

    #[test]
    fn test_haversine_zero_for_same_point() {
        assert_eq!(haversine_km((10.0, 20.0), (10.0, 20.0)), 0.0);
    }

    #[test]
    fn test_haversine_small_displacement() {
        // 0.0001 degrees of longitude at the equator is about 11.1 m
        let distance = haversine_km((0.0, 0.0), (0.0, 0.0001));
        assert!((distance - 0.0111).abs() < 0.001);
    }

    #[test]
    fn test_polyline_length_matches_pairwise_sum() {
        let points = vec![point(0.0, 0.0), point(0.0, 0.0001), point(0.0, 0.0002)];
        let total = polyline_length_km(&points);
        let pairwise = haversine_km((0.0, 0.0), (0.0, 0.0001))
            + haversine_km((0.0, 0.0001), (0.0, 0.0002));
        assert!((total - pairwise).abs() < 1e-12);
    }

    #[test]
    fn test_sample_position_validation() {
        assert!(GeoSample::new(45.0, 120.0, None).position_valid());
        assert!(!GeoSample::new(90.5, 0.0, None).position_valid());
        assert!(!GeoSample::new(0.0, -180.5, None).position_valid());
    }

    #[test]
    fn test_bounds_from_points() {
        let points = vec![point(1.0, -3.0), point(-2.0, 4.0), point(0.5, 0.0)];
        let bounds = GeoBounds::from_points(&points).unwrap();
        assert_eq!(bounds.min_lat, -2.0);
        assert_eq!(bounds.max_lat, 1.0);
        assert_eq!(bounds.min_lon, -3.0);
        assert_eq!(bounds.max_lon, 4.0);
        assert_eq!(bounds.center(), (-0.5, 0.5));
    }

    #[test]
    fn test_bounds_empty() {
        assert!(GeoBounds::from_points(&[]).is_none());
    }
}
