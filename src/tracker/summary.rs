// src/tracker/summary.rs
//! Finished-route summary derivation
//!
//! A pure transformation from the final distance, elapsed time, and point
//! sequence of a session into the record handed to persistence. The
//! classification thresholds are business rules and live here as named
//! constants.

use crate::geo::TrackPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Routes at or above this distance classify as Moderate.
pub const DIFFICULTY_BOUNDARY_KM: f64 = 50.0;

/// A route needs at least this many points to be worth saving.
pub const MIN_TRACK_POINTS: usize = 2;

/// Routes shorter than this are considered noise and discarded (km).
pub const MIN_ROUTE_KM: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
}

impl Difficulty {
    /// Classify a route by total distance.
    pub fn from_distance_km(distance_km: f64) -> Self {
        if distance_km >= DIFFICULTY_BOUNDARY_KM {
            Difficulty::Moderate
        } else {
            Difficulty::Easy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Moderate => "moderate",
        }
    }
}

/// The finalized output of a recording session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSummary {
    pub title: String,
    pub description: String,
    pub distance_km: f64,
    /// Display label, e.g. "12.48 km".
    pub distance_label: String,
    pub duration_secs: u64,
    pub difficulty: Difficulty,
    pub points: Vec<TrackPoint>,
    pub status: String,
    pub finished_at: DateTime<Utc>,
}

impl RouteSummary {
    /// Build a summary from a finished session. Callers are responsible for
    /// the minimum-points and minimum-distance checks; this function assumes
    /// the track is worth saving.
    pub fn build(
        finished_at: DateTime<Utc>,
        distance_km: f64,
        duration_secs: u64,
        points: Vec<TrackPoint>,
    ) -> Self {
        Self {
            title: format!("Ride on {}", finished_at.format("%Y-%m-%d")),
            description: format!(
                "Route recorded via live GPS tracking. Duration: {}.",
                format_duration(duration_secs)
            ),
            distance_km,
            distance_label: format!("{:.2} km", distance_km),
            duration_secs,
            difficulty: Difficulty::from_distance_km(distance_km),
            points,
            status: "completed".to_string(),
            finished_at,
        }
    }
}

/// Human-readable elapsed time: "2h 5m 10s", "5m 10s", or "10s".
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
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
    fn test_difficulty_boundary() {
        assert_eq!(Difficulty::from_distance_km(49.99), Difficulty::Easy);
        assert_eq!(Difficulty::from_distance_km(50.0), Difficulty::Moderate);
        assert_eq!(Difficulty::from_distance_km(50.01), Difficulty::Moderate);
        assert_eq!(Difficulty::from_distance_km(0.02), Difficulty::Easy);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(9), "9s");
        assert_eq!(format_duration(75), "1m 15s");
        assert_eq!(format_duration(3600), "1h 0m 0s");
        assert_eq!(format_duration(7510), "2h 5m 10s");
    }

    #[test]
    fn test_summary_fields() {
        let finished_at = DateTime::parse_from_rfc3339("2024-06-01T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let points = vec![point(0.0, 0.0), point(0.0, 0.001)];

        let summary = RouteSummary::build(finished_at, 12.482, 3725, points.clone());

        assert_eq!(summary.title, "Ride on 2024-06-01");
        assert!(summary.description.contains("1h 2m 5s"));
        assert_eq!(summary.distance_label, "12.48 km");
        assert_eq!(summary.difficulty, Difficulty::Easy);
        assert_eq!(summary.status, "completed");
        assert_eq!(summary.points, points);
    }

    #[test]
    fn test_summary_label_rounding() {
        let summary = RouteSummary::build(Utc::now(), 0.0222, 5, vec![point(0.0, 0.0); 3]);
        assert_eq!(summary.distance_label, "0.02 km");
    }

    #[test]
    fn test_summary_serde_round_trip() {
        let summary = RouteSummary::build(Utc::now(), 55.0, 60, vec![point(1.0, 2.0); 2]);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"moderate\""));
        assert!(json.contains("\"completed\""));

        let parsed: RouteSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.difficulty, Difficulty::Moderate);
        assert_eq!(parsed.points.len(), 2);
    }
}
