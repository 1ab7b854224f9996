// src/persist.rs
//! Route persistence: the collaborator contract and a file-backed store

use crate::error::{RecorderError, Result};
use crate::tracker::summary::RouteSummary;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::path::PathBuf;

/// The external "persist a finished route" collaborator.
///
/// Fire-and-forget with reporting: the recorder awaits the result only to
/// surface failure to the caller, never to gate session cleanup. The store
/// receives an owned copy of the summary's data.
pub trait RoutePersistence {
    fn persist_route(&self, summary: &RouteSummary) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteFormat {
    Json,
    Gpx,
    GeoJson,
}

impl RouteFormat {
    pub fn extension(&self) -> &str {
        match self {
            RouteFormat::Json => "json",
            RouteFormat::Gpx => "gpx",
            RouteFormat::GeoJson => "geojson",
        }
    }
}

impl std::str::FromStr for RouteFormat {
    type Err = RecorderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(RouteFormat::Json),
            "gpx" => Ok(RouteFormat::Gpx),
            "geojson" => Ok(RouteFormat::GeoJson),
            other => Err(RecorderError::Other(format!("Unknown route format: {}", other))),
        }
    }
}

/// Writes each finished route to a file in the output directory.
pub struct FileRouteStore {
    dir: PathBuf,
    format: RouteFormat,
}

impl FileRouteStore {
    pub fn new(dir: impl Into<PathBuf>, format: RouteFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    fn file_path(&self, summary: &RouteSummary) -> PathBuf {
        let stamp = summary.finished_at.format("%Y%m%d-%H%M%S");
        self.dir
            .join(format!("route-{}.{}", stamp, self.format.extension()))
    }

    fn render(&self, summary: &RouteSummary) -> Result<String> {
        match self.format {
            RouteFormat::Json => {
                serde_json::to_string_pretty(summary).map_err(RecorderError::Json)
            }
            RouteFormat::Gpx => Ok(to_gpx(summary)),
            RouteFormat::GeoJson => to_geojson(summary),
        }
    }
}

impl RoutePersistence for FileRouteStore {
    async fn persist_route(&self, summary: &RouteSummary) -> Result<()> {
        let contents = self.render(summary)?;
        let path = self.file_path(summary);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RecorderError::Persistence(format!("Failed to create {}: {}", self.dir.display(), e)))?;

        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| RecorderError::Persistence(format!("Failed to write {}: {}", path.display(), e)))?;

        log::info!("Saved route to {}", path.display());
        Ok(())
    }
}

/// Render a summary as a GPX 1.1 track.
pub fn to_gpx(summary: &RouteSummary) -> String {
    let mut gpx = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="Ride Recorder" xmlns="http://www.topografix.com/GPX/1/1">
"#,
    );

    gpx.push_str("  <trk>\n");
    gpx.push_str(&format!("    <name>{}</name>\n", escape_xml(&summary.title)));
    gpx.push_str(&format!(
        "    <desc>{}</desc>\n",
        escape_xml(&summary.description)
    ));
    gpx.push_str("    <trkseg>\n");

    for point in &summary.points {
        gpx.push_str(&format!(
            "      <trkpt lat=\"{}\" lon=\"{}\">\n",
            point.latitude, point.longitude
        ));
        gpx.push_str(&format!(
            "        <time>{}</time>\n",
            point_time(point.timestamp).to_rfc3339()
        ));
        gpx.push_str("      </trkpt>\n");
    }

    gpx.push_str("    </trkseg>\n  </trk>\n</gpx>\n");
    gpx
}

/// Render a summary as a GeoJSON feature with a LineString geometry.
pub fn to_geojson(summary: &RouteSummary) -> Result<String> {
    let coordinates: Vec<serde_json::Value> = summary
        .points
        .iter()
        .map(|p| serde_json::json!([p.longitude, p.latitude]))
        .collect();

    let feature = serde_json::json!({
        "type": "Feature",
        "geometry": {
            "type": "LineString",
            "coordinates": coordinates,
        },
        "properties": {
            "title": summary.title,
            "description": summary.description,
            "distance_km": summary.distance_km,
            "distance_label": summary.distance_label,
            "duration_secs": summary.duration_secs,
            "difficulty": summary.difficulty.as_str(),
            "status": summary.status,
            "finished_at": summary.finished_at.to_rfc3339(),
        }
    });

    serde_json::to_string_pretty(&feature).map_err(RecorderError::Json)
}

fn point_time(timestamp_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp_ms).unwrap_or_else(Utc::now)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::TrackPoint;

    fn summary() -> RouteSummary {
        let points = vec![
            TrackPoint {
                latitude: 0.0,
                longitude: 0.0,
                timestamp: 1_700_000_000_000,
            },
            TrackPoint {
                latitude: 0.0,
                longitude: 0.001,
                timestamp: 1_700_000_010_000,
            },
        ];
        RouteSummary::build(Utc::now(), 0.11, 10, points)
    }

    #[test]
    fn test_gpx_rendering() {
        let gpx = to_gpx(&summary());
        assert!(gpx.contains("<gpx"));
        assert!(gpx.contains("<trkseg>"));
        assert_eq!(gpx.matches("<trkpt").count(), 2);
        assert!(gpx.contains("lat=\"0\""));
    }

    #[test]
    fn test_gpx_escapes_title() {
        let mut s = summary();
        s.title = "Ride <fast> & loose".to_string();
        let gpx = to_gpx(&s);
        assert!(gpx.contains("Ride &lt;fast&gt; &amp; loose"));
    }

    #[test]
    fn test_geojson_rendering() {
        let geojson = to_geojson(&summary()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&geojson).unwrap();
        assert_eq!(value["geometry"]["type"], "LineString");
        assert_eq!(value["geometry"]["coordinates"].as_array().unwrap().len(), 2);
        assert_eq!(value["properties"]["status"], "completed");
        // GeoJSON is lon-first
        assert_eq!(value["geometry"]["coordinates"][1][0], 0.001);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("gpx".parse::<RouteFormat>().unwrap(), RouteFormat::Gpx);
        assert_eq!("JSON".parse::<RouteFormat>().unwrap(), RouteFormat::Json);
        assert!("kml".parse::<RouteFormat>().is_err());
    }

    #[tokio::test]
    async fn test_file_store_writes_route() {
        let dir = std::env::temp_dir().join(format!(
            "ride-recorder-test-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
        ));
        let store = FileRouteStore::new(&dir, RouteFormat::Json);
        let summary = summary();

        store.persist_route(&summary).await.unwrap();

        let path = store.file_path(&summary);
        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: RouteSummary = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.points.len(), 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
