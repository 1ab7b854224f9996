// src/gps/gpsd.rs
//! gpsd-backed continuous location source

use crate::error::{RecorderError, Result};
use crate::geo::GeoSample;
use crate::gps::source::{FixErrorHandler, FixHandler, LocationSource, Subscription, WatchOptions};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
};

#[derive(Debug, Deserialize)]
struct GpsdMessage {
    class: String,
    #[serde(flatten)]
    data: HashMap<String, serde_json::Value>,
}

/// Location source backed by a gpsd daemon.
///
/// The TCP connection and WATCH handshake happen in [`connect`], so a missing
/// daemon surfaces as [`RecorderError::GeolocationUnavailable`] before any
/// session starts. The stream is consumed by the first subscription.
///
/// [`connect`]: GpsdSource::connect
pub struct GpsdSource {
    reader: Mutex<Option<BufReader<TcpStream>>>,
}

impl GpsdSource {
    /// Connect to a gpsd daemon and enable the JSON watch.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let mut stream = TcpStream::connect(format!("{}:{}", host, port))
            .await
            .map_err(|_| RecorderError::GeolocationUnavailable)?;

        // Send WATCH command to start receiving JSON data
        let watch_cmd = "?WATCH={\"enable\":true,\"json\":true}\n";
        stream
            .write_all(watch_cmd.as_bytes())
            .await
            .map_err(|e| RecorderError::Connection(format!("Failed to send WATCH command: {}", e)))?;

        Ok(Self {
            reader: Mutex::new(Some(BufReader::new(stream))),
        })
    }
}

impl LocationSource for GpsdSource {
    fn subscribe(
        &self,
        options: WatchOptions,
        mut on_fix: FixHandler,
        mut on_error: FixErrorHandler,
    ) -> Result<Subscription> {
        let mut reader = self
            .reader
            .lock()
            .unwrap()
            .take()
            .ok_or(RecorderError::GeolocationUnavailable)?;

        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);
        let timeout = options.timeout;

        let task = tokio::spawn(async move {
            let mut line = String::new();

            while flag.load(Ordering::SeqCst) {
                line.clear();
                match tokio::time::timeout(timeout, reader.read_line(&mut line)).await {
                    Err(_) => {
                        on_error(RecorderError::Fix("timed out waiting for a fix".to_string()));
                    }
                    Ok(Ok(0)) => {
                        on_error(RecorderError::Connection(
                            "gpsd closed the connection".to_string(),
                        ));
                        break;
                    }
                    Ok(Ok(_)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match parse_gpsd_line(line) {
                            Ok(Some(sample)) => {
                                if flag.load(Ordering::SeqCst) {
                                    on_fix(sample);
                                }
                            }
                            Ok(None) => {}
                            Err(e) => on_error(e),
                        }
                    }
                    Ok(Err(e)) => {
                        on_error(RecorderError::Io(e));
                        break;
                    }
                }
            }
        });

        Ok(Subscription::new(active, Some(task)))
    }
}

/// Parse one line of gpsd JSON. Only TPV reports with a position yield a
/// sample; every other message class is ignored.
pub fn parse_gpsd_line(line: &str) -> Result<Option<GeoSample>> {
    let msg: GpsdMessage = serde_json::from_str(line)
        .map_err(|e| RecorderError::Parse(format!("Failed to parse gpsd JSON: {}", e)))?;

    if msg.class != "TPV" {
        return Ok(None);
    }

    let lat = msg.data.get("lat").and_then(|v| v.as_f64());
    let lon = msg.data.get("lon").and_then(|v| v.as_f64());
    let (lat, lon) = match (lat, lon) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => return Ok(None), // TPV without a position, e.g. mode 1
    };

    // Horizontal error: prefer the combined eph estimate, fall back to the
    // worse of the per-axis estimates.
    let accuracy_m = msg
        .data
        .get("eph")
        .and_then(|v| v.as_f64())
        .or_else(|| {
            let epx = msg.data.get("epx").and_then(|v| v.as_f64());
            let epy = msg.data.get("epy").and_then(|v| v.as_f64());
            match (epx, epy) {
                (Some(x), Some(y)) => Some(x.max(y)),
                (Some(x), None) => Some(x),
                (None, Some(y)) => Some(y),
                (None, None) => None,
            }
        });

    let captured_at = msg
        .data
        .get("time")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Ok(Some(GeoSample {
        latitude: lat,
        longitude: lon,
        accuracy_m,
        captured_at,
    }))
}
