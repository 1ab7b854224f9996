// src/gps/nmea.rs
//! Serial NMEA continuous location source

use crate::error::{RecorderError, Result};
use crate::geo::GeoSample;
use crate::gps::source::{FixErrorHandler, FixHandler, LocationSource, Subscription, WatchOptions};
use chrono::Utc;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Rough horizontal error in meters per unit of HDOP for a consumer receiver.
const HDOP_UERE_M: f64 = 5.0;

/// Location source reading NMEA sentences from a serial GPS receiver.
///
/// Only `GGA` sentences carry a position fix; everything else on the wire is
/// ignored. The port is consumed by the first subscription.
pub struct NmeaSerialSource {
    stream: Mutex<Option<SerialStream>>,
}

impl NmeaSerialSource {
    /// Open the serial port the receiver is attached to.
    pub fn open(port: &str, baudrate: u32) -> Result<Self> {
        let stream = tokio_serial::new(port, baudrate)
            .open_native_async()
            .map_err(|_| RecorderError::GeolocationUnavailable)?;

        Ok(Self {
            stream: Mutex::new(Some(stream)),
        })
    }
}

impl LocationSource for NmeaSerialSource {
    fn subscribe(
        &self,
        options: WatchOptions,
        mut on_fix: FixHandler,
        mut on_error: FixErrorHandler,
    ) -> Result<Subscription> {
        let stream = self
            .stream
            .lock()
            .unwrap()
            .take()
            .ok_or(RecorderError::GeolocationUnavailable)?;

        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);
        let timeout = options.timeout;

        let task = tokio::spawn(async move {
            let mut reader = BufReader::new(stream);
            let mut line = String::new();

            while flag.load(Ordering::SeqCst) {
                line.clear();
                match tokio::time::timeout(timeout, reader.read_line(&mut line)).await {
                    Err(_) => {
                        on_error(RecorderError::Fix("timed out waiting for a fix".to_string()));
                    }
                    Ok(Ok(0)) => {
                        on_error(RecorderError::Connection(
                            "serial port closed".to_string(),
                        ));
                        break;
                    }
                    Ok(Ok(_)) => {
                        let line = line.trim();
                        if let Some(sample) = parse_gga_sentence(line) {
                            if flag.load(Ordering::SeqCst) {
                                on_fix(sample);
                            }
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

/// Parse a `$GPGGA`/`$GNGGA` sentence into a sample. Returns `None` for other
/// sentence types, sentences without a fix, or malformed fields.
pub fn parse_gga_sentence(line: &str) -> Option<GeoSample> {
    if !line.starts_with("$GPGGA") && !line.starts_with("$GNGGA") {
        return None;
    }

    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 15 {
        return None;
    }

    // Fix quality (field 6): 0 means no fix at all
    let quality: u8 = parts[6].parse().ok()?;
    if quality == 0 {
        return None;
    }

    let latitude = parse_coordinate(parts[2], parts[3], "S")?;
    let longitude = parse_coordinate(parts[4], parts[5], "W")?;

    // HDOP (field 8) scaled to an error radius estimate
    let accuracy_m = parts[8].parse::<f64>().ok().map(|hdop| hdop * HDOP_UERE_M);

    Some(GeoSample {
        latitude,
        longitude,
        accuracy_m,
        captured_at: Utc::now(),
    })
}

/// Convert an NMEA ddmm.mmmm field plus hemisphere into signed degrees.
fn parse_coordinate(value: &str, hemisphere: &str, negative: &str) -> Option<f64> {
    if value.is_empty() || hemisphere.is_empty() {
        return None;
    }

    let raw: f64 = value.parse().ok()?;
    let degrees = (raw / 100.0) as i32;
    let minutes = raw % 100.0;
    let mut coordinate = degrees as f64 + minutes / 60.0;
    if hemisphere == negative {
        coordinate = -coordinate;
    }
    Some(coordinate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gga_parsing() {
        let gga = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";

        let sample = parse_gga_sentence(gga).unwrap();
        assert!((sample.latitude - 48.1173).abs() < 0.0001);
        assert!((sample.longitude - 11.5166).abs() < 0.0001);
        assert_eq!(sample.accuracy_m, Some(4.5)); // hdop 0.9 * 5 m
        assert!(sample.position_valid());
    }

    #[test]
    fn test_gga_southern_western_hemispheres() {
        let gga = "$GNGGA,123519,1651.000,S,04953.000,W,1,08,1.0,750.0,M,0.0,M,,*47";

        let sample = parse_gga_sentence(gga).unwrap();
        assert!(sample.latitude < 0.0);
        assert!(sample.longitude < 0.0);
        assert!((sample.latitude + 16.85).abs() < 0.001);
        assert!((sample.longitude + 49.8833).abs() < 0.001);
    }

    #[test]
    fn test_gga_without_fix_is_skipped() {
        let gga = "$GPGGA,123519,,,,,0,00,,,M,,M,,*47";
        assert!(parse_gga_sentence(gga).is_none());
    }

    #[test]
    fn test_other_sentences_are_skipped() {
        let rmc = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";
        assert!(parse_gga_sentence(rmc).is_none());
        assert!(parse_gga_sentence("$INVALID,123").is_none());
    }
}
