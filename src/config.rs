// src/config.rs
//! Recorder configuration with file-backed storage

use crate::error::{RecorderError, Result};
use serde::{Deserialize, Serialize};

/// Default accuracy-rejection threshold in meters. Fixes reporting a larger
/// horizontal error radius are discarded.
pub const DEFAULT_ACCURACY_LIMIT_M: f64 = 100.0;

/// Default minimum displacement between consecutive track points, in
/// kilometers (3 m). Filters stationary GPS jitter out of the accumulator.
pub const DEFAULT_MIN_DISPLACEMENT_KM: f64 = 0.003;

/// Default per-fix read timeout in milliseconds.
pub const DEFAULT_FIX_TIMEOUT_MS: u64 = 15_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    pub source_type: String, // "gpsd" or "serial"
    pub gpsd_host: Option<String>,
    pub gpsd_port: Option<u16>,
    pub serial_port: Option<String>,
    pub serial_baudrate: Option<u32>,
    /// Fixes with a reported accuracy radius above this are rejected (meters).
    pub accuracy_limit_m: f64,
    /// Minimum displacement from the previous point to accept a fix (km).
    pub min_displacement_km: f64,
    /// Per-fix read timeout handed to the location source (milliseconds).
    pub fix_timeout_ms: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            source_type: "gpsd".to_string(),
            gpsd_host: Some("localhost".to_string()),
            gpsd_port: Some(2947),
            serial_port: None,
            serial_baudrate: Some(9600),
            accuracy_limit_m: DEFAULT_ACCURACY_LIMIT_M,
            min_displacement_km: DEFAULT_MIN_DISPLACEMENT_KM,
            fix_timeout_ms: DEFAULT_FIX_TIMEOUT_MS,
        }
    }
}

impl RecorderConfig {
    /// Load configuration from the config file, falling back to defaults when
    /// the file does not exist.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .map_err(|e| RecorderError::Other(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| RecorderError::Other(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to the config file, creating the directory if needed.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RecorderError::Other(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| RecorderError::Other(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)
            .map_err(|e| RecorderError::Other(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn config_path() -> Result<std::path::PathBuf> {
        use std::path::PathBuf;

        let home = std::env::var("HOME")
            .map_err(|_| RecorderError::Other("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("ride-recorder")
            .join("config.json"))
    }

    /// Update gpsd settings
    pub fn update_gpsd(&mut self, host: String, port: u16) {
        self.source_type = "gpsd".to_string();
        self.gpsd_host = Some(host);
        self.gpsd_port = Some(port);
    }

    /// Update serial port settings
    pub fn update_serial(&mut self, port: String, baudrate: u32) {
        self.source_type = "serial".to_string();
        self.serial_port = Some(port);
        self.serial_baudrate = Some(baudrate);
    }
}
