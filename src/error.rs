// src/error.rs
//! Error types for the route recorder

use std::fmt;

pub type Result<T> = std::result::Result<T, RecorderError>;

#[derive(Debug)]
pub enum RecorderError {
    Io(std::io::Error),
    Serial(tokio_serial::Error),
    Json(serde_json::Error),
    Connection(String),
    Parse(String),
    /// The configured source exposes no location capability.
    GeolocationUnavailable,
    /// An individual fix attempt failed or timed out; recording continues.
    Fix(String),
    /// start() called while a session is already recording.
    AlreadyRecording,
    /// stop() called with no active session.
    NotRecording,
    /// Fewer than 2 accepted points or negligible distance at stop().
    InsufficientTrackData,
    /// The persistence collaborator rejected the finished route.
    Persistence(String),
    Other(String),
}

impl fmt::Display for RecorderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecorderError::Io(e) => write!(f, "IO error: {}", e),
            RecorderError::Serial(e) => write!(f, "Serial error: {}", e),
            RecorderError::Json(e) => write!(f, "JSON error: {}", e),
            RecorderError::Connection(msg) => write!(f, "Connection error: {}", msg),
            RecorderError::Parse(msg) => write!(f, "Parse error: {}", msg),
            RecorderError::GeolocationUnavailable => {
                write!(f, "No location capability available")
            }
            RecorderError::Fix(msg) => write!(f, "Fix error: {}", msg),
            RecorderError::AlreadyRecording => {
                write!(f, "A recording session is already active")
            }
            RecorderError::NotRecording => write!(f, "No recording session is active"),
            RecorderError::InsufficientTrackData => {
                write!(f, "Not enough track data to save the route")
            }
            RecorderError::Persistence(msg) => write!(f, "Persistence error: {}", msg),
            RecorderError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for RecorderError {}

impl From<std::io::Error> for RecorderError {
    fn from(error: std::io::Error) -> Self {
        RecorderError::Io(error)
    }
}

impl From<tokio_serial::Error> for RecorderError {
    fn from(error: tokio_serial::Error) -> Self {
        RecorderError::Serial(error)
    }
}

impl From<serde_json::Error> for RecorderError {
    fn from(error: serde_json::Error) -> Self {
        RecorderError::Json(error)
    }
}

impl From<anyhow::Error> for RecorderError {
    fn from(error: anyhow::Error) -> Self {
        RecorderError::Other(error.to_string())
    }
}
