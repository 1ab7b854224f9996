// src/lib.rs
//! Ride Recorder Library
//!
//! GPS route recording: continuous location sampling with accuracy and
//! displacement filtering, incremental great-circle distance accumulation,
//! live track rendering over an abstract map surface, and finished-route
//! summaries handed to a pluggable persistence collaborator.

pub mod config;
pub mod display;
pub mod error;
pub mod geo;
pub mod gps;
pub mod persist;
pub mod render;
pub mod tracker;

// Re-export main types for convenience
pub use config::RecorderConfig;
pub use error::{RecorderError, Result};
pub use geo::{GeoSample, TrackPoint};
pub use gps::{LocationSource, Subscription, WatchOptions};
pub use persist::{FileRouteStore, RouteFormat, RoutePersistence};
pub use render::{MapSurface, TrackView, ViewMode};
pub use tracker::{Difficulty, RouteRecorder, RouteSummary};
