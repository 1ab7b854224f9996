// src/gps/mod.rs
//! Continuous location sources and the subscription contract

pub mod gpsd;
pub mod nmea;
pub mod source;

pub use gpsd::GpsdSource;
pub use nmea::NmeaSerialSource;
pub use source::{FixErrorHandler, FixHandler, LocationSource, Subscription, WatchOptions};
