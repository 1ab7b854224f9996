// src/display/mod.rs
//! Live status display for the recording CLI

pub mod terminal;

pub use terminal::{TerminalStatusDisplay, TrackStatus};
