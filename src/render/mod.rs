// src/render/mod.rs
//! Live track rendering over an abstract map surface

pub mod surface;
pub mod view;

#[cfg(feature = "gui")]
pub mod egui;

pub use surface::{LayerId, MapSurface, MarkerKind};
pub use view::{TrackView, ViewMode};
