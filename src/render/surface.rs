// src/render/surface.rs
//! Map surface capability interface
//!
//! The renderer never talks to a mapping library directly; it drives this
//! small trait so any engine can back it. Layer handles are opaque and only
//! valid for the surface that issued them.

use crate::geo::GeoBounds;

/// Opaque handle to a drawn layer (polyline or marker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Fixed marker at the first point of the route.
    Start,
    /// Marker tracking the newest point of the route.
    Position,
}

/// A drawing and camera backend for one map view.
pub trait MapSurface {
    /// Center the camera on a lat/lon at the given zoom level.
    fn set_viewport(&mut self, center: (f64, f64), zoom: u8);

    /// Frame the camera around a bounding box.
    fn fit_bounds(&mut self, bounds: GeoBounds);

    /// Create a polyline layer from an ordered vertex list.
    fn create_polyline(&mut self, vertices: &[(f64, f64)]) -> LayerId;

    /// Replace the vertex list of an existing polyline in place.
    fn update_polyline(&mut self, layer: LayerId, vertices: &[(f64, f64)]);

    /// Move an existing marker, or create one when `existing` is `None`.
    fn upsert_marker(
        &mut self,
        existing: Option<LayerId>,
        kind: MarkerKind,
        at: (f64, f64),
    ) -> LayerId;

    /// Remove a single layer.
    fn remove_layer(&mut self, layer: LayerId);

    /// Remove every route layer, leaving the base map visible.
    fn clear_layers(&mut self);

    /// Release all platform resources. Called once, when the owning view is
    /// torn down.
    fn destroy(&mut self);
}
