// src/render/view.rs
//! Track view: draws a point sequence as a route on a map surface

use crate::geo::{GeoBounds, TrackPoint};
use crate::render::surface::{LayerId, MapSurface, MarkerKind};

/// Zoom used when the route is a single point.
const SINGLE_POINT_ZOOM: u8 = 18;

/// Zoom used while following the newest point in live mode.
const FOLLOW_ZOOM: u8 = 16;

/// Camera behavior, chosen at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Re-center on the newest point on every update. Used while recording.
    Live,
    /// Fit the full route's bounding box once per meaningfully changed
    /// route; user panning and zooming is never overridden in between.
    Review,
}

/// Renders an ordered point sequence as a polyline with start and
/// current-position markers.
///
/// The view supports both a growing stream (live recording) and a static
/// full set (reviewing a saved route); callers just pass the latest
/// sequence to [`set_points`] on every change. Layers are updated in place
/// rather than recreated, so redrawing an unchanged sequence is free of
/// flicker and allocation on the surface side.
///
/// [`set_points`]: TrackView::set_points
pub struct TrackView<S: MapSurface> {
    surface: S,
    mode: ViewMode,
    polyline: Option<LayerId>,
    start_marker: Option<LayerId>,
    position_marker: Option<LayerId>,
    /// (len, last timestamp) of the route the camera was last fitted to.
    fitted: Option<(usize, i64)>,
}

impl<S: MapSurface> TrackView<S> {
    pub fn new(surface: S, mode: ViewMode) -> Self {
        Self {
            surface,
            mode,
            polyline: None,
            start_marker: None,
            position_marker: None,
            fitted: None,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Redraw for the given point sequence.
    pub fn set_points(&mut self, points: &[TrackPoint]) {
        if points.is_empty() {
            self.clear();
            return;
        }

        let vertices: Vec<(f64, f64)> = points.iter().map(|p| p.lat_lon()).collect();

        if points.len() == 1 {
            // A route needs two points to draw a line; markers only.
            if let Some(layer) = self.polyline.take() {
                self.surface.remove_layer(layer);
            }
            let at = vertices[0];
            self.start_marker =
                Some(self.surface.upsert_marker(self.start_marker, MarkerKind::Start, at));
            self.position_marker = Some(self.surface.upsert_marker(
                self.position_marker,
                MarkerKind::Position,
                at,
            ));
            self.surface.set_viewport(at, SINGLE_POINT_ZOOM);
            self.fitted = None;
            return;
        }

        match self.polyline {
            Some(layer) => self.surface.update_polyline(layer, &vertices),
            None => self.polyline = Some(self.surface.create_polyline(&vertices)),
        }

        // The start marker never moves once created
        if self.start_marker.is_none() {
            self.start_marker =
                Some(self.surface.upsert_marker(None, MarkerKind::Start, vertices[0]));
        }

        let newest = vertices[vertices.len() - 1];
        self.position_marker = Some(self.surface.upsert_marker(
            self.position_marker,
            MarkerKind::Position,
            newest,
        ));

        match self.mode {
            ViewMode::Live => self.surface.set_viewport(newest, FOLLOW_ZOOM),
            ViewMode::Review => {
                let fingerprint = (points.len(), points[points.len() - 1].timestamp);
                if self.fitted != Some(fingerprint) {
                    if let Some(bounds) = GeoBounds::from_points(points) {
                        self.surface.fit_bounds(bounds);
                    }
                    self.fitted = Some(fingerprint);
                }
            }
        }
    }

    /// Re-frame the camera around the route on explicit request, e.g. a
    /// "recenter" control in review mode.
    pub fn refit(&mut self, points: &[TrackPoint]) {
        if let Some(bounds) = GeoBounds::from_points(points) {
            self.surface.fit_bounds(bounds);
            self.fitted = Some((points.len(), points[points.len() - 1].timestamp));
        }
    }

    /// Remove all route layers, leaving the base map visible.
    pub fn clear(&mut self) {
        if self.polyline.is_some() || self.start_marker.is_some() || self.position_marker.is_some()
        {
            self.surface.clear_layers();
        }
        self.polyline = None;
        self.start_marker = None;
        self.position_marker = None;
        self.fitted = None;
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

impl<S: MapSurface> Drop for TrackView<S> {
    fn drop(&mut self) {
        self.surface.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct SurfaceStats {
        polylines_created: usize,
        polyline_updates: usize,
        markers_created: usize,
        marker_moves: usize,
        viewports: Vec<((f64, f64), u8)>,
        fits: usize,
        removed: usize,
        cleared: usize,
        destroyed: usize,
        live_layers: usize,
        last_polyline: Vec<(f64, f64)>,
    }

    /// MapSurface double that records every call.
    struct RecordingSurface {
        next_id: u64,
        stats: Arc<Mutex<SurfaceStats>>,
    }

    impl RecordingSurface {
        fn new() -> (Self, Arc<Mutex<SurfaceStats>>) {
            let stats = Arc::new(Mutex::new(SurfaceStats::default()));
            (
                Self {
                    next_id: 0,
                    stats: Arc::clone(&stats),
                },
                stats,
            )
        }

        fn next_layer(&mut self) -> LayerId {
            self.next_id += 1;
            LayerId(self.next_id)
        }
    }

    impl MapSurface for RecordingSurface {
        fn set_viewport(&mut self, center: (f64, f64), zoom: u8) {
            self.stats.lock().unwrap().viewports.push((center, zoom));
        }

        fn fit_bounds(&mut self, _bounds: GeoBounds) {
            self.stats.lock().unwrap().fits += 1;
        }

        fn create_polyline(&mut self, vertices: &[(f64, f64)]) -> LayerId {
            let mut stats = self.stats.lock().unwrap();
            stats.polylines_created += 1;
            stats.live_layers += 1;
            stats.last_polyline = vertices.to_vec();
            drop(stats);
            self.next_layer()
        }

        fn update_polyline(&mut self, _layer: LayerId, vertices: &[(f64, f64)]) {
            let mut stats = self.stats.lock().unwrap();
            stats.polyline_updates += 1;
            stats.last_polyline = vertices.to_vec();
        }

        fn upsert_marker(
            &mut self,
            existing: Option<LayerId>,
            _kind: MarkerKind,
            _at: (f64, f64),
        ) -> LayerId {
            match existing {
                Some(layer) => {
                    self.stats.lock().unwrap().marker_moves += 1;
                    layer
                }
                None => {
                    let mut stats = self.stats.lock().unwrap();
                    stats.markers_created += 1;
                    stats.live_layers += 1;
                    drop(stats);
                    self.next_layer()
                }
            }
        }

        fn remove_layer(&mut self, _layer: LayerId) {
            let mut stats = self.stats.lock().unwrap();
            stats.removed += 1;
            stats.live_layers -= 1;
        }

        fn clear_layers(&mut self) {
            let mut stats = self.stats.lock().unwrap();
            stats.cleared += 1;
            stats.live_layers = 0;
        }

        fn destroy(&mut self) {
            self.stats.lock().unwrap().destroyed += 1;
        }
    }

    fn point(lat: f64, lon: f64, timestamp: i64) -> TrackPoint {
        TrackPoint {
            latitude: lat,
            longitude: lon,
            timestamp,
        }
    }

    fn track(n: usize) -> Vec<TrackPoint> {
        (0..n)
            .map(|i| point(0.0, i as f64 * 0.001, i as i64 * 1000))
            .collect()
    }

    #[test]
    fn test_first_draw_creates_polyline_and_markers() {
        let (surface, stats) = RecordingSurface::new();
        let mut view = TrackView::new(surface, ViewMode::Live);

        view.set_points(&track(3));

        let stats = stats.lock().unwrap();
        assert_eq!(stats.polylines_created, 1);
        assert_eq!(stats.markers_created, 2);
        assert_eq!(stats.last_polyline.len(), 3);
    }

    #[test]
    fn test_redraw_reuses_layers() {
        let (surface, stats) = RecordingSurface::new();
        let mut view = TrackView::new(surface, ViewMode::Live);

        let points = track(3);
        view.set_points(&points);
        view.set_points(&points);
        view.set_points(&points);

        let stats = stats.lock().unwrap();
        // Layers created once, updated in place afterwards
        assert_eq!(stats.polylines_created, 1);
        assert_eq!(stats.markers_created, 2);
        assert_eq!(stats.polyline_updates, 2);
        assert_eq!(stats.marker_moves, 2); // position marker only; start marker never
    }

    #[test]
    fn test_growing_sequence_updates_in_place() {
        let (surface, stats) = RecordingSurface::new();
        let mut view = TrackView::new(surface, ViewMode::Live);

        for n in 2..=6 {
            view.set_points(&track(n));
        }

        let stats = stats.lock().unwrap();
        assert_eq!(stats.polylines_created, 1);
        assert_eq!(stats.polyline_updates, 4);
        assert_eq!(stats.last_polyline.len(), 6);
    }

    #[test]
    fn test_empty_sequence_clears_layers() {
        let (surface, stats) = RecordingSurface::new();
        let mut view = TrackView::new(surface, ViewMode::Live);

        view.set_points(&track(4));
        view.set_points(&[]);

        {
            let stats = stats.lock().unwrap();
            assert_eq!(stats.cleared, 1);
            assert_eq!(stats.live_layers, 0);
        }

        // Clearing again is a no-op on the surface
        view.set_points(&[]);
        assert_eq!(stats.lock().unwrap().cleared, 1);

        // A later draw recreates everything
        view.set_points(&track(2));
        let stats = stats.lock().unwrap();
        assert_eq!(stats.polylines_created, 2);
        assert_eq!(stats.markers_created, 4);
    }

    #[test]
    fn test_single_point_has_no_polyline() {
        let (surface, stats) = RecordingSurface::new();
        let mut view = TrackView::new(surface, ViewMode::Live);

        view.set_points(&track(1));

        let stats = stats.lock().unwrap();
        assert_eq!(stats.polylines_created, 0);
        assert_eq!(stats.markers_created, 2);
        // Tight zoom on the lone point
        assert_eq!(stats.viewports.last().unwrap().1, 18);
    }

    #[test]
    fn test_live_mode_follows_newest_point() {
        let (surface, stats) = RecordingSurface::new();
        let mut view = TrackView::new(surface, ViewMode::Live);

        view.set_points(&track(2));
        view.set_points(&track(3));

        let stats = stats.lock().unwrap();
        assert_eq!(stats.viewports.len(), 2);
        let (center, _) = stats.viewports[1];
        assert_eq!(center, (0.0, 0.002));
        assert_eq!(stats.fits, 0);
    }

    #[test]
    fn test_review_mode_fits_once_per_route() {
        let (surface, stats) = RecordingSurface::new();
        let mut view = TrackView::new(surface, ViewMode::Review);

        let points = track(4);
        view.set_points(&points);
        view.set_points(&points); // unchanged, no refit
        view.set_points(&track(5)); // changed route

        let stats = stats.lock().unwrap();
        assert_eq!(stats.fits, 2);
        // Review never auto-pans
        assert!(stats.viewports.is_empty());
    }

    #[test]
    fn test_explicit_refit() {
        let (surface, stats) = RecordingSurface::new();
        let mut view = TrackView::new(surface, ViewMode::Review);

        let points = track(4);
        view.set_points(&points);
        view.refit(&points);

        assert_eq!(stats.lock().unwrap().fits, 2);
    }

    #[test]
    fn test_surface_destroyed_once_on_drop() {
        let (surface, stats) = RecordingSurface::new();
        {
            let mut view = TrackView::new(surface, ViewMode::Live);
            view.set_points(&track(3));
        }
        assert_eq!(stats.lock().unwrap().destroyed, 1);
    }
}
