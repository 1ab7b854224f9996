// src/render/egui.rs
//! egui-backed map surface
//!
//! Retained-layer backend for immediate-mode rendering: the surface keeps
//! the layer set the [`TrackView`] drives, and [`paint`] projects it onto a
//! painter each frame using a web-mercator pixel grid. No tile fetching;
//! the route is drawn over whatever background the host application paints.
//!
//! [`TrackView`]: crate::render::view::TrackView
//! [`paint`]: EguiSurface::paint

use crate::geo::GeoBounds;
use crate::render::surface::{LayerId, MapSurface, MarkerKind};
use std::collections::BTreeMap;

const TILE_SIZE: f64 = 256.0;
const MAX_ZOOM: u8 = 18;

enum Layer {
    Polyline(Vec<(f64, f64)>),
    Marker { kind: MarkerKind, at: (f64, f64) },
}

/// A [`MapSurface`] that renders with an `egui::Painter`.
pub struct EguiSurface {
    center: (f64, f64),
    zoom: u8,
    next_id: u64,
    layers: BTreeMap<u64, Layer>,
}

impl EguiSurface {
    pub fn new(center: (f64, f64), zoom: u8) -> Self {
        Self {
            center,
            zoom,
            next_id: 0,
            layers: BTreeMap::new(),
        }
    }

    pub fn center(&self) -> (f64, f64) {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    fn next_layer(&mut self) -> LayerId {
        self.next_id += 1;
        LayerId(self.next_id)
    }

    /// Draw all retained layers onto the painter for this frame.
    pub fn paint(&self, painter: &egui::Painter, rect: egui::Rect) {
        for layer in self.layers.values() {
            match layer {
                Layer::Polyline(vertices) => {
                    let points: Vec<egui::Pos2> = vertices
                        .iter()
                        .map(|&(lat, lon)| self.lat_lon_to_screen(lat, lon, rect))
                        .collect();
                    if points.len() > 1 {
                        painter.add(egui::Shape::line(
                            points,
                            egui::Stroke::new(4.0, egui::Color32::from_rgb(234, 179, 8)),
                        ));
                    }
                }
                Layer::Marker { kind, at } => {
                    let pos = self.lat_lon_to_screen(at.0, at.1, rect);
                    match kind {
                        MarkerKind::Start => {
                            painter.circle_filled(pos, 5.0, egui::Color32::from_rgb(234, 179, 8));
                            painter.circle_stroke(
                                pos,
                                5.0,
                                egui::Stroke::new(2.0, egui::Color32::WHITE),
                            );
                        }
                        MarkerKind::Position => {
                            painter.circle_filled(pos, 8.0, egui::Color32::from_rgb(239, 68, 68));
                            painter.circle_stroke(
                                pos,
                                8.0,
                                egui::Stroke::new(2.0, egui::Color32::WHITE),
                            );
                        }
                    }
                }
            }
        }
    }

    fn world_pixels(lat: f64, lon: f64, zoom: u8) -> (f64, f64) {
        let n = 2_f64.powi(zoom as i32);
        let x = (lon + 180.0) / 360.0 * n * TILE_SIZE;
        let lat_rad = lat.to_radians();
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0
            * n
            * TILE_SIZE;
        (x, y)
    }

    fn lat_lon_to_screen(&self, lat: f64, lon: f64, rect: egui::Rect) -> egui::Pos2 {
        let (world_x, world_y) = Self::world_pixels(lat, lon, self.zoom);
        let (center_x, center_y) = Self::world_pixels(self.center.0, self.center.1, self.zoom);

        egui::pos2(
            rect.left() + rect.width() / 2.0 + (world_x - center_x) as f32,
            rect.top() + rect.height() / 2.0 + (world_y - center_y) as f32,
        )
    }
}

impl MapSurface for EguiSurface {
    fn set_viewport(&mut self, center: (f64, f64), zoom: u8) {
        self.center = center;
        self.zoom = zoom.min(MAX_ZOOM);
    }

    fn fit_bounds(&mut self, bounds: GeoBounds) {
        self.center = bounds.center();

        // Widest angular span decides the zoom; one tile covers
        // 360 / 2^z degrees of longitude.
        let span = (bounds.max_lat - bounds.min_lat)
            .max(bounds.max_lon - bounds.min_lon)
            .max(1e-4);
        let zoom = (360.0 / span).log2().floor();
        self.zoom = zoom.clamp(1.0, MAX_ZOOM as f64) as u8;
    }

    fn create_polyline(&mut self, vertices: &[(f64, f64)]) -> LayerId {
        let id = self.next_layer();
        self.layers.insert(id.0, Layer::Polyline(vertices.to_vec()));
        id
    }

    fn update_polyline(&mut self, layer: LayerId, vertices: &[(f64, f64)]) {
        if let Some(existing) = self.layers.get_mut(&layer.0) {
            *existing = Layer::Polyline(vertices.to_vec());
        }
    }

    fn upsert_marker(
        &mut self,
        existing: Option<LayerId>,
        kind: MarkerKind,
        at: (f64, f64),
    ) -> LayerId {
        let id = existing.unwrap_or_else(|| self.next_layer());
        self.layers.insert(id.0, Layer::Marker { kind, at });
        id
    }

    fn remove_layer(&mut self, layer: LayerId) {
        self.layers.remove(&layer.0);
    }

    fn clear_layers(&mut self) {
        self.layers.clear();
    }

    fn destroy(&mut self) {
        self.layers.clear();
    }
}
