//! Map widget abstraction and a headless implementation.

use crate::routes::RouteLayer;
use crate::types::{LatLng, PointId, VisitedPoint, Zoom};

/// A point marker with its popup text.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: PointId,
    pub position: LatLng,
    pub popup: String,
}

impl Marker {
    /// Marker for a point loaded from storage.
    pub fn for_point(point: &VisitedPoint) -> Self {
        Self {
            id: point.id,
            position: point.position(),
            popup: format!("{}\nVisited", point.title()),
        }
    }

    /// Marker for a point created from a location fix in this session.
    pub fn for_new_visit(point: &VisitedPoint) -> Self {
        let when = point
            .visited_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_default();
        Self {
            id: point.id,
            position: point.position(),
            popup: format!("{} - Visited\n{}", point.title(), when).trim_end().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: String,
    pub weight: u32,
    pub opacity: f32,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self { color: "red".to_string(), weight: 5, opacity: 0.8 }
    }
}

/// Drawing tools offered on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawControl {
    pub polyline: Option<LineStyle>,
    pub polygon: bool,
    pub rectangle: bool,
    pub circle: bool,
    pub circle_marker: bool,
    pub marker: bool,
    pub edit: bool,
    pub remove: bool,
}

impl DrawControl {
    /// Line drawing only, with edit and remove enabled.
    pub fn lines_only() -> Self {
        Self {
            polyline: Some(LineStyle::default()),
            polygon: false,
            rectangle: false,
            circle: false,
            circle_marker: false,
            marker: false,
            edit: true,
            remove: true,
        }
    }
}

pub trait MapWidget {
    /// Construct the map at `center`. Called once per widget.
    fn mount(&mut self, center: LatLng, zoom: Zoom);
    fn add_marker(&mut self, marker: &Marker);
    fn remove_marker(&mut self, id: PointId);
    /// Animated re-centering.
    fn fly_to(&mut self, center: LatLng, zoom: Zoom);
    fn attach_draw_control(&mut self, control: &DrawControl);
    /// Replace the drawn overlay with `layer`.
    fn show_routes(&mut self, layer: &RouteLayer);
}

/// Widget that renders nothing and remembers what it was told.
#[derive(Debug, Clone, Default)]
pub struct HeadlessMap {
    pub mount_count: usize,
    pub center: Option<LatLng>,
    pub zoom: Option<Zoom>,
    pub markers: Vec<Marker>,
    pub draw_control: Option<DrawControl>,
    pub routes: RouteLayer,
    pub flights: Vec<(LatLng, Zoom)>,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.mount_count > 0
    }

    pub fn marker(&self, id: PointId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }
}

impl MapWidget for HeadlessMap {
    fn mount(&mut self, center: LatLng, zoom: Zoom) {
        self.mount_count += 1;
        self.center = Some(center);
        self.zoom = Some(zoom);
    }

    fn add_marker(&mut self, marker: &Marker) {
        self.markers.push(marker.clone());
    }

    fn remove_marker(&mut self, id: PointId) {
        self.markers.retain(|m| m.id != id);
    }

    fn fly_to(&mut self, center: LatLng, zoom: Zoom) {
        self.center = Some(center);
        self.zoom = Some(zoom);
        self.flights.push((center, zoom));
    }

    fn attach_draw_control(&mut self, control: &DrawControl) {
        self.draw_control = Some(control.clone());
    }

    fn show_routes(&mut self, layer: &RouteLayer) {
        self.routes = layer.clone();
    }
}
