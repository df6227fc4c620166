//! housemap core library
//!
//! Visited points, drawn routes, the navigation signal bus and the map and
//! list surfaces that keep them in sync with local storage.

pub mod types;
pub mod store;
pub mod repository;
pub mod routes;
pub mod nav;
pub mod geolocation;
pub mod prompt;
pub mod widget;
pub mod controller;
pub mod list;
pub mod app;

// Re-export commonly used types
pub use types::{JumpRequest, LatLng, PointId, View, VisitedPoint};
pub use store::{FileStore, KeyValueStore, MemoryStore, SharedStore, StoreError, StoreResult};
pub use repository::PointRepository;
pub use routes::{GeoJson, RouteLayer, RouteLine, RoutePolicy, RouteRepository};
pub use nav::{JumpSubscription, NavigationBus};
pub use geolocation::{
    FixedGeolocator, GeolocationError, Geolocator, PositionOptions, UnavailableGeolocator,
};
pub use prompt::{RecordingPrompt, UserPrompt};
pub use widget::{DrawControl, HeadlessMap, MapWidget, Marker};
pub use controller::{MapCommand, MapError, MapHandle, MapState, MapSurfaceController};
pub use list::{ListError, ListSurface, PointEdit};
pub use app::{App, MapSettings, SurfaceContext};

/// Version information for the housemap core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
