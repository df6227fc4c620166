//! Composition root
//!
//! `App` owns the persistent store, the session store, both repositories and
//! the navigation bus, and hands the same instances to every surface it
//! creates. Surfaces never reach for storage on their own.

use crate::controller::MapSurfaceController;
use crate::geolocation::{Geolocator, PositionOptions};
use crate::list::ListSurface;
use crate::nav::NavigationBus;
use crate::prompt::UserPrompt;
use crate::repository::PointRepository;
use crate::routes::{RoutePolicy, RouteRepository};
use crate::store::{MemoryStore, SharedStore};
use crate::types::{LatLng, Zoom, FALLBACK_CENTER, FALLBACK_ZOOM, JUMP_ZOOM, LOCATED_ZOOM};
use crate::widget::MapWidget;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub fallback_center: LatLng,
    pub fallback_zoom: Zoom,
    pub located_zoom: Zoom,
    /// Zoom used for jump requests that do not carry one.
    pub jump_zoom: Zoom,
    pub position: PositionOptions,
    pub route_policy: RoutePolicy,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            fallback_center: FALLBACK_CENTER,
            fallback_zoom: FALLBACK_ZOOM,
            located_zoom: LOCATED_ZOOM,
            jump_zoom: JUMP_ZOOM,
            position: PositionOptions::default(),
            route_policy: RoutePolicy::default(),
        }
    }
}

/// Shared services handed to each surface.
#[derive(Clone)]
pub struct SurfaceContext {
    pub points: PointRepository,
    pub routes: RouteRepository,
    pub nav: NavigationBus,
    pub session: SharedStore,
    pub settings: MapSettings,
}

pub struct App {
    store: SharedStore,
    context: SurfaceContext,
}

impl App {
    pub fn new(store: SharedStore, settings: MapSettings) -> Self {
        let session: SharedStore = Arc::new(MemoryStore::new());
        let context = SurfaceContext {
            points: PointRepository::new(store.clone()),
            routes: RouteRepository::new(store.clone()),
            nav: NavigationBus::new(),
            session,
            settings,
        };
        Self { store, context }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn context(&self) -> &SurfaceContext {
        &self.context
    }

    pub fn points(&self) -> &PointRepository {
        &self.context.points
    }

    pub fn routes(&self) -> &RouteRepository {
        &self.context.routes
    }

    pub fn nav(&self) -> &NavigationBus {
        &self.context.nav
    }

    pub fn settings(&self) -> &MapSettings {
        &self.context.settings
    }

    pub fn map_surface<G, W, P>(
        &self,
        geolocator: G,
        widget: W,
        prompt: P,
    ) -> MapSurfaceController<G, W, P>
    where
        G: Geolocator,
        W: MapWidget,
        P: UserPrompt,
    {
        MapSurfaceController::new(&self.context, geolocator, widget, prompt)
    }

    pub fn list_surface<P: UserPrompt>(&self, prompt: P) -> ListSurface<P> {
        ListSurface::new(&self.context, prompt)
    }
}
