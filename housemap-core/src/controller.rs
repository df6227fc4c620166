//! Map surface controller
//!
//! Owns the map widget, the markers shown on it, the manual placement mode
//! and the drawn route layer. Lifecycle:
//!
//! ```text
//! Uninitialized --initialize()--> Ready  (at the location fix, or at the
//!                                         fallback center on any failure)
//! Ready --toggle_placement()--> Ready + PlacingMarker
//! PlacingMarker --handle_click()--> Ready  (one point per activation)
//! ```
//!
//! The controller is subscribed to the navigation bus from construction, so
//! jump requests published before the map is ready are replayed once it is.

use crate::app::{MapSettings, SurfaceContext};
use crate::geolocation::{locate, Geolocator};
use crate::nav::{JumpSubscription, NavigationBus};
use crate::prompt::UserPrompt;
use crate::repository::PointRepository;
use crate::routes::{RouteError, RouteLayer, RouteLine, RouteRepository};
use crate::store::{SharedStore, StoreError, PLACEMENT_HINT_KEY};
use crate::types::{JumpRequest, LatLng, PointId, VisitedPoint, Zoom, MANUAL_PLACEMENT_LABEL};
use crate::widget::{DrawControl, MapWidget, Marker};
use chrono::Utc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

pub const PLACEMENT_HINT: &str = "Tap on the map to place a marker.";

#[derive(Debug, Error)]
pub enum MapError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    #[error("The map is not ready yet")]
    NotReady,

    #[error("The map is already initialized")]
    AlreadyInitialized,
}

impl MapError {
    /// Storage failures end the event loop; everything else is reported and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MapError::Store(_) | MapError::Route(RouteError::Store(_)))
    }
}

pub type MapResult<T> = Result<T, MapError>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapState {
    Uninitialized,
    Ready { center: LatLng, zoom: Zoom },
}

/// User interactions delivered to a running controller.
#[derive(Debug, Clone, PartialEq)]
pub enum MapCommand {
    MarkCurrentLocation,
    TogglePlacement,
    Click(LatLng),
    RouteCreated(Vec<LatLng>),
    RouteEdited { index: usize, line: RouteLine },
    RouteDeleted(Vec<usize>),
    /// Re-read the point collection and reconcile the markers.
    Refresh,
}

/// Sender side of a controller's command channel.
#[derive(Clone)]
pub struct MapHandle {
    commands: mpsc::UnboundedSender<MapCommand>,
    ready: watch::Receiver<bool>,
}

impl MapHandle {
    /// Queue a command. Returns `false` when the controller is gone.
    pub fn send(&self, command: MapCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Resolves once the map has been constructed. Returns `false` if the
    /// controller was dropped before that happened.
    pub async fn ready(&self) -> bool {
        let mut ready = self.ready.clone();
        let constructed = ready.wait_for(|r| *r).await.is_ok();
        constructed
    }
}

pub struct MapSurfaceController<G, W, P> {
    geolocator: G,
    widget: W,
    prompt: P,
    points: PointRepository,
    routes: RouteRepository,
    nav: NavigationBus,
    session: SharedStore,
    settings: MapSettings,
    state: MapState,
    placing: bool,
    layer: RouteLayer,
    shown: Vec<Marker>,
    last_id: PointId,
    jumps: JumpSubscription,
    ready: watch::Sender<bool>,
}

impl<G: Geolocator, W: MapWidget, P: UserPrompt> MapSurfaceController<G, W, P> {
    pub fn new(context: &SurfaceContext, geolocator: G, widget: W, prompt: P) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            geolocator,
            widget,
            prompt,
            points: context.points.clone(),
            routes: context.routes.clone(),
            nav: context.nav.clone(),
            session: context.session.clone(),
            settings: context.settings.clone(),
            state: MapState::Uninitialized,
            placing: false,
            layer: RouteLayer::new(),
            shown: Vec::new(),
            last_id: 0,
            jumps: context.nav.subscribe(),
            ready,
        }
    }

    /// Command channel for driving [`run`](Self::run).
    pub fn command_channel(&self) -> (MapHandle, mpsc::UnboundedReceiver<MapCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (MapHandle { commands: tx, ready: self.ready.subscribe() }, rx)
    }

    pub fn state(&self) -> MapState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, MapState::Ready { .. })
    }

    pub fn is_placing(&self) -> bool {
        self.placing
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn routes(&self) -> &RouteLayer {
        &self.layer
    }

    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    /// Resolve the initial center and construct the map.
    ///
    /// A failed or timed-out location request is reported to the user and
    /// the map opens at the fallback center instead. Stored points and
    /// routes are read before anything is mounted; the map is only marked
    /// ready once markers, routes and the draw control are in place.
    pub async fn initialize(&mut self) -> MapResult<MapState> {
        if self.is_ready() {
            return Err(MapError::AlreadyInitialized);
        }

        let (center, zoom) = match locate(&self.geolocator, &self.settings.position).await {
            Ok(position) => {
                log::info!("Located at {}", position);
                (position, self.settings.located_zoom)
            }
            Err(e) => {
                log::warn!("Geolocation failed ({}), using fallback center", e);
                self.prompt.alert(&e.user_message());
                (self.settings.fallback_center, self.settings.fallback_zoom)
            }
        };

        let points = self.points.list()?;
        let layer = self.routes.load()?.unwrap_or_default();

        self.widget.mount(center, zoom);
        self.last_id = points.iter().map(|p| p.id).max().unwrap_or(0);
        for point in &points {
            self.show_marker(Marker::for_point(point));
        }
        self.layer = layer;
        self.widget.show_routes(&self.layer);
        self.widget.attach_draw_control(&DrawControl::lines_only());

        self.state = MapState::Ready { center, zoom };
        self.ready.send_replace(true);

        log::info!(
            "Map ready at {} (zoom {}) with {} markers and {} route lines",
            center,
            zoom,
            points.len(),
            self.layer.lines().len()
        );
        Ok(self.state)
    }

    /// Create a point at the device position and fly to it.
    ///
    /// Returns `None` when the position could not be determined; the user has
    /// been notified in that case.
    pub async fn mark_current_location(&mut self) -> MapResult<Option<VisitedPoint>> {
        self.require_ready()?;
        let position = match locate(&self.geolocator, &self.settings.position).await {
            Ok(position) => position,
            Err(e) => {
                log::warn!("Mark current location failed: {}", e);
                self.prompt.alert(&e.user_message());
                return Ok(None);
            }
        };

        let point = self.new_point(position);
        self.points.add(point.clone())?;
        self.show_marker(Marker::for_new_visit(&point));
        self.fly_to(position, self.settings.located_zoom);
        log::info!("Marked current location {} as visited", position);
        Ok(Some(point))
    }

    /// Flip manual placement mode. Returns whether it is now active.
    pub fn toggle_placement(&mut self) -> MapResult<bool> {
        self.require_ready()?;
        self.placing = !self.placing;
        if self.placing && self.session.get(PLACEMENT_HINT_KEY)?.is_none() {
            self.prompt.alert(PLACEMENT_HINT);
            self.session.set(PLACEMENT_HINT_KEY, "true")?;
        }
        log::debug!("Manual placement {}", if self.placing { "on" } else { "off" });
        Ok(self.placing)
    }

    /// A click on the map. Creates a point only while placement mode is on,
    /// and leaves the mode afterwards.
    pub fn handle_click(&mut self, at: LatLng) -> MapResult<Option<VisitedPoint>> {
        if !self.placing {
            return Ok(None);
        }
        self.placing = false;

        let point = self.new_point(at).with_street(MANUAL_PLACEMENT_LABEL);
        self.points.add(point.clone())?;
        self.show_marker(Marker::for_new_visit(&point));
        log::info!("Placed marker {} at {}", point.id, at);
        Ok(Some(point))
    }

    pub fn route_created(&mut self, segment: Vec<LatLng>) -> MapResult<usize> {
        self.require_ready()?;
        let index = self.layer.record_created(segment, self.settings.route_policy)?;
        self.save_routes()?;
        Ok(index)
    }

    pub fn route_edited(&mut self, index: usize, line: RouteLine) -> MapResult<()> {
        self.require_ready()?;
        self.layer.record_edited(index, line)?;
        self.save_routes()
    }

    pub fn route_deleted(&mut self, indices: &[usize]) -> MapResult<usize> {
        self.require_ready()?;
        let removed = self.layer.record_deleted(indices)?;
        self.save_routes()?;
        Ok(removed)
    }

    /// Rebuild the markers from the stored collection. Markers whose point
    /// is gone, or whose popup no longer matches the stored labels, are
    /// removed; missing ones are added. Returns the number of markers added
    /// and removed (a relabelled marker counts as both).
    pub fn refresh_markers(&mut self) -> MapResult<(usize, usize)> {
        self.require_ready()?;
        let points = self.points.list()?;
        let wanted: Vec<Marker> = points.iter().map(Marker::for_point).collect();

        let stale: Vec<PointId> = self
            .shown
            .iter()
            .filter(|shown| !wanted.contains(shown))
            .map(|shown| shown.id)
            .collect();
        for id in &stale {
            self.widget.remove_marker(*id);
        }
        self.shown.retain(|shown| !stale.contains(&shown.id));

        let mut added = 0;
        for marker in wanted {
            if !self.shown.iter().any(|shown| shown.id == marker.id) {
                self.show_marker(marker);
                added += 1;
            }
        }
        if let Some(max) = points.iter().map(|p| p.id).max() {
            self.last_id = self.last_id.max(max);
        }
        Ok((added, stale.len()))
    }

    /// Fly to a jump request, then clear the bus. The bus is cleared even
    /// when the map is not constructed yet; the request is then dropped.
    pub fn apply_jump(&mut self, request: JumpRequest) {
        let zoom = request.zoom.unwrap_or(self.settings.jump_zoom);
        if self.is_ready() {
            self.fly_to(request.position(), zoom);
        } else {
            log::warn!("Jump to {} dropped: map not constructed", request.position());
        }
        self.nav.clear();
    }

    /// Apply every jump request already delivered. Nothing is consumed before
    /// the map is ready. Returns how many jumps were applied.
    pub fn process_jumps(&mut self) -> usize {
        if !self.is_ready() {
            return 0;
        }
        let mut applied = 0;
        while let Some(signal) = self.jumps.try_next() {
            if let Some(request) = signal {
                self.apply_jump(request);
                applied += 1;
            }
        }
        applied
    }

    pub async fn dispatch(&mut self, command: MapCommand) -> MapResult<()> {
        match command {
            MapCommand::MarkCurrentLocation => {
                self.mark_current_location().await?;
            }
            MapCommand::TogglePlacement => {
                self.toggle_placement()?;
            }
            MapCommand::Click(at) => {
                self.handle_click(at)?;
            }
            MapCommand::RouteCreated(segment) => {
                self.route_created(segment)?;
            }
            MapCommand::RouteEdited { index, line } => {
                self.route_edited(index, line)?;
            }
            MapCommand::RouteDeleted(indices) => {
                self.route_deleted(&indices)?;
            }
            MapCommand::Refresh => {
                self.refresh_markers()?;
            }
        }
        Ok(())
    }

    /// Event loop: construct the map, then serve jump requests and commands
    /// until the command channel closes. Returns the controller so callers
    /// can inspect the final state.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<MapCommand>,
    ) -> MapResult<Self> {
        if !self.is_ready() {
            self.initialize().await?;
        }
        loop {
            tokio::select! {
                biased;
                signal = self.jumps.next() => match signal {
                    Some(Some(request)) => self.apply_jump(request),
                    Some(None) => {}
                    None => break,
                },
                command = commands.recv() => match command {
                    Some(command) => {
                        if let Err(e) = self.dispatch(command).await {
                            if e.is_fatal() {
                                return Err(e);
                            }
                            log::warn!("Map command failed: {}", e);
                        }
                    }
                    None => break,
                },
            }
        }
        log::debug!("Map event loop finished");
        Ok(self)
    }

    fn require_ready(&self) -> MapResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(MapError::NotReady)
        }
    }

    fn new_point(&mut self, position: LatLng) -> VisitedPoint {
        let point = VisitedPoint::new_visit(position, Utc::now());
        let id = point.id.max(self.last_id + 1);
        self.last_id = id;
        point.with_id(id)
    }

    fn show_marker(&mut self, marker: Marker) {
        self.widget.add_marker(&marker);
        self.shown.push(marker);
    }

    fn fly_to(&mut self, center: LatLng, zoom: Zoom) {
        self.widget.fly_to(center, zoom);
        self.state = MapState::Ready { center, zoom };
    }

    fn save_routes(&mut self) -> MapResult<()> {
        self.widget.show_routes(&self.layer);
        self.routes.save(&self.layer)?;
        Ok(())
    }
}
