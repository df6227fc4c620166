use housemap_core::types::{FALLBACK_CENTER, FALLBACK_ZOOM};
use housemap_core::*;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn point(id: i64, lat: f64, lng: f64) -> VisitedPoint {
    VisitedPoint {
        id,
        street: None,
        number: None,
        visited: true,
        lat,
        lng,
        visited_at: None,
    }
}

fn memory_app() -> App {
    App::new(Arc::new(MemoryStore::new()), MapSettings::default())
}

/// Geolocator that never answers.
struct Silent;

impl Geolocator for Silent {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<LatLng, GeolocationError> {
        std::future::pending().await
    }
}

#[test]
fn add_then_list_returns_single_visited_point() {
    let app = memory_app();
    app.points().add(point(1, 40.0, -73.0)).unwrap();
    let points = app.points().list().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!((points[0].lat, points[0].lng), (40.0, -73.0));
    assert!(points[0].visited);
}

#[test]
fn update_changes_only_the_matching_point() {
    let app = memory_app();
    app.points().add(point(1, 40.0, -73.0)).unwrap();
    app.points().add(point(2, 42.0, -71.0)).unwrap();
    app.points().update(point(1, 41.0, -73.0)).unwrap();

    let points = app.points().list().unwrap();
    assert_eq!(points.iter().find(|p| p.id == 1).map(|p| p.lat), Some(41.0));
    assert_eq!(points.iter().find(|p| p.id == 2), Some(&point(2, 42.0, -71.0)));
}

#[tokio::test]
async fn empty_route_geometry_reloads_without_segments() {
    let app = memory_app();
    app.routes().save(&RouteLayer::new()).unwrap();

    let mut map = app.map_surface(
        FixedGeolocator::new(LatLng::new(1.0, 1.0)),
        HeadlessMap::new(),
        RecordingPrompt::new(true),
    );
    map.initialize().await.unwrap();
    assert_eq!(map.widget().routes.segment_count(), 0);
    assert_eq!(map.routes().segment_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn geolocation_timeout_reaches_ready_at_fallback() {
    let mut settings = MapSettings::default();
    settings.position.timeout = Duration::from_secs(10);
    let app = App::new(Arc::new(MemoryStore::new()), settings);
    let prompt = Arc::new(RecordingPrompt::new(true));

    let mut map = app.map_surface(Silent, HeadlessMap::new(), prompt.clone());
    let state = map.initialize().await.unwrap();

    assert_eq!(state, MapState::Ready { center: FALLBACK_CENTER, zoom: FALLBACK_ZOOM });
    assert_eq!(map.widget().center, Some(FALLBACK_CENTER));
    assert_eq!(prompt.alerts(), vec!["The request to get your location timed out."]);
}

#[test]
fn bus_subscriber_sees_jump_then_clear() {
    let bus = NavigationBus::new();
    let mut early = bus.subscribe();
    let target = JumpRequest::new(LatLng::new(1.0, 2.0), Some(16.0));

    bus.jump_to(target);
    bus.clear();
    let mut late = bus.subscribe();

    assert_eq!(early.try_next(), Some(None));
    assert_eq!(early.try_next(), Some(Some(target)));
    assert_eq!(early.try_next(), Some(None));
    assert_eq!(late.try_next(), Some(None));
}

#[tokio::test]
async fn routes_persist_across_sessions_as_one_layer() {
    let dir = TempDir::new().unwrap();
    let store: SharedStore = Arc::new(FileStore::open(dir.path()).unwrap());
    let here = LatLng::new(10.0, 10.0);

    {
        let app = App::new(store.clone(), MapSettings::default());
        let geo = FixedGeolocator::new(here);
        let mut map = app.map_surface(geo, HeadlessMap::new(), RecordingPrompt::new(true));
        map.initialize().await.unwrap();
        map.route_created(vec![LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0)]).unwrap();
        map.route_created(vec![LatLng::new(1.0, 1.0), LatLng::new(1.0, 2.0)]).unwrap();
        assert_eq!(map.routes().lines().len(), 1);
        assert_eq!(map.widget().routes.segment_count(), 2);
    }

    let reopened: SharedStore = Arc::new(FileStore::open(dir.path()).unwrap());
    let app = App::new(reopened, MapSettings::default());
    let geo = FixedGeolocator::new(here);
    let mut map = app.map_surface(geo, HeadlessMap::new(), RecordingPrompt::new(true));
    map.initialize().await.unwrap();
    assert_eq!(map.routes().segment_count(), 2);
    assert_eq!(map.routes().current(), None);

    // A new drawing session starts a fresh route.
    map.route_created(vec![LatLng::new(5.0, 5.0), LatLng::new(5.0, 6.0)]).unwrap();
    assert_eq!(map.routes().lines().len(), 2);

    assert_eq!(map.route_deleted(&[0, 1]).unwrap(), 2);
    assert!(app.routes().load().unwrap().expect("saved").is_empty());
}

#[tokio::test]
async fn event_loop_serves_commands_and_replayed_jumps() {
    let app = memory_app();
    app.points().add(point(7, 3.0, 4.0)).unwrap();

    let mut list = app.list_surface(RecordingPrompt::new(true));
    list.activate().unwrap();
    assert_eq!(list.jump_to(7).unwrap(), View::Map);

    let map = app.map_surface(
        FixedGeolocator::new(LatLng::new(1.0, 1.0)),
        HeadlessMap::new(),
        RecordingPrompt::new(true),
    );
    let (handle, commands) = map.command_channel();
    assert!(!handle.is_ready());

    assert!(handle.send(MapCommand::TogglePlacement));
    assert!(handle.send(MapCommand::Click(LatLng::new(2.0, 2.0))));
    assert!(handle.send(MapCommand::RouteCreated(vec![LatLng::new(0.0, 0.0)])));
    let segment = vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 0.0)];
    assert!(handle.send(MapCommand::RouteCreated(segment)));

    // The channel closes once the handle is dropped after readiness.
    let (map, ready) = tokio::join!(map.run(commands), async move {
        let ready = handle.ready().await;
        drop(handle);
        ready
    });
    let map = map.unwrap();

    assert!(ready);
    assert_eq!(map.widget().flights, vec![(LatLng::new(3.0, 4.0), 16.0)]);
    assert_eq!(app.nav().current(), None);
    assert_eq!(app.points().list().unwrap().len(), 2);
    assert_eq!(map.widget().markers.len(), 2);
    assert_eq!(map.routes().segment_count(), 1);
}

#[tokio::test]
async fn corrupt_points_surface_as_errors() {
    let backing = Arc::new(MemoryStore::new());
    backing.set(store::HOUSES_KEY, "not json").unwrap();
    let app = App::new(backing, MapSettings::default());

    let mut list = app.list_surface(RecordingPrompt::new(true));
    assert!(matches!(list.activate(), Err(ListError::Store(StoreError::Parse { .. }))));

    let mut map = app.map_surface(
        FixedGeolocator::new(LatLng::new(1.0, 1.0)),
        HeadlessMap::new(),
        RecordingPrompt::new(true),
    );
    let err = map.initialize().await.unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, MapError::Store(StoreError::Parse { .. })));
}
