//! Map commands: mark the current location, place a point and manage drawn routes.

use anyhow::{Context, Result};
use housemap_core::store::PLACEMENT_HINT_KEY;
use housemap_core::{App, HeadlessMap, LatLng, UserPrompt, VisitedPoint};

use crate::commands::{format_routes, parse_path, runtime};
use crate::config::Config;
use crate::error::CliError;

/// Create a visited point at the device position, or at `at` when given.
pub fn mark<P: UserPrompt>(
    app: &App,
    config: &Config,
    prompt: P,
    at: Option<LatLng>,
) -> Result<Option<VisitedPoint>> {
    let rt = runtime()?;
    let point = rt.block_on(async {
        let mut map = app.map_surface(config.geolocator(at), HeadlessMap::new(), prompt);
        map.initialize().await.map_err(CliError::from)?;
        map.mark_current_location().await.map_err(CliError::from)
    })?;

    match &point {
        Some(point) => println!("Marked point {} at {}", point.id, point.position()),
        None => println!("No location fix; nothing was marked."),
    }
    Ok(point)
}

/// Place a point the way a map tap would: enter placement mode, then click.
pub fn place<P: UserPrompt>(
    app: &App,
    config: &Config,
    prompt: P,
    at: LatLng,
) -> Result<VisitedPoint> {
    // There is no map to tap on here, so the tap hint is skipped.
    app.context()
        .session
        .set(PLACEMENT_HINT_KEY, "true")
        .map_err(CliError::from)?;

    let rt = runtime()?;
    let placed = rt.block_on(async {
        let mut map = app.map_surface(config.geolocator(Some(at)), HeadlessMap::new(), prompt);
        map.initialize().await.map_err(CliError::from)?;
        map.toggle_placement().map_err(CliError::from)?;
        map.handle_click(at).map_err(CliError::from)
    })?;

    let point = placed.context("Placement mode was not active")?;
    println!("Placed point {} at {}", point.id, point.position());
    Ok(point)
}

pub fn show_routes(app: &App, geojson: bool) -> Result<()> {
    let layer = app.routes().load().map_err(CliError::from)?.unwrap_or_default();
    if geojson {
        let json = serde_json::to_string_pretty(&layer.to_geojson())
            .context("Failed to encode routes")?;
        println!("{}", json);
    } else {
        println!("{}", format_routes(&layer));
    }
    Ok(())
}

/// Draw one segment. Each invocation is its own drawing session, so the
/// segment starts a new route.
pub fn draw_route(app: &App, config: &Config, path: &str) -> Result<usize> {
    let segment = parse_path(path)?;
    let mut layer = app.routes().load().map_err(CliError::from)?.unwrap_or_default();
    let index = layer
        .record_created(segment, config.map.route_policy)
        .map_err(CliError::from)?;
    app.routes().save(&layer).map_err(CliError::from)?;
    println!("Drew route {} ({} routes stored)", index, layer.lines().len());
    Ok(index)
}

pub fn clear_routes<P: UserPrompt>(app: &App, prompt: P) -> Result<usize> {
    let mut layer = app.routes().load().map_err(CliError::from)?.unwrap_or_default();
    if layer.is_empty() {
        println!("No routes drawn.");
        return Ok(0);
    }
    if !prompt.confirm(&format!("Delete all {} drawn routes?", layer.lines().len())) {
        println!("Kept all routes");
        return Ok(0);
    }

    let all: Vec<usize> = (0..layer.lines().len()).collect();
    let removed = layer.record_deleted(&all).map_err(CliError::from)?;
    app.routes().save(&layer).map_err(CliError::from)?;
    println!("Deleted {} routes", removed);
    Ok(removed)
}
