//! Command implementations for the housemap CLI

pub mod config;
pub mod map;
pub mod points;
pub mod session;

use anyhow::{Context, Result};
use chrono::Local;
use housemap_core::{App, FileStore, LatLng, RouteLayer, VisitedPoint};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{CliError, CliResult};

/// Open the persistent store named by the configuration.
pub fn open_app(config: &Config) -> Result<App> {
    let dir = &config.storage.data_dir;
    let store = FileStore::open(dir)
        .map_err(CliError::from)
        .with_context(|| format!("Failed to open storage in {}", dir.display()))?;
    log::debug!("Using storage file {}", store.path().display());
    Ok(App::new(Arc::new(store), config.map_settings()))
}

/// Single-threaded runtime for the location requests.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

/// Parse `lat,lng`.
pub fn parse_lat_lng(input: &str) -> CliResult<LatLng> {
    let (lat, lng) = input
        .split_once(',')
        .ok_or_else(|| CliError::invalid_coordinates(input, "expected 'lat,lng'"))?;
    let parse = |value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|e| CliError::invalid_coordinates(input, e.to_string()))
    };
    let position = LatLng::new(parse(lat)?, parse(lng)?);
    if !position.is_valid() {
        return Err(CliError::invalid_coordinates(input, "out of range"));
    }
    Ok(position)
}

/// Parse a `;`-separated list of `lat,lng` positions.
pub fn parse_path(input: &str) -> CliResult<Vec<LatLng>> {
    input
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_lat_lng)
        .collect()
}

pub fn format_points(points: &[VisitedPoint]) -> String {
    if points.is_empty() {
        return "No visited points.".to_string();
    }
    let mut out = format!(
        "{:<15} {:<24} {:<8} {:>10} {:>11}  {}",
        "ID", "STREET", "NUMBER", "LAT", "LNG", "VISITED"
    );
    for point in points {
        let visited = point
            .visited_at
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "\n{:<15} {:<24} {:<8} {:>10.6} {:>11.6}  {}",
            point.id,
            point.street.as_deref().unwrap_or("-"),
            point.number.as_deref().unwrap_or("-"),
            point.lat,
            point.lng,
            visited
        ));
    }
    out
}

pub fn format_routes(layer: &RouteLayer) -> String {
    if layer.is_empty() {
        return "No routes drawn.".to_string();
    }
    layer
        .lines()
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let current = if layer.current() == Some(index) { " (current)" } else { "" };
            format!(
                "Route {}{}: {} segment(s), {} points",
                index,
                current,
                line.segments().len(),
                line.point_count()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use housemap_core::RoutePolicy;

    #[test]
    fn test_parse_lat_lng() {
        assert_eq!(parse_lat_lng("40.5, -73.25").unwrap(), LatLng::new(40.5, -73.25));
        assert!(matches!(parse_lat_lng("40.5"), Err(CliError::InvalidCoordinates { .. })));
        assert!(matches!(parse_lat_lng("north,south"), Err(CliError::InvalidCoordinates { .. })));
        assert!(matches!(parse_lat_lng("91,0"), Err(CliError::InvalidCoordinates { .. })));
    }

    #[test]
    fn test_parse_path() {
        let path = parse_path("0,0; 0,1;").unwrap();
        assert_eq!(path, vec![LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0)]);
        assert!(parse_path("0,0;oops").is_err());
    }

    #[test]
    fn test_format_points() {
        assert_eq!(format_points(&[]), "No visited points.");
        let point = VisitedPoint {
            id: 12,
            street: Some("Elm St".into()),
            number: None,
            visited: true,
            lat: 1.5,
            lng: -2.25,
            visited_at: None,
        };
        let table = format_points(&[point]);
        let row = table.lines().nth(1).unwrap();
        assert!(row.starts_with("12"));
        assert!(row.contains("Elm St"));
        assert!(row.contains("1.500000"));
        assert!(row.contains("-2.250000"));
    }

    #[test]
    fn test_format_routes() {
        let mut layer = RouteLayer::new();
        assert_eq!(format_routes(&layer), "No routes drawn.");
        let segment = vec![LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0)];
        layer.record_created(segment, RoutePolicy::Continue).unwrap();
        assert_eq!(format_routes(&layer), "Route 0 (current): 1 segment(s), 2 points");
    }
}
