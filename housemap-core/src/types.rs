use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type PointId = i64;
pub type Zoom = f64;

/// Center used when no location fix is available.
pub const FALLBACK_CENTER: LatLng = LatLng { lat: 40.7128, lng: -74.006 };
pub const FALLBACK_ZOOM: Zoom = 13.0;
/// Zoom applied after a successful location fix.
pub const LOCATED_ZOOM: Zoom = 16.0;
pub const JUMP_ZOOM: Zoom = 16.0;

pub const MANUAL_PLACEMENT_LABEL: &str = "Manually Placed";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// A persisted record of a location the user marked as visited.
///
/// Field names follow the stored JSON records, so collections written by
/// earlier builds load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitedPoint {
    pub id: PointId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub visited: bool,
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "visitedAt", default, skip_serializing_if = "Option::is_none")]
    pub visited_at: Option<DateTime<Utc>>,
}

impl VisitedPoint {
    /// New visited point stamped with `now`; the id is the creation time in milliseconds.
    pub fn new_visit(position: LatLng, now: DateTime<Utc>) -> Self {
        Self {
            id: now.timestamp_millis(),
            street: None,
            number: None,
            visited: true,
            lat: position.lat,
            lng: position.lng,
            visited_at: Some(now),
        }
    }

    pub fn with_id(mut self, id: PointId) -> Self {
        self.id = id;
        self
    }

    pub fn with_street<S: Into<String>>(mut self, street: S) -> Self {
        self.street = Some(street.into());
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Label shown on the marker popup and in the list.
    pub fn title(&self) -> &str {
        self.street.as_deref().unwrap_or("Current Location")
    }
}

/// One-shot request to re-center the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpRequest {
    pub lat: f64,
    pub lng: f64,
    pub zoom: Option<Zoom>,
}

impl JumpRequest {
    pub fn new(position: LatLng, zoom: Option<Zoom>) -> Self {
        Self { lat: position.lat, lng: position.lng, zoom }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// The two user-facing views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum View {
    #[default]
    Map,
    List,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown view path: {0}")]
pub struct UnknownView(pub String);

impl View {
    /// Resolve a route path; the empty path redirects to the map.
    pub fn from_path(path: &str) -> Result<Self, UnknownView> {
        match path.trim().trim_matches('/') {
            "" | "map" => Ok(View::Map),
            "list" => Ok(View::List),
            other => Err(UnknownView(other.to_string())),
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            View::Map => "/map",
            View::List => "/list",
        }
    }
}
