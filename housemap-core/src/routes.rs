//! Drawn route geometry
//!
//! The drawn overlay is stored as a GeoJSON object under `drawnLines`. On
//! load every line found in that object becomes part of one undifferentiated
//! layer; segment identity is not kept across saves.
//!
//! During a drawing session at most one route is "current". With
//! [`RoutePolicy::Continue`] each newly drawn segment joins the current route
//! as another segment of the same multi-line instead of starting a second
//! independent route.

use crate::store::{read_json, write_json, SharedStore, StoreError, DRAWN_LINES_KEY};
use crate::types::LatLng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// GeoJSON position: `[lng, lat]`, optionally followed by an altitude.
pub type Position = Vec<f64>;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("A route segment needs at least two points, got {0}")]
    TooShort(usize),

    #[error("Invalid GeoJSON position: {0:?}")]
    InvalidPosition(Position),

    #[error("No route line at index {0}")]
    InvalidIndex(usize),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type RouteResult<T> = Result<T, RouteError>;

/// Subset of GeoJSON produced and accepted by the drawn layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJson {
    FeatureCollection {
        features: Vec<GeoJson>,
    },
    Feature {
        #[serde(default)]
        properties: serde_json::Value,
        geometry: Option<Box<GeoJson>>,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
}

impl GeoJson {
    pub fn empty_collection() -> Self {
        GeoJson::FeatureCollection { features: Vec::new() }
    }
}

/// How a newly drawn segment relates to the route being drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutePolicy {
    /// Merge into the current route when there is one.
    #[default]
    Continue,
    /// Every draw is its own route.
    Separate,
}

/// One drawable line made of one or more segments.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLine {
    segments: Vec<Vec<LatLng>>,
}

impl RouteLine {
    pub fn new(segment: Vec<LatLng>) -> RouteResult<Self> {
        Self::from_segments(vec![segment])
    }

    pub fn from_segments(segments: Vec<Vec<LatLng>>) -> RouteResult<Self> {
        if segments.is_empty() {
            return Err(RouteError::TooShort(0));
        }
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Vec<LatLng>] {
        &self.segments
    }

    pub fn point_count(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    fn to_geometry(&self) -> GeoJson {
        let encode = |segment: &Vec<LatLng>| -> Vec<Position> {
            segment.iter().map(|p| vec![p.lng, p.lat]).collect()
        };
        if self.segments.len() == 1 {
            GeoJson::LineString { coordinates: encode(&self.segments[0]) }
        } else {
            GeoJson::MultiLineString { coordinates: self.segments.iter().map(encode).collect() }
        }
    }
}

fn validate_segment(segment: &[LatLng]) -> RouteResult<()> {
    if segment.len() < 2 {
        return Err(RouteError::TooShort(segment.len()));
    }
    Ok(())
}

fn decode_segment(coordinates: &[Position]) -> RouteResult<Vec<LatLng>> {
    coordinates
        .iter()
        .map(|pos| match pos.as_slice() {
            [lng, lat, ..] => Ok(LatLng::new(*lat, *lng)),
            _ => Err(RouteError::InvalidPosition(pos.clone())),
        })
        .collect()
}

/// The drawable route overlay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteLayer {
    lines: Vec<RouteLine>,
    current: Option<usize>,
}

impl RouteLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[RouteLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.lines.iter().map(|l| l.segments.len()).sum()
    }

    /// Index of the route being extended in this drawing session.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Rebuild a layer from a stored GeoJSON object. Nested collections and
    /// features are flattened; each line geometry becomes one route line.
    pub fn from_geojson(geojson: &GeoJson) -> RouteResult<Self> {
        let mut layer = Self::new();
        layer.collect(geojson)?;
        Ok(layer)
    }

    fn collect(&mut self, geojson: &GeoJson) -> RouteResult<()> {
        match geojson {
            GeoJson::FeatureCollection { features } => {
                for feature in features {
                    self.collect(feature)?;
                }
            }
            GeoJson::Feature { geometry, .. } => {
                if let Some(geometry) = geometry {
                    self.collect(geometry)?;
                }
            }
            GeoJson::LineString { coordinates } => {
                self.lines.push(RouteLine::new(decode_segment(coordinates)?)?);
            }
            GeoJson::MultiLineString { coordinates } => {
                let segments = coordinates
                    .iter()
                    .map(|c| decode_segment(c))
                    .collect::<RouteResult<Vec<_>>>()?;
                self.lines.push(RouteLine::from_segments(segments)?);
            }
        }
        Ok(())
    }

    /// Snapshot of the whole layer as a feature collection.
    pub fn to_geojson(&self) -> GeoJson {
        let features = self
            .lines
            .iter()
            .map(|line| GeoJson::Feature {
                properties: serde_json::Value::Object(serde_json::Map::new()),
                geometry: Some(Box::new(line.to_geometry())),
            })
            .collect();
        GeoJson::FeatureCollection { features }
    }

    /// Record a freshly drawn segment. Returns the index of the line that
    /// now holds it.
    pub fn record_created(
        &mut self,
        segment: Vec<LatLng>,
        policy: RoutePolicy,
    ) -> RouteResult<usize> {
        validate_segment(&segment)?;
        match (policy, self.current) {
            (RoutePolicy::Continue, Some(index)) => {
                self.lines[index].segments.push(segment);
                Ok(index)
            }
            _ => {
                self.lines.push(RouteLine { segments: vec![segment] });
                let index = self.lines.len() - 1;
                self.current = Some(index);
                Ok(index)
            }
        }
    }

    pub fn record_edited(&mut self, index: usize, line: RouteLine) -> RouteResult<()> {
        let slot = self.lines.get_mut(index).ok_or(RouteError::InvalidIndex(index))?;
        *slot = line;
        Ok(())
    }

    /// Remove the lines at `indices`. All indices are checked before anything
    /// is removed. Returns how many lines were removed.
    pub fn record_deleted(&mut self, indices: &[usize]) -> RouteResult<usize> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.lines.len()) {
            return Err(RouteError::InvalidIndex(bad));
        }
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        self.current = match self.current {
            Some(current) if sorted.binary_search(&current).is_ok() => None,
            Some(current) => Some(current - sorted.iter().filter(|&&i| i < current).count()),
            None => None,
        };
        for index in sorted.iter().rev() {
            self.lines.remove(*index);
        }
        Ok(sorted.len())
    }

    /// Forget which route is current without touching the lines.
    pub fn end_session(&mut self) {
        self.current = None;
    }
}

/// Loads and saves the drawn layer snapshot.
#[derive(Clone)]
pub struct RouteRepository {
    store: SharedStore,
}

impl RouteRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// The stored layer, or `None` when nothing was ever saved.
    pub fn load(&self) -> RouteResult<Option<RouteLayer>> {
        match read_json::<GeoJson>(self.store.as_ref(), DRAWN_LINES_KEY)? {
            Some(geojson) => Ok(Some(RouteLayer::from_geojson(&geojson)?)),
            None => Ok(None),
        }
    }

    pub fn save(&self, layer: &RouteLayer) -> RouteResult<()> {
        write_json(self.store.as_ref(), DRAWN_LINES_KEY, &layer.to_geojson())?;
        log::debug!(
            "Saved drawn layer: {} lines, {} segments",
            layer.lines().len(),
            layer.segment_count()
        );
        Ok(())
    }
}
