//! Configuration handling for the housemap CLI
//!
//! Supports loading configuration from housemap.toml files with CLI argument overrides.

use anyhow::{Context, Result};
use housemap_core::types::{FALLBACK_CENTER, FALLBACK_ZOOM, JUMP_ZOOM, LOCATED_ZOOM};
use housemap_core::{
    FixedGeolocator, LatLng, MapSettings, PositionOptions, RoutePolicy, UnavailableGeolocator,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::location::ConfiguredGeolocator;

pub const CONFIG_FILE_NAME: &str = "housemap.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub geolocation: GeolocationConfig,
    #[serde(default)]
    pub map: MapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding storage.json
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeolocationMode {
    /// Always report `lat`/`lng`
    Fixed,
    /// No location sensor
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    #[serde(default = "default_geolocation_mode")]
    pub mode: GeolocationMode,

    /// Latitude reported in fixed mode
    #[serde(default = "default_lat")]
    pub lat: f64,

    /// Longitude reported in fixed mode
    #[serde(default = "default_lng")]
    pub lng: f64,

    /// Give up on a location request after this many milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_true")]
    pub high_accuracy: bool,

    /// Accept a cached position at most this old, in milliseconds
    #[serde(default)]
    pub max_age_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Center used when no location fix is available
    #[serde(default = "default_lat")]
    pub fallback_lat: f64,

    #[serde(default = "default_lng")]
    pub fallback_lng: f64,

    #[serde(default = "default_fallback_zoom")]
    pub fallback_zoom: f64,

    /// Zoom after a successful location fix
    #[serde(default = "default_located_zoom")]
    pub located_zoom: f64,

    /// Zoom used when jumping to a point from the list
    #[serde(default = "default_jump_zoom")]
    pub jump_zoom: f64,

    /// "continue" extends the route drawn this session, "separate" starts a new one per segment
    #[serde(default)]
    pub route_policy: RoutePolicy,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("housemap"))
        .unwrap_or_else(|| PathBuf::from(".housemap"))
}
fn default_geolocation_mode() -> GeolocationMode { GeolocationMode::Unavailable }
fn default_lat() -> f64 { FALLBACK_CENTER.lat }
fn default_lng() -> f64 { FALLBACK_CENTER.lng }
fn default_timeout_ms() -> u64 { PositionOptions::default().timeout.as_millis() as u64 }
fn default_true() -> bool { true }
fn default_fallback_zoom() -> f64 { FALLBACK_ZOOM }
fn default_located_zoom() -> f64 { LOCATED_ZOOM }
fn default_jump_zoom() -> f64 { JUMP_ZOOM }

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir() }
    }
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            mode: default_geolocation_mode(),
            lat: default_lat(),
            lng: default_lng(),
            timeout_ms: default_timeout_ms(),
            high_accuracy: true,
            max_age_ms: 0,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            fallback_lat: default_lat(),
            fallback_lng: default_lng(),
            fallback_zoom: default_fallback_zoom(),
            located_zoom: default_located_zoom(),
            jump_zoom: default_jump_zoom(),
            route_policy: RoutePolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(CONFIG_FILE_NAME);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", CONFIG_FILE_NAME);
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default configuration")
    }

    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            high_accuracy: self.geolocation.high_accuracy,
            timeout: Duration::from_millis(self.geolocation.timeout_ms),
            maximum_age: Duration::from_millis(self.geolocation.max_age_ms),
        }
    }

    pub fn map_settings(&self) -> MapSettings {
        MapSettings {
            fallback_center: LatLng::new(self.map.fallback_lat, self.map.fallback_lng),
            fallback_zoom: self.map.fallback_zoom,
            located_zoom: self.map.located_zoom,
            jump_zoom: self.map.jump_zoom,
            position: self.position_options(),
            route_policy: self.map.route_policy,
        }
    }

    /// Location source for this run. An explicit position always wins over
    /// the configured mode.
    pub fn geolocator(&self, at: Option<LatLng>) -> ConfiguredGeolocator {
        match (at, self.geolocation.mode) {
            (Some(position), _) => ConfiguredGeolocator::Fixed(FixedGeolocator::new(position)),
            (None, GeolocationMode::Fixed) => {
                let position = LatLng::new(self.geolocation.lat, self.geolocation.lng);
                ConfiguredGeolocator::Fixed(FixedGeolocator::new(position))
            }
            (None, GeolocationMode::Unavailable) => {
                ConfiguredGeolocator::Unavailable(UnavailableGeolocator::default())
            }
        }
    }
}
