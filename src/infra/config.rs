//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::domain::types::{Coordinate, Region, VenueId};
use crate::io::location::{Accuracy, WatchOptions};
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocoderKind {
    Nominatim,
    Offline,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySection {
    #[serde(default = "default_radius_miles")]
    pub radius_miles: f64,
    #[serde(default = "default_label_refresh_miles")]
    pub label_refresh_miles: f64,
    #[serde(default = "default_catalog_file")]
    pub catalog_file: String,
    #[serde(default)]
    pub favourites: Vec<String>,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            radius_miles: default_radius_miles(),
            label_refresh_miles: default_label_refresh_miles(),
            catalog_file: default_catalog_file(),
            favourites: Vec::new(),
        }
    }
}

fn default_radius_miles() -> f64 {
    10.0
}

fn default_label_refresh_miles() -> f64 {
    0.25
}

fn default_catalog_file() -> String {
    "data/dundee_st_andrews.json".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationSection {
    #[serde(default = "default_accuracy")]
    pub accuracy: Accuracy,
    /// Provider-side minimum movement between watch callbacks (meters)
    #[serde(default = "default_distance_interval_m")]
    pub distance_interval_m: f64,
    /// Provider-side minimum time between watch callbacks (ms)
    #[serde(default = "default_time_interval_ms")]
    pub time_interval_ms: u64,
    /// Tracker-side throttle on emitted positions (ms, by fix timestamp)
    #[serde(default = "default_emit_interval_ms")]
    pub emit_interval_ms: u64,
    #[serde(default = "default_geocode_debounce_ms")]
    pub geocode_debounce_ms: u64,
}

impl Default for LocationSection {
    fn default() -> Self {
        Self {
            accuracy: default_accuracy(),
            distance_interval_m: default_distance_interval_m(),
            time_interval_ms: default_time_interval_ms(),
            emit_interval_ms: default_emit_interval_ms(),
            geocode_debounce_ms: default_geocode_debounce_ms(),
        }
    }
}

fn default_accuracy() -> Accuracy {
    Accuracy::Balanced
}

fn default_distance_interval_m() -> f64 {
    100.0
}

fn default_time_interval_ms() -> u64 {
    10_000
}

fn default_emit_interval_ms() -> u64 {
    1_000
}

fn default_geocode_debounce_ms() -> u64 {
    750
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderSection {
    #[serde(default = "default_geocoder_kind")]
    pub provider: GeocoderKind,
    #[serde(default = "default_geocoder_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_geocoder_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for GeocoderSection {
    fn default() -> Self {
        Self {
            provider: default_geocoder_kind(),
            base_url: default_geocoder_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_geocoder_timeout_ms(),
        }
    }
}

fn default_geocoder_kind() -> GeocoderKind {
    GeocoderKind::Offline
}

fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    format!("venue-discovery/{}", env!("CARGO_PKG_VERSION"))
}

fn default_geocoder_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapSection {
    #[serde(default = "default_initial_latitude")]
    pub initial_latitude: f64,
    #[serde(default = "default_initial_longitude")]
    pub initial_longitude: f64,
    #[serde(default = "default_initial_delta")]
    pub initial_delta: f64,
    #[serde(default = "default_focus_delta")]
    pub focus_delta: f64,
    #[serde(default = "default_animation_ms")]
    pub animation_ms: u64,
}

impl Default for MapSection {
    fn default() -> Self {
        Self {
            initial_latitude: default_initial_latitude(),
            initial_longitude: default_initial_longitude(),
            initial_delta: default_initial_delta(),
            focus_delta: default_focus_delta(),
            animation_ms: default_animation_ms(),
        }
    }
}

fn default_initial_latitude() -> f64 {
    56.455
}

fn default_initial_longitude() -> f64 {
    -2.97
}

fn default_initial_delta() -> f64 {
    0.2
}

fn default_focus_delta() -> f64 {
    0.03
}

fn default_animation_ms() -> u64 {
    800
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSection {
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval_secs() }
    }
}

fn default_metrics_interval_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub discovery: DiscoverySection,
    #[serde(default)]
    pub location: LocationSection,
    #[serde(default)]
    pub geocoder: GeocoderSection,
    #[serde(default)]
    pub map: MapSection,
    #[serde(default)]
    pub metrics: MetricsSection,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    radius_miles: f64,
    label_refresh_miles: f64,
    catalog_file: String,
    favourites: Vec<VenueId>,
    accuracy: Accuracy,
    distance_interval_m: f64,
    time_interval_ms: u64,
    emit_interval_ms: u64,
    geocode_debounce_ms: u64,
    geocoder_kind: GeocoderKind,
    geocoder_url: String,
    geocoder_user_agent: String,
    geocoder_timeout_ms: u64,
    initial_region: Region,
    focus_delta: f64,
    animation_ms: u64,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

impl Config {
    /// Determine config file path from args or environment
    pub fn resolve_config_path(args: &[String]) -> String {
        for (i, arg) in args.iter().enumerate() {
            if arg == "--config" {
                if let Some(path) = args.get(i + 1) {
                    return path.clone();
                }
            }
            if let Some(path) = arg.strip_prefix("--config=") {
                return path.to_string();
            }
        }

        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, path.display().to_string()))
    }

    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        let TomlConfig { discovery, location, geocoder, map, metrics } = toml_config;
        Self {
            radius_miles: discovery.radius_miles,
            label_refresh_miles: discovery.label_refresh_miles,
            catalog_file: discovery.catalog_file,
            favourites: discovery.favourites.into_iter().map(VenueId).collect(),
            accuracy: location.accuracy,
            distance_interval_m: location.distance_interval_m,
            time_interval_ms: location.time_interval_ms,
            emit_interval_ms: location.emit_interval_ms,
            geocode_debounce_ms: location.geocode_debounce_ms,
            geocoder_kind: geocoder.provider,
            geocoder_url: geocoder.base_url,
            geocoder_user_agent: geocoder.user_agent,
            geocoder_timeout_ms: geocoder.timeout_ms,
            initial_region: Region::around(
                Coordinate::new(map.initial_latitude, map.initial_longitude),
                map.initial_delta,
            ),
            focus_delta: map.focus_delta,
            animation_ms: map.animation_ms,
            metrics_interval_secs: metrics.interval_secs,
            config_file,
        }
    }

    /// Load configuration from a path, falling back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load(args: &[String]) -> Self {
        Self::load_from_path(&Self::resolve_config_path(args))
    }

    /// Watch subscription options handed to the location provider
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            accuracy: self.accuracy,
            distance_interval_m: self.distance_interval_m,
            time_interval_ms: self.time_interval_ms,
        }
    }

    pub fn radius_miles(&self) -> f64 {
        self.radius_miles
    }

    pub fn label_refresh_miles(&self) -> f64 {
        self.label_refresh_miles
    }

    pub fn catalog_file(&self) -> &str {
        &self.catalog_file
    }

    pub fn favourites(&self) -> &[VenueId] {
        &self.favourites
    }

    pub fn accuracy(&self) -> Accuracy {
        self.accuracy
    }

    pub fn emit_interval_ms(&self) -> u64 {
        self.emit_interval_ms
    }

    pub fn geocode_debounce_ms(&self) -> u64 {
        self.geocode_debounce_ms
    }

    pub fn geocoder_kind(&self) -> GeocoderKind {
        self.geocoder_kind
    }

    pub fn geocoder_url(&self) -> &str {
        &self.geocoder_url
    }

    pub fn geocoder_user_agent(&self) -> &str {
        &self.geocoder_user_agent
    }

    pub fn geocoder_timeout_ms(&self) -> u64 {
        self.geocoder_timeout_ms
    }

    pub fn initial_region(&self) -> Region {
        self.initial_region
    }

    pub fn focus_delta(&self) -> f64 {
        self.focus_delta
    }

    pub fn animation_ms(&self) -> u64 {
        self.animation_ms
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to set the catalog path
    pub fn with_catalog_file(mut self, path: impl Into<String>) -> Self {
        self.catalog_file = path.into();
        self
    }
}
