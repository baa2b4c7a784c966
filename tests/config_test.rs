//! Integration tests for configuration loading

use venue_discovery::domain::VenueId;
use venue_discovery::infra::{Config, GeocoderKind};
use venue_discovery::io::Accuracy;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[discovery]
radius_miles = 5.0
label_refresh_miles = 0.5
catalog_file = "fixtures/venues.json"
favourites = ["dundee_13"]

[location]
accuracy = "high"
distance_interval_m = 50.0
time_interval_ms = 5000
emit_interval_ms = 2000
geocode_debounce_ms = 300

[geocoder]
provider = "nominatim"
base_url = "http://localhost:8088/"
user_agent = "discovery-tests"
timeout_ms = 1500

[map]
initial_latitude = 56.34
initial_longitude = -2.80
initial_delta = 0.1
focus_delta = 0.01
animation_ms = 400

[metrics]
interval_secs = 15
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.radius_miles(), 5.0);
    assert_eq!(config.label_refresh_miles(), 0.5);
    assert_eq!(config.catalog_file(), "fixtures/venues.json");
    assert_eq!(config.favourites(), &[VenueId::from("dundee_13")]);
    assert_eq!(config.accuracy(), Accuracy::High);
    assert_eq!(config.emit_interval_ms(), 2000);
    assert_eq!(config.geocode_debounce_ms(), 300);
    assert_eq!(config.geocoder_kind(), GeocoderKind::Nominatim);
    assert_eq!(config.geocoder_user_agent(), "discovery-tests");
    assert_eq!(config.geocoder_timeout_ms(), 1500);
    assert_eq!(config.initial_region().latitude_delta, 0.1);
    assert_eq!(config.focus_delta(), 0.01);
    assert_eq!(config.animation_ms(), 400);
    assert_eq!(config.metrics_interval_secs(), 15);

    let watch = config.watch_options();
    assert_eq!(watch.distance_interval_m, 50.0);
    assert_eq!(watch.time_interval_ms, 5000);
}

#[test]
fn test_partial_config_uses_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[discovery]\nradius_miles = 3.0").unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.radius_miles(), 3.0);
    assert_eq!(config.label_refresh_miles(), 0.25);
    assert_eq!(config.watch_options().distance_interval_m, 100.0);
    assert_eq!(config.watch_options().time_interval_ms, 10_000);
    assert_eq!(config.geocoder_kind(), GeocoderKind::Offline);
}

#[test]
fn test_invalid_file_reports_path() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[location]\naccuracy = \"precise-ish\"").unwrap();

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.config_file(), "default");
    assert_eq!(config.radius_miles(), 10.0);
    assert_eq!(config.catalog_file(), "data/dundee_st_andrews.json");
    assert!(config.favourites().is_empty());
}

#[test]
fn test_resolve_config_path_from_args() {
    let args = vec!["venue-discovery".to_string(), "--config".to_string(), "x.toml".to_string()];
    assert_eq!(Config::resolve_config_path(&args), "x.toml");

    let args = vec!["venue-discovery".to_string(), "--config=y.toml".to_string()];
    assert_eq!(Config::resolve_config_path(&args), "y.toml");
}

#[test]
fn test_dev_config_parses() {
    let config = Config::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/config/dev.toml")).unwrap();
    assert_eq!(config.radius_miles(), 10.0);
    assert_eq!(config.favourites().len(), 2);
}
