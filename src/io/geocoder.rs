//! Reverse geocoding: coordinate -> best-effort place label

use crate::domain::error::GeocodeError;
use crate::domain::types::{Coordinate, PlaceLabel};
use crate::infra::config::Config;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, at: Coordinate) -> Result<PlaceLabel, GeocodeError>;
}

/// Nominatim (OpenStreetMap) `/reverse` client
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    #[serde(default)]
    address: Option<NominatimAddress>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    suburb: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, GeocodeError> {
        // Create HTTP client once for reuse (connection pooling)
        let client = reqwest::Client::builder().timeout(timeout).user_agent(user_agent).build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn from_config(config: &Config) -> Result<Self, GeocodeError> {
        Self::new(
            config.geocoder_url(),
            config.geocoder_user_agent(),
            Duration::from_millis(config.geocoder_timeout_ms()),
        )
    }

    fn parse_label(body: &str) -> Result<PlaceLabel, GeocodeError> {
        let response: NominatimResponse = serde_json::from_str(body)?;
        if response.error.is_some() {
            return Err(GeocodeError::NoResult);
        }
        let address = response.address.ok_or(GeocodeError::NoResult)?;
        let locality = address.city.or(address.town).or(address.village).or(address.suburb);

        let label = PlaceLabel {
            locality,
            region: address.state,
            country: address.country,
            coordinate: None,
        };
        if label.is_fallback() {
            return Err(GeocodeError::NoResult);
        }
        Ok(label)
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, at: Coordinate) -> Result<PlaceLabel, GeocodeError> {
        let url = Url::parse_with_params(
            &format!("{}/reverse", self.base_url),
            &[
                ("format", "jsonv2".to_string()),
                ("lat", at.latitude.to_string()),
                ("lon", at.longitude.to_string()),
                ("zoom", "10".to_string()),
            ],
        )?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let label = Self::parse_label(&body)?;
        debug!(lat = %at.latitude, lng = %at.longitude, label = %label, "reverse_geocoded");
        Ok(label)
    }
}

/// Geocoder that never calls out; labels are the raw coordinates
pub struct OfflineGeocoder;

#[async_trait]
impl ReverseGeocoder for OfflineGeocoder {
    async fn reverse(&self, at: Coordinate) -> Result<PlaceLabel, GeocodeError> {
        Ok(PlaceLabel::from_coordinate(at))
    }
}
