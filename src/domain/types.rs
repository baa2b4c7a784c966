//! Shared value types for venue discovery

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Newtype wrapper for catalog venue IDs to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenueId(pub String);

impl VenueId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VenueId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// WGS84 coordinate in decimal degrees
///
/// Accepts both `{latitude, longitude}` and the catalog's `{lat, lng}` spelling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
}

impl Coordinate {
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Catalog locations may be missing entirely or carry null/partial fields;
/// anything short of a full lat/lng pair is treated as "no coordinates".
pub(crate) fn deserialize_optional_location<'de, D>(
    deserializer: D,
) -> Result<Option<Coordinate>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct RawLocation {
        #[serde(default, alias = "latitude")]
        lat: Option<f64>,
        #[serde(default, alias = "longitude", alias = "lon")]
        lng: Option<f64>,
    }

    let raw: Option<RawLocation> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|loc| match (loc.lat, loc.lng) {
        (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
            Some(Coordinate::new(lat, lng))
        }
        _ => None,
    }))
}

/// A device position fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// Horizontal accuracy radius in meters, if the provider reports one
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    /// Fix time (epoch ms); recorded tracks may carry an RFC 3339 string instead
    #[serde(alias = "timestamp", deserialize_with = "deserialize_timestamp_ms")]
    pub timestamp_ms: u64,
}

/// Parse "2026-01-05T08:30:00+00:00" (RFC 3339) to epoch milliseconds
pub fn parse_rfc3339_ms(time_str: &str) -> Option<u64> {
    OffsetDateTime::parse(time_str, &Rfc3339)
        .ok()
        .and_then(|dt| u64::try_from(dt.unix_timestamp_nanos() / 1_000_000).ok())
}

fn deserialize_timestamp_ms<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TimestampValue {
        EpochMs(u64),
        IsoString(String),
    }

    match TimestampValue::deserialize(deserializer)? {
        TimestampValue::EpochMs(ms) => Ok(ms),
        TimestampValue::IsoString(s) => parse_rfc3339_ms(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid RFC 3339 timestamp '{}'", s))),
    }
}

impl Position {
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: u64) -> Self {
        Self { coordinate: Coordinate::new(latitude, longitude), accuracy_m: None, timestamp_ms }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }
}

/// Map camera region: center plus span in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    pub center: Coordinate,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Region {
    /// Square region of `delta` degrees around `center`
    pub fn around(center: Coordinate, delta: f64) -> Self {
        Self { center, latitude_delta: delta, longitude_delta: delta }
    }
}

/// Human-readable place label from reverse geocoding
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PlaceLabel {
    pub locality: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    /// Set when the label is a raw-coordinate fallback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
}

impl PlaceLabel {
    /// Fallback label showing raw coordinates
    pub fn from_coordinate(coordinate: Coordinate) -> Self {
        Self { coordinate: Some(coordinate), ..Default::default() }
    }

    pub fn is_fallback(&self) -> bool {
        self.locality.is_none() && self.region.is_none() && self.country.is_none()
    }
}

impl fmt::Display for PlaceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [&self.locality, &self.region, &self.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.is_empty())
            .collect();

        if !parts.is_empty() {
            return write!(f, "{}", parts.join(", "));
        }
        match self.coordinate {
            Some(coordinate) => write!(f, "{}", coordinate),
            None => write!(f, "Unknown location"),
        }
    }
}

/// Where a focus/selection request came from
///
/// Every request into the coordinator is tagged so self-triggered updates
/// are never re-processed as external ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// List/carousel interaction, including filter chips and search input
    List,
    /// Map viewport movement or marker press
    Map,
    /// Deep link from outside the discovery screen
    External,
    /// Device position update
    Location,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::List => "list",
            Origin::Map => "map",
            Origin::External => "external",
            Origin::Location => "location",
        }
    }

    /// Whether a selection change from this origin should move the camera
    #[inline]
    pub fn animates_camera(&self) -> bool {
        matches!(self, Origin::List | Origin::External)
    }
}
