//! Error taxonomy for the discovery engine
//!
//! All of these are local-recoverable: the session turns them into events
//! and log lines, never into a failed screen.

use crate::domain::types::VenueId;
use thiserror::Error;

/// Device location failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    /// User refused location access; radius filtering is unavailable
    #[error("location permission denied")]
    PermissionDenied,
    /// Transient fetch/watch failure; distances are unknown for this cycle
    #[error("position unavailable: {0}")]
    PositionUnavailable(String),
    /// The provider ended the watch subscription on its own
    #[error("position subscription closed by provider")]
    SubscriptionClosed,
}

/// Reverse geocoding failures
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoder returned status {0}")]
    Status(u16),
    #[error("geocoder response malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid geocoder url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("no place found at coordinate")]
    NoResult,
}

/// Outbound maps deep-link failures
#[derive(Debug, Error)]
pub enum DeepLinkError {
    #[error("venue {0} has no coordinates")]
    MissingCoordinates(VenueId),
    #[error("invalid maps uri: {0}")]
    InvalidUri(#[from] url::ParseError),
    #[error("could not open maps application: {0}")]
    OpenFailed(String),
}
