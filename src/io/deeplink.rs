//! Outbound deep links into an external maps application
//!
//! Two conventions are supported: the generic web-maps search URL and the
//! native `maps://` scheme. Opening is delegated to a `UrlOpener`; failures
//! are reported to the caller, never retried here.

use crate::domain::error::DeepLinkError;
use crate::domain::venue::Venue;
use async_trait::async_trait;
use std::str::FromStr;
use tracing::{info, warn};
use url::Url;

const WEB_MAPS_SEARCH: &str = "https://www.google.com/maps/search/";
const NATIVE_MAPS: &str = "maps://";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapsTarget {
    /// `https://www.google.com/maps/search/?api=1&query=<lat>,<lng>`
    #[default]
    Web,
    /// `maps://?q=<name>&ll=<lat>,<lng>`
    Native,
}

impl FromStr for MapsTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "web" | "google" => Ok(MapsTarget::Web),
            "native" | "apple" => Ok(MapsTarget::Native),
            other => Err(format!("unknown maps target '{}'", other)),
        }
    }
}

/// External "open URL" capability
#[async_trait]
pub trait UrlOpener: Send + Sync {
    async fn open_url(&self, url: &Url) -> Result<(), String>;
}

/// Build the maps URI for a venue
pub fn maps_uri(venue: &Venue, target: MapsTarget) -> Result<Url, DeepLinkError> {
    let coordinate =
        venue.coordinate().ok_or_else(|| DeepLinkError::MissingCoordinates(venue.id.clone()))?;
    let lat_lng = format!("{},{}", coordinate.latitude, coordinate.longitude);

    let url = match target {
        MapsTarget::Web => {
            Url::parse_with_params(WEB_MAPS_SEARCH, &[("api", "1"), ("query", lat_lng.as_str())])?
        }
        MapsTarget::Native => {
            Url::parse_with_params(NATIVE_MAPS, &[("q", venue.name.as_str()), ("ll", lat_lng.as_str())])?
        }
    };
    Ok(url)
}

/// Build the URI and hand it to the opener
pub async fn open_in_maps(
    opener: &dyn UrlOpener,
    venue: &Venue,
    target: MapsTarget,
) -> Result<Url, DeepLinkError> {
    let url = maps_uri(venue, target)?;
    match opener.open_url(&url).await {
        Ok(()) => {
            info!(venue_id = %venue.id, url = %url, "maps_link_opened");
            Ok(url)
        }
        Err(reason) => {
            warn!(venue_id = %venue.id, url = %url, error = %reason, "maps_link_open_failed");
            Err(DeepLinkError::OpenFailed(reason))
        }
    }
}
