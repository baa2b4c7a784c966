//! IO modules - external collaborators
//!
//! - `location` - Device location services interface
//! - `replay` - Location provider replaying a recorded track
//! - `geocoder` - Reverse geocoding (Nominatim HTTP, offline)
//! - `catalog` - Venue catalog loading
//! - `deeplink` - Outbound maps links
//! - `presenter` - List and map rendering sinks

pub mod catalog;
pub mod deeplink;
pub mod geocoder;
pub mod location;
pub mod presenter;
pub mod replay;

// Re-export commonly used types
pub use catalog::Catalog;
pub use deeplink::{maps_uri, open_in_maps, MapsTarget, UrlOpener};
pub use geocoder::{NominatimGeocoder, OfflineGeocoder, ReverseGeocoder};
pub use location::{Accuracy, LocationProvider, PermissionStatus, WatchOptions};
pub use presenter::{LocationStatus, LogMapSurface, LogPresenter, MapSurface, ResultPresenter};
pub use replay::{ReplayLocationProvider, ReplayStep};
