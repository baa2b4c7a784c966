//! Domain models - catalog entries, positions and filter state
//!
//! This module contains the canonical data types used throughout the system:
//! - `Venue` - immutable catalog entry with compliance and location metadata
//! - `ResultItem` - a filtered venue with its computed distance
//! - `FilterState` - category mode, search query and scope
//! - `Position` / `Coordinate` / `Region` - geographic values
//! - `Origin` - source tag carried by every focus/selection request

pub mod error;
pub mod filter;
pub mod types;
pub mod venue;

// Re-export commonly used types at module level
pub use error::{DeepLinkError, GeocodeError, LocationError};
pub use filter::{Favourites, FilterMode, FilterState, SearchScope};
pub use types::{Coordinate, Origin, PlaceLabel, Position, Region, VenueId};
pub use venue::{HalalStatus, PriceTier, ResultItem, Venue};
