//! Services - discovery logic and state management
//!
//! - `distance` - Great-circle distance in miles
//! - `pipeline` - Catalog + filter + position -> ordered results
//! - `geolocation` - Position tracking with debounced place labels
//! - `coordinator` - Selection ownership and list/map synchronization
//! - `viewport` - Map camera command gating
//! - `view_model` - Rows and pins for the rendering sinks
//! - `session` - Event loop wiring tracker, coordinator and UI commands

pub mod coordinator;
pub mod distance;
pub mod geolocation;
pub mod pipeline;
pub mod session;
pub mod view_model;
pub mod viewport;

// Re-export commonly used types
pub use coordinator::{CoordinatorSettings, ViewSyncCoordinator};
pub use distance::distance_miles;
pub use geolocation::{GeolocationTracker, TrackerEvent, TrackerSettings, TrackerState};
pub use pipeline::FilterPipeline;
pub use session::{DiscoverySession, UiCommand};
pub use view_model::{MapPin, ResultRow, ResultsView, ViewableItem};
pub use viewport::{CameraOutcome, MapViewportController};
