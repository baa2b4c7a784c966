//! Device location services interface
//!
//! Mirrors what a mobile location API offers: a permission check/request, a
//! one-shot current position, and a continuous watch subscription. Dropping
//! the returned receiver cancels the subscription.

use crate::domain::error::LocationError;
use crate::domain::types::Position;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

/// Requested fix accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    Lowest,
    Low,
    Balanced,
    High,
    Highest,
}

/// Foreground location permission state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Undetermined,
    Granted,
    Denied,
}

/// Continuous watch configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    pub accuracy: Accuracy,
    /// Minimum movement between callbacks (meters)
    pub distance_interval_m: f64,
    /// Minimum time between callbacks (ms)
    pub time_interval_ms: u64,
}

/// Stream of watch callbacks; an `Err` item is a transient failure
pub type PositionStream = mpsc::Receiver<Result<Position, LocationError>>;

#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Current permission without prompting
    async fn permission_status(&self) -> PermissionStatus;

    /// Prompt for foreground permission
    async fn request_permission(&self) -> PermissionStatus;

    /// One-shot position fix
    async fn current_position(&self, accuracy: Accuracy) -> Result<Position, LocationError>;

    /// Subscribe to position updates
    async fn watch_position(&self, options: WatchOptions) -> Result<PositionStream, LocationError>;
}
