//! Map camera control
//!
//! Commands are dropped (not queued) until the map reports ready and after
//! teardown. Only the most recent command is tracked as in flight; a newer
//! one supersedes it.

use crate::domain::types::Region;
use crate::infra::metrics::Metrics;
use crate::io::presenter::MapSurface;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraOutcome {
    Issued(u64),
    DroppedNotReady,
    DroppedTornDown,
}

impl CameraOutcome {
    pub fn is_issued(&self) -> bool {
        matches!(self, CameraOutcome::Issued(_))
    }
}

pub struct MapViewportController<M> {
    surface: M,
    ready: bool,
    torn_down: bool,
    next_id: u64,
    in_flight: Option<u64>,
    metrics: Arc<Metrics>,
}

impl<M: MapSurface> MapViewportController<M> {
    pub fn new(surface: M, metrics: Arc<Metrics>) -> Self {
        Self { surface, ready: false, torn_down: false, next_id: 1, in_flight: None, metrics }
    }

    pub fn on_map_ready(&mut self) {
        if !self.torn_down {
            self.ready = true;
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready && !self.torn_down
    }

    /// Animate the camera to `region`
    pub fn animate_to(&mut self, region: Region, duration: Duration) -> CameraOutcome {
        if self.torn_down {
            self.metrics.record_camera_dropped();
            debug!(center = %region.center, "camera_dropped_torn_down");
            return CameraOutcome::DroppedTornDown;
        }
        if !self.ready {
            self.metrics.record_camera_dropped();
            debug!(center = %region.center, "camera_dropped_not_ready");
            return CameraOutcome::DroppedNotReady;
        }

        let id = self.next_id;
        self.next_id += 1;
        if let Some(previous) = self.in_flight.replace(id) {
            self.metrics.record_camera_superseded();
            debug!(superseded = %previous, command_id = %id, "camera_superseded");
        }
        self.metrics.record_camera_issued();
        self.surface.animate_camera(id, region, duration);
        CameraOutcome::Issued(id)
    }

    /// Completion callback from the map; completions of superseded commands are ignored
    pub fn on_animation_complete(&mut self, command_id: u64) -> bool {
        if self.in_flight == Some(command_id) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// Discard everything from here on
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.ready = false;
        self.in_flight = None;
    }

    pub fn surface(&self) -> &M {
        &self.surface
    }
}
