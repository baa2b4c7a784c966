//! Rendering sinks: the result list/carousel and the map surface
//!
//! Both receive already-computed view models and camera commands. The
//! logging implementations back the CLI session.

use crate::domain::types::{PlaceLabel, Region, VenueId};
use crate::services::view_model::ResultsView;
use std::time::Duration;
use tracing::{debug, info, warn};

/// User-facing location status line
#[derive(Debug, Clone, PartialEq)]
pub enum LocationStatus {
    Locating,
    Located(PlaceLabel),
    /// Geocoding failed; showing raw coordinates
    Approximate(PlaceLabel),
    Unavailable,
    Denied,
}

/// List/carousel sink; interaction events flow back through the coordinator
pub trait ResultPresenter: Send {
    /// Commit a new frame
    fn render(&mut self, view: &ResultsView);

    /// Upward selection signal for the detail-view collaborator
    fn selection_changed(&mut self, selected: Option<&VenueId>);

    fn location_status(&mut self, status: &LocationStatus);
}

/// Map sink; only accepts camera commands
pub trait MapSurface: Send {
    /// Start a camera animation, replacing any animation in progress
    fn animate_camera(&mut self, command_id: u64, region: Region, duration: Duration);
}

/// Presenter that writes frames to the log
#[derive(Debug, Default)]
pub struct LogPresenter {
    frames: u64,
}

impl LogPresenter {
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl ResultPresenter for LogPresenter {
    fn render(&mut self, view: &ResultsView) {
        self.frames += 1;
        info!(
            generation = %view.generation,
            mode = %view.filter.mode,
            query = %view.filter.search_query,
            results = %view.rows.len(),
            pins = %view.pins.len(),
            selected = %view.selected.as_ref().map(VenueId::as_str).unwrap_or("-"),
            "results_rendered"
        );
        for row in &view.rows {
            debug!(
                venue_id = %row.id,
                title = %row.title,
                meta = %row.meta,
                distance = %row.distance_label,
                halal = %row.halal_label,
                alcohol = %row.alcohol_label,
                selected = %row.selected,
                "result_row"
            );
        }
    }

    fn selection_changed(&mut self, selected: Option<&VenueId>) {
        info!(venue_id = %selected.map(VenueId::as_str).unwrap_or("-"), "selection_changed");
    }

    fn location_status(&mut self, status: &LocationStatus) {
        match status {
            LocationStatus::Locating => info!("location_locating"),
            LocationStatus::Located(label) => info!(label = %label, "location_label"),
            LocationStatus::Approximate(label) => {
                info!(label = %label, "location_label_approximate")
            }
            LocationStatus::Unavailable => warn!("location_unavailable"),
            LocationStatus::Denied => warn!("location_denied"),
        }
    }
}

/// Map surface that logs camera commands and tracks where the camera ends up
#[derive(Debug)]
pub struct LogMapSurface {
    region: Region,
}

impl LogMapSurface {
    pub fn new(initial_region: Region) -> Self {
        Self { region: initial_region }
    }

    pub fn region(&self) -> Region {
        self.region
    }
}

impl MapSurface for LogMapSurface {
    fn animate_camera(&mut self, command_id: u64, region: Region, duration: Duration) {
        info!(
            command_id = %command_id,
            from = %self.region.center,
            to = %region.center,
            delta = %region.latitude_delta,
            duration_ms = %duration.as_millis(),
            "camera_animating"
        );
        self.region = region;
    }
}
