//! Discovery screen event loop
//!
//! One task interleaves UI commands and tracker events; nothing here runs in
//! parallel with the coordinator, so selection needs no locking. Deferred
//! result renders are committed only once the command queue is drained.

use crate::domain::filter::{FilterMode, FilterState};
use crate::domain::types::{Origin, VenueId};
use crate::io::presenter::{LocationStatus, MapSurface, ResultPresenter};
use crate::services::coordinator::ViewSyncCoordinator;
use crate::services::geolocation::{GeolocationTracker, TrackerEvent};
use crate::services::view_model::ViewableItem;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Input from the list, the map and outside collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    SetFilter(FilterState),
    SetMode(FilterMode),
    SetQuery(String),
    /// Card tap in the list
    Focus(VenueId),
    /// "Show on map" from outside the discovery screen
    ExternalFocus(VenueId),
    ListVisible(Vec<ViewableItem>),
    MarkerPressed(VenueId),
    MapReady,
    AnimationFinished(u64),
    Teardown,
}

pub struct DiscoverySession<P, M> {
    coordinator: ViewSyncCoordinator<P, M>,
    tracker: GeolocationTracker,
}

impl<P: ResultPresenter, M: MapSurface> DiscoverySession<P, M> {
    pub fn new(coordinator: ViewSyncCoordinator<P, M>, tracker: GeolocationTracker) -> Self {
        Self { coordinator, tracker }
    }

    pub fn coordinator(&self) -> &ViewSyncCoordinator<P, M> {
        &self.coordinator
    }

    pub fn tracker(&self) -> &GeolocationTracker {
        &self.tracker
    }

    /// Run until `Teardown` or until the command channel closes
    pub async fn run(&mut self, mut commands: mpsc::Receiver<UiCommand>) {
        self.coordinator.report_location(&LocationStatus::Locating);
        self.coordinator.on_position(None);
        self.tracker.start();
        let mut tracker_active = true;

        loop {
            if self.coordinator.is_transition_pending() && commands.is_empty() {
                let token = self.coordinator.generation();
                self.coordinator.commit_transition(token);
            }

            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(UiCommand::Teardown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                event = self.tracker.next_event(), if tracker_active => match event {
                    Some(event) => self.handle_tracker_event(event),
                    None => {
                        debug!(state = %self.tracker.state().as_str(), "tracker_events_ended");
                        tracker_active = false;
                    }
                },
            }
        }

        self.tracker.stop();
        self.coordinator.teardown();
        info!("discovery_session_closed");
    }

    fn handle_command(&mut self, command: UiCommand) {
        match command {
            UiCommand::SetFilter(filter) => {
                self.coordinator.set_filter(filter, Origin::List);
            }
            UiCommand::SetMode(mode) => {
                self.coordinator.set_mode(mode, Origin::List);
            }
            UiCommand::SetQuery(query) => {
                self.coordinator.set_query(query, Origin::List);
            }
            UiCommand::Focus(venue_id) => {
                self.coordinator.focus(&venue_id, Origin::List);
            }
            UiCommand::ExternalFocus(venue_id) => {
                self.coordinator.external_focus(&venue_id);
            }
            UiCommand::ListVisible(items) => {
                self.coordinator.on_viewport_visible_items_changed(&items);
            }
            UiCommand::MarkerPressed(venue_id) => {
                self.coordinator.on_marker_pressed(&venue_id);
            }
            UiCommand::MapReady => self.coordinator.on_map_ready(),
            UiCommand::AnimationFinished(command_id) => {
                self.coordinator.on_animation_complete(command_id)
            }
            // Handled by the run loop
            UiCommand::Teardown => {}
        }
    }

    fn handle_tracker_event(&mut self, event: TrackerEvent) {
        match event {
            TrackerEvent::Position(position) => {
                self.coordinator.on_position(Some(position));
            }
            TrackerEvent::PositionUnavailable(reason) => {
                debug!(reason = %reason, "distances_unavailable");
                self.coordinator.on_position_unavailable();
                self.coordinator.report_location(&LocationStatus::Unavailable);
            }
            TrackerEvent::Label(label) => {
                self.coordinator.report_location(&LocationStatus::Located(label));
            }
            TrackerEvent::GeocodingFailed { fallback } => {
                self.coordinator.report_location(&LocationStatus::Approximate(fallback));
            }
            TrackerEvent::Denied => {
                self.coordinator.on_position(None);
                self.coordinator.report_location(&LocationStatus::Denied);
            }
            TrackerEvent::Error(e) => {
                warn!(error = %e, "location_tracking_ended");
                self.coordinator.on_position(None);
                self.coordinator.report_location(&LocationStatus::Unavailable);
            }
        }
    }
}
