//! Tracker callbacks: raw fixes, fetch failures, and geocode completions
//!
//! Each handler returns the events to publish; the task loop owns the
//! channel and the lookup set.

use super::{TrackerCore, TrackerEvent};
use crate::domain::error::{GeocodeError, LocationError};
use crate::domain::types::{Coordinate, PlaceLabel, Position};
use crate::services::distance::distance_miles;
use smallvec::SmallVec;
use tokio::time::Instant;
use tracing::{debug, info, warn};

impl TrackerCore {
    /// Handle a raw position fix
    ///
    /// Emits the position unless it arrives within the emit interval of the
    /// previous one, and schedules a label refresh when the user has moved
    /// far enough from the last resolved coordinate (or from the one still
    /// being looked up).
    pub(crate) fn on_fix(
        &mut self,
        position: Position,
        now: Instant,
    ) -> SmallVec<[TrackerEvent; 1]> {
        self.metrics.record_position_received();
        self.failure_reported = false;

        if let Some(last_ms) = self.last_emitted_ms {
            if position.timestamp_ms.saturating_sub(last_ms) < self.settings.emit_interval_ms {
                debug!(timestamp_ms = %position.timestamp_ms, "position_throttled");
                return SmallVec::new();
            }
        }
        self.last_emitted_ms = Some(position.timestamp_ms);
        self.metrics.record_position_emitted();

        self.schedule_label_refresh(position.coordinate, now);
        SmallVec::from_elem(TrackerEvent::Position(position), 1)
    }

    fn schedule_label_refresh(&mut self, coordinate: Coordinate, now: Instant) {
        let deadline = now + self.settings.geocode_debounce;

        // A lookup is already waiting: follow the newest coordinate
        if let Some(pending) = self.pending.as_mut() {
            *pending = (coordinate, deadline);
            return;
        }

        let reference = self.in_flight.or(self.label_anchor);
        let moved = reference.map(|anchor| distance_miles(anchor, coordinate));
        match moved {
            Some(miles) if miles < self.settings.label_refresh_miles => {
                debug!(moved_miles = %miles, "label_kept");
            }
            _ => {
                self.pending = Some((coordinate, deadline));
            }
        }
    }

    /// Transient fetch or watch failure
    pub(crate) fn on_failure(&mut self, error: LocationError) -> Option<TrackerEvent> {
        if self.failure_reported {
            debug!(error = %error, "position_failure_repeated");
            return None;
        }
        self.failure_reported = true;
        warn!(error = %error, "position_unavailable");
        Some(TrackerEvent::PositionUnavailable(error.to_string()))
    }

    pub(crate) fn debounce_deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, deadline)| deadline)
    }

    /// Issue the pending lookup once its debounce deadline has passed
    ///
    /// Returns the sequence number tagging the request.
    pub(crate) fn take_due_lookup(&mut self, now: Instant) -> Option<(u64, Coordinate)> {
        let (coordinate, deadline) = self.pending?;
        if now < deadline {
            return None;
        }
        self.pending = None;
        self.latest_seq += 1;
        self.in_flight = Some(coordinate);
        self.metrics.record_geocode_issued();
        debug!(seq = %self.latest_seq, coordinate = %coordinate, "geocode_issued");
        Some((self.latest_seq, coordinate))
    }

    /// Apply a lookup result; anything but the latest issued sequence is discarded
    pub(crate) fn on_lookup_complete(
        &mut self,
        seq: u64,
        coordinate: Coordinate,
        result: Result<PlaceLabel, GeocodeError>,
    ) -> Option<TrackerEvent> {
        if seq != self.latest_seq {
            self.metrics.record_geocode_stale();
            debug!(seq = %seq, latest_seq = %self.latest_seq, "geocode_stale_discarded");
            return None;
        }
        self.in_flight = None;

        match result {
            Ok(label) => {
                info!(seq = %seq, label = %label, "place_label_resolved");
                self.label_anchor = Some(coordinate);
                self.label = Some(label.clone());
                Some(TrackerEvent::Label(label))
            }
            Err(e) => {
                self.metrics.record_geocode_failed();
                warn!(seq = %seq, error = %e, "geocode_failed");
                let fallback =
                    self.label.clone().unwrap_or_else(|| PlaceLabel::from_coordinate(coordinate));
                Some(TrackerEvent::GeocodingFailed { fallback })
            }
        }
    }
}
