//! Device position tracking with debounced place labels
//!
//! The tracker runs as a spawned task that owns the watch subscription and
//! every in-flight reverse-geocoding lookup. It walks
//! `Idle -> RequestingPermission -> {Denied | Tracking} -> Error`; only
//! `Tracking` emits position updates. `stop()` aborts the task, which drops
//! the subscription and cancels outstanding lookups.

mod handlers;
#[cfg(test)]
mod tests;

use crate::domain::error::{GeocodeError, LocationError};
use crate::domain::types::{Coordinate, PlaceLabel, Position};
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::geocoder::ReverseGeocoder;
use crate::io::location::{LocationProvider, PermissionStatus, WatchOptions};
use smallvec::SmallVec;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    RequestingPermission,
    /// Terminal: the user refused location access
    Denied,
    Tracking,
    /// Terminal: the subscription could not be started or ended unexpectedly
    Error,
}

impl TrackerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerState::Idle => "idle",
            TrackerState::RequestingPermission => "requesting_permission",
            TrackerState::Denied => "denied",
            TrackerState::Tracking => "tracking",
            TrackerState::Error => "error",
        }
    }
}

/// Output of a running tracker
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// Throttled raw position
    Position(Position),
    /// Transient fetch failure, reported once per failure streak
    PositionUnavailable(String),
    /// Place label from the latest issued lookup
    Label(PlaceLabel),
    /// Latest lookup failed; `fallback` is the prior label or raw coordinates
    GeocodingFailed { fallback: PlaceLabel },
    /// Terminal sentinel: permission refused
    Denied,
    /// Terminal sentinel: tracking stopped on its own
    Error(LocationError),
}

/// Tracker tunables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerSettings {
    /// Movement needed before the place label is refreshed
    pub label_refresh_miles: f64,
    /// Minimum spacing between emitted positions (by fix timestamp)
    pub emit_interval_ms: u64,
    /// Quiet period before a label lookup is issued
    pub geocode_debounce: Duration,
    pub watch: WatchOptions,
}

impl TrackerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            label_refresh_miles: config.label_refresh_miles(),
            emit_interval_ms: config.emit_interval_ms(),
            geocode_debounce: Duration::from_millis(config.geocode_debounce_ms()),
            watch: config.watch_options(),
        }
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Synchronous tracking state; driven by the task loop, tested directly
pub(crate) struct TrackerCore {
    pub(crate) settings: TrackerSettings,
    pub(crate) metrics: Arc<Metrics>,
    /// Timestamp of the last emitted position
    pub(crate) last_emitted_ms: Option<u64>,
    /// Coordinate of the last successfully resolved label
    pub(crate) label_anchor: Option<Coordinate>,
    /// Coordinate of the latest issued lookup still awaiting its answer
    pub(crate) in_flight: Option<Coordinate>,
    /// Last successfully resolved label
    pub(crate) label: Option<PlaceLabel>,
    /// Lookup waiting for its debounce deadline
    pub(crate) pending: Option<(Coordinate, Instant)>,
    /// Sequence number of the latest issued lookup
    pub(crate) latest_seq: u64,
    /// A failure has been reported since the last good fix
    pub(crate) failure_reported: bool,
}

impl TrackerCore {
    pub(crate) fn new(settings: TrackerSettings, metrics: Arc<Metrics>) -> Self {
        Self {
            settings,
            metrics,
            last_emitted_ms: None,
            label_anchor: None,
            in_flight: None,
            label: None,
            pending: None,
            latest_seq: 0,
            failure_reported: false,
        }
    }
}

/// Position tracker handle
pub struct GeolocationTracker {
    provider: Arc<dyn LocationProvider>,
    geocoder: Arc<dyn ReverseGeocoder>,
    settings: TrackerSettings,
    metrics: Arc<Metrics>,
    state_tx: watch::Sender<TrackerState>,
    events: Option<mpsc::Receiver<TrackerEvent>>,
    task: Option<JoinHandle<()>>,
}

impl GeolocationTracker {
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        geocoder: Arc<dyn ReverseGeocoder>,
        settings: TrackerSettings,
        metrics: Arc<Metrics>,
    ) -> Self {
        let (state_tx, _) = watch::channel(TrackerState::Idle);
        Self { provider, geocoder, settings, metrics, state_tx, events: None, task: None }
    }

    pub fn state(&self) -> TrackerState {
        *self.state_tx.borrow()
    }

    /// Observe state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<TrackerState> {
        self.state_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start tracking; restarts if already running
    pub fn start(&mut self) {
        self.stop();

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let core = TrackerCore::new(self.settings, self.metrics.clone());
        let task = tokio::spawn(run_tracker(
            core,
            self.provider.clone(),
            self.geocoder.clone(),
            tx,
            self.state_tx.clone(),
        ));

        self.events = Some(rx);
        self.task = Some(task);
        info!("tracker_started");
    }

    /// Cancel the subscription and any in-flight lookup; idempotent
    pub fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        task.abort();
        // Buffered events are discarded with the receiver
        self.events = None;
        self.state_tx.send_replace(TrackerState::Idle);
        info!("tracker_stopped");
    }

    /// Next tracker event; `None` once the tracker is stopped or has terminated
    pub async fn next_event(&mut self) -> Option<TrackerEvent> {
        let event = match self.events.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        };
        if event.is_none() {
            self.events = None;
        }
        event
    }
}

impl Drop for GeolocationTracker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

type LookupOutcome = (u64, Coordinate, Result<PlaceLabel, GeocodeError>);

async fn run_tracker(
    mut core: TrackerCore,
    provider: Arc<dyn LocationProvider>,
    geocoder: Arc<dyn ReverseGeocoder>,
    tx: mpsc::Sender<TrackerEvent>,
    state_tx: watch::Sender<TrackerState>,
) {
    state_tx.send_replace(TrackerState::RequestingPermission);

    let mut permission = provider.permission_status().await;
    if permission != PermissionStatus::Granted {
        permission = provider.request_permission().await;
    }
    if permission != PermissionStatus::Granted {
        warn!("location_permission_denied");
        state_tx.send_replace(TrackerState::Denied);
        let _ = tx.send(TrackerEvent::Denied).await;
        return;
    }

    state_tx.send_replace(TrackerState::Tracking);
    info!(
        accuracy = ?core.settings.watch.accuracy,
        distance_interval_m = %core.settings.watch.distance_interval_m,
        time_interval_ms = %core.settings.watch.time_interval_ms,
        "location_tracking"
    );

    let initial = provider.current_position(core.settings.watch.accuracy).await;
    let events = match initial {
        Ok(position) => core.on_fix(position, Instant::now()),
        Err(e) => core.on_failure(e).into_iter().collect(),
    };
    for event in events {
        if tx.send(event).await.is_err() {
            return;
        }
    }

    let mut stream = match provider.watch_position(core.settings.watch).await {
        Ok(stream) => stream,
        Err(e) => {
            let (state, event) = match e {
                LocationError::PermissionDenied => (TrackerState::Denied, TrackerEvent::Denied),
                other => (TrackerState::Error, TrackerEvent::Error(other)),
            };
            warn!(state = %state.as_str(), "location_watch_failed");
            state_tx.send_replace(state);
            let _ = tx.send(event).await;
            return;
        }
    };

    let mut lookups: JoinSet<LookupOutcome> = JoinSet::new();

    loop {
        let deadline = core.debounce_deadline();
        let events = tokio::select! {
            item = stream.recv() => match item {
                Some(Ok(position)) => core.on_fix(position, Instant::now()),
                Some(Err(e)) => core.on_failure(e).into_iter().collect(),
                None => {
                    warn!("location_subscription_closed");
                    state_tx.send_replace(TrackerState::Error);
                    let _ = tx.send(TrackerEvent::Error(LocationError::SubscriptionClosed)).await;
                    return;
                }
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some((seq, coordinate)) = core.take_due_lookup(Instant::now()) {
                    let geocoder = geocoder.clone();
                    lookups.spawn(async move {
                        let result = geocoder.reverse(coordinate).await;
                        (seq, coordinate, result)
                    });
                }
                SmallVec::new()
            }
            Some(joined) = lookups.join_next(), if !lookups.is_empty() => match joined {
                Ok((seq, coordinate, result)) => {
                    core.on_lookup_complete(seq, coordinate, result).into_iter().collect()
                }
                Err(e) => {
                    warn!(error = %e, "geocode_task_failed");
                    SmallVec::new()
                }
            },
            _ = tx.closed() => return,
        };

        for event in events {
            if tx.send(event).await.is_err() {
                return;
            }
        }
    }
}
