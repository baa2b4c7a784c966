//! Tests for the GeolocationTracker module

use super::*;
use crate::io::geocoder::OfflineGeocoder;
use crate::io::location::Accuracy;
use crate::io::replay::{ReplayLocationProvider, ReplayStep};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::timeout;

const DUNDEE: Coordinate = Coordinate::new(56.46, -2.97);
const BROUGHTY_FERRY: Coordinate = Coordinate::new(56.467, -2.87);

fn settings() -> TrackerSettings {
    TrackerSettings {
        label_refresh_miles: 0.25,
        emit_interval_ms: 1000,
        geocode_debounce: Duration::from_millis(100),
        watch: WatchOptions {
            accuracy: Accuracy::Balanced,
            distance_interval_m: 100.0,
            time_interval_ms: 10_000,
        },
    }
}

fn create_core() -> TrackerCore {
    TrackerCore::new(settings(), Arc::new(Metrics::new()))
}

fn fix(coordinate: Coordinate, timestamp_ms: u64) -> Position {
    Position::new(coordinate.latitude, coordinate.longitude, timestamp_ms)
}

fn label(name: &str) -> PlaceLabel {
    PlaceLabel { locality: Some(name.to_string()), ..Default::default() }
}

/// Geocoder answering call N with "place-N" after the Nth configured delay
struct ScriptedGeocoder {
    delays: Vec<Duration>,
    calls: AtomicUsize,
}

impl ScriptedGeocoder {
    fn new(delays_ms: &[u64]) -> Self {
        Self {
            delays: delays_ms.iter().map(|ms| Duration::from_millis(*ms)).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ReverseGeocoder for ScriptedGeocoder {
    async fn reverse(&self, _at: Coordinate) -> Result<PlaceLabel, GeocodeError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.get(n).copied().unwrap_or_default();
        tokio::time::sleep(delay).await;
        Ok(label(&format!("place-{}", n + 1)))
    }
}

fn create_tracker(
    provider: ReplayLocationProvider,
    geocoder: Arc<dyn ReverseGeocoder>,
) -> (GeolocationTracker, Arc<Metrics>) {
    let metrics = Arc::new(Metrics::new());
    let tracker = GeolocationTracker::new(Arc::new(provider), geocoder, settings(), metrics.clone());
    (tracker, metrics)
}

async fn drain(tracker: &mut GeolocationTracker, wait: Duration) -> Vec<TrackerEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = timeout(wait, tracker.next_event()).await {
        events.push(event);
    }
    events
}

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_first_fix_schedules_label_lookup() {
    let mut core = create_core();
    let now = Instant::now();

    let events = core.on_fix(fix(DUNDEE, 0), now);
    assert_eq!(events.as_slice(), &[TrackerEvent::Position(fix(DUNDEE, 0))]);
    assert_eq!(core.debounce_deadline(), Some(now + Duration::from_millis(100)));

    // Not due yet
    assert_eq!(core.take_due_lookup(now), None);
    assert_eq!(core.take_due_lookup(now + Duration::from_millis(100)), Some((1, DUNDEE)));
    assert_eq!(core.debounce_deadline(), None);
}

#[tokio::test]
async fn test_small_moves_keep_label() {
    let mut core = create_core();
    let now = Instant::now();
    core.on_fix(fix(DUNDEE, 0), now);
    core.take_due_lookup(now + Duration::from_secs(1));

    // ~0.07 mi north: label kept, coordinates still emitted
    let nearby = Coordinate::new(DUNDEE.latitude + 0.001, DUNDEE.longitude);
    let events = core.on_fix(fix(nearby, 2000), now);
    assert_eq!(events.len(), 1);
    assert_eq!(core.debounce_deadline(), None);

    // ~0.35 mi north: refresh
    let farther = Coordinate::new(DUNDEE.latitude + 0.005, DUNDEE.longitude);
    core.on_fix(fix(farther, 4000), now);
    assert!(core.debounce_deadline().is_some());
}

#[tokio::test]
async fn test_debounce_follows_newest_coordinate() {
    let mut core = create_core();
    let t0 = Instant::now();
    core.on_fix(fix(DUNDEE, 0), t0);

    let t1 = t0 + Duration::from_millis(60);
    core.on_fix(fix(BROUGHTY_FERRY, 1000), t1);

    // Deadline moved with the newer fix
    assert_eq!(core.take_due_lookup(t0 + Duration::from_millis(100)), None);
    assert_eq!(core.take_due_lookup(t1 + Duration::from_millis(100)), Some((1, BROUGHTY_FERRY)));
    assert_eq!(core.metrics.geocode_issued(), 1);
}

#[tokio::test]
async fn test_positions_throttled_by_timestamp() {
    let mut core = create_core();
    let now = Instant::now();
    assert_eq!(core.on_fix(fix(DUNDEE, 10_000), now).len(), 1);
    assert!(core.on_fix(fix(BROUGHTY_FERRY, 10_500), now).is_empty());
    assert_eq!(core.on_fix(fix(BROUGHTY_FERRY, 11_000), now).len(), 1);
    assert_eq!(core.metrics.positions_emitted(), 2);
}

#[tokio::test]
async fn test_out_of_order_geocode_latest_wins() {
    let mut core = create_core();
    let now = Instant::now();

    core.on_fix(fix(DUNDEE, 0), now);
    let (seq1, c1) = core.take_due_lookup(now + Duration::from_secs(1)).unwrap();
    core.on_fix(fix(BROUGHTY_FERRY, 5000), now);
    let (seq2, c2) = core.take_due_lookup(now + Duration::from_secs(1)).unwrap();
    assert_eq!((seq1, seq2), (1, 2));

    // Response 2 lands first, then the late response 1
    let applied = core.on_lookup_complete(seq2, c2, Ok(label("Broughty Ferry")));
    assert_eq!(applied, Some(TrackerEvent::Label(label("Broughty Ferry"))));
    assert_eq!(core.on_lookup_complete(seq1, c1, Ok(label("Dundee"))), None);

    assert_eq!(core.label, Some(label("Broughty Ferry")));
    assert_eq!(core.metrics.geocode_stale(), 1);
}

#[tokio::test]
async fn test_geocode_failure_falls_back() {
    let mut core = create_core();
    let now = Instant::now();

    core.on_fix(fix(DUNDEE, 0), now);
    let (seq, c) = core.take_due_lookup(now + Duration::from_secs(1)).unwrap();
    let event = core.on_lookup_complete(seq, c, Err(GeocodeError::NoResult));
    assert_eq!(
        event,
        Some(TrackerEvent::GeocodingFailed { fallback: PlaceLabel::from_coordinate(DUNDEE) })
    );

    // With a resolved label the prior label is kept
    core.on_fix(fix(BROUGHTY_FERRY, 5000), now);
    let (seq, c) = core.take_due_lookup(now + Duration::from_secs(1)).unwrap();
    core.on_lookup_complete(seq, c, Ok(label("Broughty Ferry")));
    core.on_fix(fix(DUNDEE, 10_000), now);
    let (seq, c) = core.take_due_lookup(now + Duration::from_secs(1)).unwrap();
    let event = core.on_lookup_complete(seq, c, Err(GeocodeError::Status(503)));
    assert_eq!(event, Some(TrackerEvent::GeocodingFailed { fallback: label("Broughty Ferry") }));
}

#[tokio::test]
async fn test_failed_lookup_retried_on_small_move() {
    let mut core = create_core();
    let now = Instant::now();
    core.on_fix(fix(DUNDEE, 0), now);
    let (seq, c) = core.take_due_lookup(now + Duration::from_secs(1)).unwrap();
    core.on_lookup_complete(seq, c, Err(GeocodeError::NoResult));
    assert_eq!(core.label, None);

    // ~0.07 mi drift: nothing resolved yet, so look up again
    let drift = Coordinate::new(DUNDEE.latitude + 0.001, DUNDEE.longitude);
    core.on_fix(fix(drift, 2000), now);
    assert!(core.debounce_deadline().is_some());
    let (seq, c) = core.take_due_lookup(now + Duration::from_secs(1)).unwrap();
    assert_eq!((seq, c), (2, drift));

    // Once resolved, the same drift keeps the label
    core.on_lookup_complete(seq, c, Ok(label("Dundee")));
    assert_eq!(core.label_anchor, Some(drift));
    core.on_fix(fix(DUNDEE, 4000), now);
    assert_eq!(core.debounce_deadline(), None);
}

#[tokio::test]
async fn test_failure_reported_once_per_streak() {
    let mut core = create_core();
    let err = || LocationError::PositionUnavailable("timeout".to_string());

    assert!(matches!(core.on_failure(err()), Some(TrackerEvent::PositionUnavailable(_))));
    assert_eq!(core.on_failure(err()), None);

    core.on_fix(fix(DUNDEE, 0), Instant::now());
    assert!(core.on_failure(err()).is_some());
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_permission_denied_is_terminal() {
    let provider = ReplayLocationProvider::from_positions([fix(DUNDEE, 0)]).denying_permission();
    let (mut tracker, _) = create_tracker(provider, Arc::new(OfflineGeocoder));

    tracker.start();
    assert_eq!(tracker.next_event().await, Some(TrackerEvent::Denied));
    assert_eq!(tracker.next_event().await, None);
    assert_eq!(tracker.state(), TrackerState::Denied);
}

#[tokio::test(start_paused = true)]
async fn test_late_geocode_response_is_discarded() {
    let provider = ReplayLocationProvider::from_positions([
        fix(DUNDEE, 0),
        fix(BROUGHTY_FERRY, 2000),
    ])
    .with_pace(Duration::from_millis(1000))
    .holding_open();
    // First lookup answers after the second one
    let geocoder = Arc::new(ScriptedGeocoder::new(&[5000, 10]));
    let (mut tracker, metrics) = create_tracker(provider, geocoder);

    tracker.start();
    let events = drain(&mut tracker, Duration::from_secs(10)).await;

    assert_eq!(
        events,
        vec![
            TrackerEvent::Position(fix(DUNDEE, 0)),
            TrackerEvent::Position(fix(BROUGHTY_FERRY, 2000)),
            TrackerEvent::Label(label("place-2")),
        ]
    );
    assert_eq!(metrics.geocode_issued(), 2);
    assert_eq!(metrics.geocode_stale(), 1);
    assert_eq!(tracker.state(), TrackerState::Tracking);
    tracker.stop();
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_reported_once() {
    let provider = ReplayLocationProvider::new(vec![
        ReplayStep::Failure { error: "gps timeout".to_string() },
        ReplayStep::Failure { error: "gps timeout".to_string() },
        ReplayStep::Fix(fix(BROUGHTY_FERRY, 5000)),
    ])
    .holding_open();
    let (mut tracker, _) = create_tracker(provider, Arc::new(OfflineGeocoder));

    tracker.start();
    let events = drain(&mut tracker, Duration::from_secs(5)).await;
    let failures =
        events.iter().filter(|e| matches!(e, TrackerEvent::PositionUnavailable(_))).count();
    assert_eq!(failures, 1);
    assert!(events.contains(&TrackerEvent::Position(fix(BROUGHTY_FERRY, 5000))));
    tracker.stop();
}

#[tokio::test(start_paused = true)]
async fn test_subscription_end_emits_error_sentinel() {
    let provider = ReplayLocationProvider::from_positions([fix(DUNDEE, 0)]);
    let (mut tracker, _) = create_tracker(provider, Arc::new(OfflineGeocoder));

    tracker.start();
    let events = drain(&mut tracker, Duration::from_secs(5)).await;
    assert_eq!(events.first(), Some(&TrackerEvent::Position(fix(DUNDEE, 0))));
    assert_eq!(events.last(), Some(&TrackerEvent::Error(LocationError::SubscriptionClosed)));
    assert_eq!(tracker.state(), TrackerState::Error);
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent_and_silences_tracker() {
    let provider = ReplayLocationProvider::from_positions([
        fix(DUNDEE, 0),
        fix(BROUGHTY_FERRY, 5000),
    ])
    .holding_open();
    let (mut tracker, _) = create_tracker(provider, Arc::new(OfflineGeocoder));

    tracker.start();
    assert_eq!(tracker.next_event().await, Some(TrackerEvent::Position(fix(DUNDEE, 0))));
    assert!(tracker.is_running());

    tracker.stop();
    tracker.stop();
    assert!(!tracker.is_running());
    assert_eq!(tracker.state(), TrackerState::Idle);
    assert_eq!(tracker.next_event().await, None);
}
